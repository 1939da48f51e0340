use std::fmt;
use std::marker::PhantomData;
use std::ops::BitXor;

use crate::Bitable;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bitmask<T: Bitable>(u64, PhantomData<T>);

impl<T: Bitable> Bitmask<T> {
    /// Build a mask with every flag of `values` set.
    pub fn new(values: &[T]) -> Self {
        values.iter().fold(Self::empty(), |mut mask, value| {
            mask.insert(*value);
            mask
        })
    }

    pub const fn empty() -> Self {
        Self(0, PhantomData)
    }

    /// Raw bit word.
    #[inline]
    pub const fn bits(&self) -> u64 {
        self.0
    }

    #[inline]
    pub fn contains(&self, bit: T) -> bool {
        (self.0 & bit.bit()) != 0
    }

    #[inline]
    pub fn insert(&mut self, bit: T) {
        self.0 |= bit.bit();
    }

    /// Flip a single flag, returning whether it is set afterwards.
    #[inline]
    pub fn toggle(&mut self, bit: T) -> bool {
        self.0 ^= bit.bit();
        self.contains(bit)
    }

    #[inline]
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl<T: Bitable> Default for Bitmask<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Bitable> fmt::Debug for Bitmask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitmask({:#b})", self.bits())
    }
}

impl<T: Bitable> BitXor for Bitmask<T> {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0, PhantomData)
    }
}
