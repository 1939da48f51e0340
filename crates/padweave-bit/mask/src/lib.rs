extern crate self as padweave_bit_mask;

mod bitmask;

pub use bitmask::Bitmask;

/// A fieldless enum whose variants map to distinct bits of a `u64`.
pub trait Bitable: Copy {
    fn bit(&self) -> u64;
    fn index(&self) -> u32;
}

#[cfg(test)]
mod tests {
    use padweave_bit_derive::Bit;

    use crate::{Bitable, Bitmask};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Bit)]
    enum Face {
        Triangle,
        Circle,
        Cross,
        Square,
    }

    #[test]
    fn derived_bits_follow_declaration_order() {
        assert_eq!(Face::Triangle.bit(), 1);
        assert_eq!(Face::Square.bit(), 1 << 3);
        assert_eq!(Face::Cross.index(), 2);

        let mask = Bitmask::new(&[Face::Circle, Face::Square]);
        assert_eq!(mask.bits(), 0b1010);
    }
}
