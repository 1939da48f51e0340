use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

/// Value of a fully pressed button or fully deflected half-axis.
pub const FULLY_DOWN: i32 = 1 << 16;
/// Sensitivity that maps a fully pressed control to exactly 255.
pub const BASE_SENSITIVITY: i32 = 1 << 16;
/// Raw hat value reported when the hat is centered.
pub const POV_CENTERED: i32 = -1;

const POV_FULL_CIRCLE: i32 = 36000;

const UID_FULL_AXIS: u32 = 1 << 31;
const UID_RAW_POV: u32 = 1 << 30;
const UID_SOURCE_MASK: u32 = 0x00FF_FFFF;
const UID_KIND_SHIFT: u32 = 16;
const UID_DIRECTION_SHIFT: u32 = 24;
const UID_DIRECTION_MASK: u32 = 0x7;

/// Kind of a physical control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ControlKind {
    PushButton = 1,
    ToggleButton = 2,
    AbsAxis = 4,
    RelAxis = 8,
    Pov = 16,
}

impl ControlKind {
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            1 => Some(Self::PushButton),
            2 => Some(Self::ToggleButton),
            4 => Some(Self::AbsAxis),
            8 => Some(Self::RelAxis),
            16 => Some(Self::Pov),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_button(self) -> bool {
        matches!(self, Self::PushButton | Self::ToggleButton)
    }

    #[must_use]
    pub const fn is_axis(self) -> bool {
        matches!(self, Self::AbsAxis | Self::RelAxis)
    }
}

/// Sub-direction carried by a virtual control uid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    Positive = 1,
    Negative = 2,
    North = 3,
    East = 4,
    South = 5,
    West = 6,
}

impl Direction {
    const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            1 => Some(Self::Positive),
            2 => Some(Self::Negative),
            3 => Some(Self::North),
            4 => Some(Self::East),
            5 => Some(Self::South),
            6 => Some(Self::West),
            _ => None,
        }
    }
}

/// Stable 32-bit identifier of a virtual control.
///
/// Layout: bits 0..16 raw control id, bits 16..24 [`ControlKind`],
/// bits 24..27 [`Direction`], bit 30 raw hat, bit 31 full-range axis.
/// The value is persisted in settings files, so the layout never changes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlUid(u32);

impl ControlUid {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    const fn source(kind: ControlKind, id: u16) -> u32 {
        ((kind.bits() as u32) << UID_KIND_SHIFT) | id as u32
    }

    /// Uid of a button control.
    #[must_use]
    pub const fn button(kind: ControlKind, id: u16) -> Self {
        Self(Self::source(kind, id))
    }

    /// Uid of the full-range view of an axis.
    #[must_use]
    pub const fn axis(kind: ControlKind, id: u16) -> Self {
        Self(Self::source(kind, id) | UID_FULL_AXIS)
    }

    /// Uid of one half of an axis.
    #[must_use]
    pub const fn axis_half(kind: ControlKind, id: u16, positive: bool) -> Self {
        let direction = if positive {
            Direction::Positive
        } else {
            Direction::Negative
        };
        Self(Self::source(kind, id) | ((direction as u32) << UID_DIRECTION_SHIFT))
    }

    /// Uid of the raw hat angle.
    #[must_use]
    pub const fn pov(id: u16) -> Self {
        Self(Self::source(ControlKind::Pov, id) | UID_RAW_POV)
    }

    /// Uid of one cardinal direction of a hat.
    #[must_use]
    pub const fn pov_direction(id: u16, direction: Direction) -> Self {
        Self(Self::source(ControlKind::Pov, id) | ((direction as u32) << UID_DIRECTION_SHIFT))
    }

    #[must_use]
    pub const fn kind(self) -> Option<ControlKind> {
        ControlKind::from_bits(((self.0 >> UID_KIND_SHIFT) & 0xFF) as u8)
    }

    #[must_use]
    pub const fn raw_id(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        Direction::from_bits((self.0 >> UID_DIRECTION_SHIFT) & UID_DIRECTION_MASK)
    }

    #[must_use]
    pub const fn is_full_axis(self) -> bool {
        self.0 & UID_FULL_AXIS != 0
    }

    #[must_use]
    pub const fn is_raw_pov(self) -> bool {
        self.0 & UID_RAW_POV != 0
    }

    /// Both uids are views of the same physical control.
    #[must_use]
    pub const fn shares_source(self, other: Self) -> bool {
        (self.0 ^ other.0) & UID_SOURCE_MASK == 0
    }

    /// Binding one uid exclusively unbinds the other.
    ///
    /// A full-range axis or raw hat overlaps every view of its source.
    /// Opposite halves of an axis, or different hat directions, do not.
    #[must_use]
    pub const fn collides_with(self, other: Self) -> bool {
        self.shares_source(other) && (self.0 | other.0) & (UID_FULL_AXIS | UID_RAW_POV) != 0
    }
}

impl fmt::Display for ControlUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl fmt::Debug for ControlUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ControlUid(0x{:08X})", self.0)
    }
}

impl FromStr for ControlUid {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let raw = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16)?,
            None => s.parse::<u32>()?,
        };
        Ok(Self(raw))
    }
}

/// Hardware-level input reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalControl {
    pub kind: ControlKind,
    pub id: u16,
    /// Platform key code, for keyboard keys and mouse buttons.
    pub vkey: Option<u32>,
    pub name: Option<Box<str>>,
    /// Index of the first virtual control derived from this one.
    pub base_virtual_index: usize,
}

impl PhysicalControl {
    /// Uids of every virtual control fanned out of this physical control,
    /// in virtual-index order.
    #[must_use]
    pub fn virtual_uids(&self) -> SmallVec<[ControlUid; 5]> {
        virtual_uids(self.kind, self.id)
    }

    /// Human readable name, falling back to the kind and id.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.to_string(),
            None => format!("{:?} {}", self.kind, self.id),
        }
    }
}

pub(crate) fn virtual_uids(kind: ControlKind, id: u16) -> SmallVec<[ControlUid; 5]> {
    let mut uids = SmallVec::new();
    match kind {
        ControlKind::PushButton | ControlKind::ToggleButton => {
            uids.push(ControlUid::button(kind, id));
        }
        ControlKind::AbsAxis | ControlKind::RelAxis => {
            uids.push(ControlUid::axis(kind, id));
            uids.push(ControlUid::axis_half(kind, id, true));
            uids.push(ControlUid::axis_half(kind, id, false));
        }
        ControlKind::Pov => {
            uids.push(ControlUid::pov(id));
            for direction in [Direction::North, Direction::East, Direction::South, Direction::West] {
                uids.push(ControlUid::pov_direction(id, direction));
            }
        }
    }
    uids
}

/// Bindable view of a physical control.
///
/// Virtual controls of detached devices have no physical control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualControl {
    pub uid: ControlUid,
    pub physical: Option<usize>,
}

/// Splits a raw hat angle into north, east, south and west pressures.
///
/// The dominant component of a valid angle is always [`FULLY_DOWN`];
/// out-of-range values read as centered.
pub(crate) fn pov_pressures(value: i32) -> [i32; 4] {
    if !(0..POV_FULL_CIRCLE).contains(&value) {
        return [0; 4];
    }
    let angle = f64::from(value) * std::f64::consts::PI / f64::from(POV_FULL_CIRCLE / 2);
    let east = angle.sin();
    let south = -angle.cos();
    let scale = f64::from(FULLY_DOWN) / east.abs().max(south.abs());
    #[allow(clippy::cast_possible_truncation)]
    let (east, south) = ((east * scale).round() as i32, (south * scale).round() as i32);
    [(-south).max(0), east.max(0), south.max(0), (-east).max(0)]
}
