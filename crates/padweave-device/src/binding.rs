use crate::effect::ForceFeedbackBinding;

/// Number of emulated controller ports.
pub const PORTS: usize = 2;
/// Number of multitap slots per port.
pub const SLOTS: usize = 4;
/// Number of vibration motors per emulated pad.
pub const MOTORS: u8 = 2;

/// Maps one virtual control to one pad command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// Index into the owning device's virtual controls.
    pub control_index: usize,
    pub command: u8,
    /// Signed gain; [`BASE_SENSITIVITY`](crate::BASE_SENSITIVITY) is unit gain
    /// and a negative value inverts the control.
    pub sensitivity: i32,
    /// Turbo mask applied to the frame counter, 0 disables turbo.
    pub turbo: u8,
    /// Values at or below this are ignored.
    pub dead_zone: i32,
}

/// Bindings of one device for one (port, slot) pair.
///
/// `bindings` stays ordered by ascending `control_index` and
/// `ff_bindings` by ascending motor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PadBindings {
    pub bindings: Vec<Binding>,
    pub ff_bindings: Vec<ForceFeedbackBinding>,
}

impl PadBindings {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.ff_bindings.is_empty()
    }

    /// Combined count of input and force-feedback bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len() + self.ff_bindings.len()
    }
}

/// How a new binding treats existing ones for the same control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindPolicy {
    /// A control drives at most one command, across every pad.
    Exclusive,
    /// A control may drive many commands; only exact duplicates are removed.
    Multiple,
}

impl BindPolicy {
    #[must_use]
    pub const fn from_multiple(multiple: bool) -> Self {
        if multiple {
            Self::Multiple
        } else {
            Self::Exclusive
        }
    }
}

pub(crate) type Pads = [[PadBindings; SLOTS]; PORTS];

pub(crate) fn pad_pairs() -> impl Iterator<Item = (usize, usize)> {
    (0..PORTS).flat_map(|port| (0..SLOTS).map(move |slot| (port, slot)))
}
