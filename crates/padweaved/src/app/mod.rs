mod pad;
mod sum;
pub mod wire;

pub use pad::{FrameEvents, LockFlag, Pad, PadMode, PadSystem};
pub use sum::{
    binding_force, cap, is_rising_edge, Button, ButtonSum, Stick, BUTTON_COUNT, DPAD, LEFT_STICK,
    MAX_PRESSURE, RIGHT_STICK, STICK_COUNT,
};
