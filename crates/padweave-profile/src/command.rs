use std::fmt;

/// Command a binding drives on an emulated pad.
///
/// The numeric ids are stored in binding records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PadCommand {
    LockButtons = 0x0C,
    LockInput = 0x0D,
    LockDirection = 0x0E,
    ToggleMouse = 0x0F,
    Select = 0x10,
    L3 = 0x11,
    R3 = 0x12,
    Start = 0x13,
    DpadUp = 0x14,
    DpadRight = 0x15,
    DpadDown = 0x16,
    DpadLeft = 0x17,
    L2 = 0x18,
    R2 = 0x19,
    L1 = 0x1A,
    R1 = 0x1B,
    Triangle = 0x1C,
    Circle = 0x1D,
    Square = 0x1E,
    Cross = 0x1F,
    LeftStickUp = 0x20,
    LeftStickRight = 0x21,
    LeftStickDown = 0x22,
    LeftStickLeft = 0x23,
    RightStickUp = 0x24,
    RightStickRight = 0x25,
    RightStickDown = 0x26,
    RightStickLeft = 0x27,
    AnalogToggle = 0x28,
}

const FIRST_COMMAND: u8 = 0x0C;

const ALL_COMMANDS: [PadCommand; 29] = [
    PadCommand::LockButtons,
    PadCommand::LockInput,
    PadCommand::LockDirection,
    PadCommand::ToggleMouse,
    PadCommand::Select,
    PadCommand::L3,
    PadCommand::R3,
    PadCommand::Start,
    PadCommand::DpadUp,
    PadCommand::DpadRight,
    PadCommand::DpadDown,
    PadCommand::DpadLeft,
    PadCommand::L2,
    PadCommand::R2,
    PadCommand::L1,
    PadCommand::R1,
    PadCommand::Triangle,
    PadCommand::Circle,
    PadCommand::Square,
    PadCommand::Cross,
    PadCommand::LeftStickUp,
    PadCommand::LeftStickRight,
    PadCommand::LeftStickDown,
    PadCommand::LeftStickLeft,
    PadCommand::RightStickUp,
    PadCommand::RightStickRight,
    PadCommand::RightStickDown,
    PadCommand::RightStickLeft,
    PadCommand::AnalogToggle,
];

/// Axis of a stick accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickAxis {
    Horizontal,
    Vertical,
}

/// Commands applied on a rising edge instead of being summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    LockButtons,
    LockInput,
    LockDirection,
    ToggleMouse,
    AnalogToggle,
}

/// Where a command's force goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandTarget {
    /// Index into the twelve pressure buttons.
    Button(usize),
    /// Stick 0 is the D-pad, 1 the right stick, 2 the left stick.
    Stick { stick: usize, axis: StickAxis, sign: i32 },
    Meta(MetaCommand),
}

impl PadCommand {
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn target(self) -> CommandTarget {
        let id = self as u8;
        match self {
            Self::LockButtons => CommandTarget::Meta(MetaCommand::LockButtons),
            Self::LockInput => CommandTarget::Meta(MetaCommand::LockInput),
            Self::LockDirection => CommandTarget::Meta(MetaCommand::LockDirection),
            Self::ToggleMouse => CommandTarget::Meta(MetaCommand::ToggleMouse),
            Self::AnalogToggle => CommandTarget::Meta(MetaCommand::AnalogToggle),
            Self::Select | Self::L3 | Self::R3 | Self::Start => {
                CommandTarget::Button((id - 0x10) as usize)
            }
            Self::L2
            | Self::R2
            | Self::L1
            | Self::R1
            | Self::Triangle
            | Self::Circle
            | Self::Square
            | Self::Cross => CommandTarget::Button((id - 0x14) as usize),
            _ => {
                let stick = match id {
                    0x14..=0x17 => 0,
                    0x20..=0x23 => 2,
                    _ => 1,
                };
                // Up, right, down, left.
                let (axis, sign) = match id & 3 {
                    0 => (StickAxis::Vertical, -1),
                    1 => (StickAxis::Horizontal, 1),
                    2 => (StickAxis::Vertical, 1),
                    _ => (StickAxis::Horizontal, -1),
                };
                CommandTarget::Stick { stick, axis, sign }
            }
        }
    }

    #[must_use]
    pub const fn is_meta(self) -> bool {
        matches!(self.target(), CommandTarget::Meta(_))
    }

    pub fn all() -> impl Iterator<Item = Self> {
        ALL_COMMANDS.into_iter()
    }
}

impl TryFrom<u8> for PadCommand {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        value
            .checked_sub(FIRST_COMMAND)
            .and_then(|offset| ALL_COMMANDS.get(usize::from(offset)))
            .copied()
            .ok_or(value)
    }
}

impl From<PadCommand> for u8 {
    fn from(command: PadCommand) -> Self {
        command.id()
    }
}

impl fmt::Display for PadCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_contiguous() {
        for (offset, command) in PadCommand::all().enumerate() {
            assert_eq!(usize::from(command.id()), usize::from(FIRST_COMMAND) + offset);
            assert_eq!(PadCommand::try_from(command.id()), Ok(command));
        }
        assert_eq!(PadCommand::try_from(0x0B), Err(0x0B));
        assert_eq!(PadCommand::try_from(0x29), Err(0x29));
        assert_eq!(PadCommand::try_from(0), Err(0));
    }

    #[test]
    fn buttons_map_to_pressure_indices() {
        assert_eq!(PadCommand::Select.target(), CommandTarget::Button(0));
        assert_eq!(PadCommand::Start.target(), CommandTarget::Button(3));
        assert_eq!(PadCommand::L2.target(), CommandTarget::Button(4));
        assert_eq!(PadCommand::Triangle.target(), CommandTarget::Button(8));
        assert_eq!(PadCommand::Cross.target(), CommandTarget::Button(11));
    }

    #[test]
    fn sticks_map_to_axes() {
        assert_eq!(
            PadCommand::DpadUp.target(),
            CommandTarget::Stick { stick: 0, axis: StickAxis::Vertical, sign: -1 }
        );
        assert_eq!(
            PadCommand::LeftStickRight.target(),
            CommandTarget::Stick { stick: 2, axis: StickAxis::Horizontal, sign: 1 }
        );
        assert_eq!(
            PadCommand::RightStickDown.target(),
            CommandTarget::Stick { stick: 1, axis: StickAxis::Vertical, sign: 1 }
        );
        assert_eq!(
            PadCommand::RightStickLeft.target(),
            CommandTarget::Stick { stick: 1, axis: StickAxis::Horizontal, sign: -1 }
        );
    }

    #[test]
    fn meta_commands() {
        assert!(PadCommand::LockDirection.is_meta());
        assert!(PadCommand::AnalogToggle.is_meta());
        assert!(!PadCommand::Cross.is_meta());
    }
}
