use padweave_device::{BASE_SENSITIVITY, FULLY_DOWN};
use padweave_profile::{CommandTarget, PadCommand, StickAxis};

/// Pressure buttons, in command order: Select, L3, R3, Start, L2, R2, L1,
/// R1, Triangle, Circle, Square, Cross.
pub const BUTTON_COUNT: usize = 12;
pub const STICK_COUNT: usize = 3;

pub const DPAD: usize = 0;
pub const RIGHT_STICK: usize = 1;
pub const LEFT_STICK: usize = 2;

/// Largest magnitude a button or stick axis reports.
pub const MAX_PRESSURE: i32 = 255;

/// Button index as stored in [`ButtonSum::buttons`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Button {
    Select,
    L3,
    R3,
    Start,
    L2,
    R2,
    L1,
    R1,
    Triangle,
    Circle,
    Square,
    Cross,
}

impl Button {
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stick {
    pub horiz: i32,
    pub vert: i32,
}

impl Stick {
    #[inline]
    fn add(&mut self, axis: StickAxis, delta: i32) {
        match axis {
            StickAxis::Horizontal => self.horiz = self.horiz.saturating_add(delta),
            StickAxis::Vertical => self.vert = self.vert.saturating_add(delta),
        }
    }

    /// Scales both axes down so the larger one is at most 255.
    #[allow(clippy::cast_possible_truncation)]
    pub fn cap(&mut self) {
        let (horiz, vert) = (i64::from(self.horiz), i64::from(self.vert));
        let div = horiz.abs().max(vert.abs());
        let max = i64::from(MAX_PRESSURE);
        if div > max {
            // Both results lie within -255..=255.
            self.horiz = (horiz * max / div) as i32;
            self.vert = (vert * max / div) as i32;
        }
    }
}

/// Summed state of every binding driving one pad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonSum {
    pub buttons: [i32; BUTTON_COUNT],
    pub sticks: [Stick; STICK_COUNT],
}

impl ButtonSum {
    #[inline]
    #[must_use]
    pub fn button(&self, button: Button) -> i32 {
        self.buttons[button.index()]
    }

    /// Adds `delta` to whatever `command` drives. Meta commands are ignored.
    pub fn add_force(&mut self, command: PadCommand, delta: i32) {
        if delta == 0 {
            return;
        }
        match command.target() {
            CommandTarget::Button(index) => {
                self.buttons[index] = self.buttons[index].saturating_add(delta);
            }
            CommandTarget::Stick { stick, axis, sign } => {
                self.sticks[stick].add(axis, delta.saturating_mul(sign));
            }
            CommandTarget::Meta(_) => {}
        }
    }

    /// Clamps buttons to `0..=255` and scales sticks into `-255..=255`
    /// keeping their direction.
    pub fn cap(&mut self) {
        for stick in &mut self.sticks {
            stick.cap();
        }
        for button in &mut self.buttons {
            *button = i32::from(cap(*button));
        }
    }

    /// Adds the right and left sticks onto the D-pad.
    pub fn fold_sticks_into_dpad(&mut self) {
        let [dpad, right, left] = &mut self.sticks;
        for stick in [right, left] {
            dpad.horiz = dpad.horiz.saturating_add(stick.horiz);
            dpad.vert = dpad.vert.saturating_add(stick.vert);
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Clamps to a pressure byte.
#[inline]
#[must_use]
pub fn cap(value: i32) -> u8 {
    // Lossless after the clamp.
    value.clamp(0, MAX_PRESSURE) as u8
}

/// Force a binding contributes for a control reading `value`.
///
/// A fully pressed control at base sensitivity yields exactly 255.
/// Negative sensitivity measures from the released end instead. Values at
/// or below the dead zone contribute nothing.
#[must_use]
pub fn binding_force(sensitivity: i32, value: i32, dead_zone: i32) -> i32 {
    let full = i64::from(FULLY_DOWN);
    let (sensitivity, value) = if sensitivity < 0 {
        (-i64::from(sensitivity), full - i64::from(value))
    } else {
        (i64::from(sensitivity), i64::from(value))
    };
    if value <= i64::from(dead_zone.max(0)) {
        return 0;
    }
    let base = i64::from(BASE_SENSITIVITY);
    let scaled = sensitivity.saturating_mul(255).saturating_mul(value).saturating_add(base / 2) / base;
    let force = (scaled + full / 2) / full;
    i32::try_from(force).unwrap_or(i32::MAX)
}

/// Whether a meta command bound to this control should fire this frame.
#[inline]
#[must_use]
pub fn is_rising_edge(value: i32, previous: i32) -> bool {
    let half = FULLY_DOWN / 2;
    value >= half && previous < half
}
