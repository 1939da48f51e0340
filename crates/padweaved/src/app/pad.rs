use padweave_bit_derive::Bit;
use padweave_bit_mask::Bitmask;
use padweave_device::{ActivationContext, Device, InputDeviceManager, MOTORS, PORTS, SLOTS};
use padweave_profile::{CommandTarget, MetaCommand, PadCommand, PadType, Settings};

use super::sum::{binding_force, is_rising_edge, Button, ButtonSum, DPAD, RIGHT_STICK};

/// Vertical D-pad magnitude under which a guitar strum counts as idle.
const STRUM_IDLE: i32 = 48;

/// Fret remap applied to guitars in GH2 layout.
const GH2_FROM: [Button; 5] = [Button::R2, Button::Circle, Button::Triangle, Button::Cross, Button::Square];
const GH2_TO: [Button; 5] = [Button::L2, Button::L1, Button::R1, Button::R2, Button::Cross];

/// Report format a pad answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PadMode {
    #[default]
    Digital = 0x41,
    Analog = 0x73,
    Ds2Native = 0x79,
}

impl PadMode {
    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Bit)]
pub enum LockFlag {
    Both,
    Direction,
    Buttons,
}

/// State of one emulated pad.
#[derive(Debug, Clone, Default)]
pub struct Pad {
    mode: PadMode,
    mode_lock: bool,
    sum: ButtonSum,
    /// Floor added to every frame's sum while a lock is held.
    locked_sum: ButtonSum,
    locked: Bitmask<LockFlag>,
    current_vibrate: [u8; MOTORS as usize],
    next_vibrate: [u8; MOTORS as usize],
}

impl Pad {
    #[must_use]
    pub fn new(auto_analog: bool) -> Self {
        Self {
            mode: if auto_analog { PadMode::Analog } else { PadMode::Digital },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn mode(&self) -> PadMode {
        self.mode
    }

    /// Sets the mode as requested by the console, optionally locking it
    /// against the analog toggle.
    pub fn set_mode(&mut self, mode: PadMode, lock: bool) {
        self.mode = mode;
        self.mode_lock = lock;
    }

    #[must_use]
    pub fn is_mode_locked(&self) -> bool {
        self.mode_lock
    }

    /// Result of the last aggregation pass.
    #[must_use]
    pub fn sum(&self) -> &ButtonSum {
        &self.sum
    }

    #[must_use]
    pub fn locked(&self) -> Bitmask<LockFlag> {
        self.locked
    }

    #[must_use]
    pub fn locked_sum(&self) -> &ButtonSum {
        &self.locked_sum
    }

    /// Records the value sent to a motor on the next pass.
    pub fn set_vibrate(&mut self, motor: u8, value: u8) {
        if let Some(next) = self.next_vibrate.get_mut(usize::from(motor)) {
            *next = value;
        }
    }

    fn toggle_analog(&mut self) {
        if self.mode_lock {
            return;
        }
        self.mode = match self.mode {
            PadMode::Digital => PadMode::Analog,
            _ => PadMode::Digital,
        };
    }

    fn apply_lock_toggles(&mut self, mut changed: Bitmask<LockFlag>, sum: &ButtonSum) {
        let pair = Bitmask::new(&[LockFlag::Direction, LockFlag::Buttons]);
        if changed.contains(LockFlag::Both) {
            if self.locked == pair {
                changed = changed ^ pair;
            } else {
                // Lock whichever of the two is not locked yet.
                changed = changed ^ (self.locked ^ pair);
            }
        }
        if changed.contains(LockFlag::Direction) {
            self.locked_sum.sticks = if self.locked.contains(LockFlag::Direction) {
                Default::default()
            } else {
                sum.sticks
            };
            self.locked.toggle(LockFlag::Direction);
        }
        if changed.contains(LockFlag::Buttons) {
            self.locked_sum.buttons = if self.locked.contains(LockFlag::Buttons) {
                Default::default()
            } else {
                sum.buttons
            };
            self.locked.toggle(LockFlag::Buttons);
        }
        if self.locked_sum.is_zero() {
            self.locked.clear();
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SlotConfig {
    pad_type: PadType,
    auto_analog: bool,
    enabled: bool,
}

/// Side effects of one aggregation pass the caller has to act on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameEvents {
    /// Mouse capture was toggled, so device enablement must be refreshed.
    pub mouse_toggled: bool,
}

/// Every emulated pad plus the pass that feeds them.
#[derive(Debug)]
pub struct PadSystem {
    pads: [[Pad; SLOTS]; PORTS],
    slots: [[SlotConfig; SLOTS]; PORTS],
    gh2: bool,
    mouse_capture: bool,
    turbo: u32,
}

impl PadSystem {
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let mut system = Self {
            pads: Default::default(),
            slots: Default::default(),
            gh2: false,
            mouse_capture: true,
            turbo: 0,
        };
        system.configure(settings);
        for port in 0..PORTS {
            for slot in 0..SLOTS {
                system.reset_pad(port, slot);
            }
        }
        system
    }

    /// Takes pad types and multitap state from `settings`. Pad state is
    /// left alone.
    pub fn configure(&mut self, settings: &Settings) {
        self.gh2 = settings.general.gh2;
        for port in 0..PORTS {
            let port_settings = settings.port(port);
            for slot in 0..SLOTS {
                let slot_settings = port_settings.slot(slot);
                self.slots[port][slot] = SlotConfig {
                    pad_type: slot_settings.pad_type,
                    auto_analog: slot_settings.auto_analog,
                    enabled: port_settings.is_slot_enabled(slot),
                };
            }
        }
    }

    /// Returns a pad to its power-on state.
    pub fn reset_pad(&mut self, port: usize, slot: usize) {
        let Some(config) = self.slot(port, slot) else {
            return;
        };
        self.pads[port][slot] = Pad::new(config.auto_analog);
    }

    #[must_use]
    pub fn pad(&self, port: usize, slot: usize) -> Option<&Pad> {
        self.pads.get(port)?.get(slot)
    }

    pub fn pad_mut(&mut self, port: usize, slot: usize) -> Option<&mut Pad> {
        self.pads.get_mut(port)?.get_mut(slot)
    }

    fn slot(&self, port: usize, slot: usize) -> Option<SlotConfig> {
        self.slots.get(port)?.get(slot).copied()
    }

    #[must_use]
    pub fn pad_type(&self, port: usize, slot: usize) -> PadType {
        self.slot(port, slot).map(|config| config.pad_type).unwrap_or_default()
    }

    #[must_use]
    pub fn is_enabled(&self, port: usize, slot: usize) -> bool {
        self.slot(port, slot).is_some_and(|config| config.enabled)
    }

    #[must_use]
    pub fn gh2(&self) -> bool {
        self.gh2
    }

    #[must_use]
    pub fn mouse_capture(&self) -> bool {
        self.mouse_capture
    }

    pub fn set_vibrate(&mut self, port: usize, slot: usize, motor: u8, value: u8) {
        if let Some(pad) = self.pad_mut(port, slot) {
            pad.set_vibrate(motor, value);
        }
    }

    /// Zeroes every motor.
    pub fn stop_vibration(&mut self) {
        for pad in self.pads.iter_mut().flatten() {
            pad.next_vibrate = [0; MOTORS as usize];
        }
    }

    /// Whether `device` has any binding on an enabled pad.
    #[must_use]
    pub fn drives(&self, device: &Device) -> bool {
        (0..PORTS).any(|port| {
            (0..SLOTS).any(|slot| {
                self.is_enabled(port, slot)
                    && device.pad(port, slot).is_some_and(|pad| !pad.is_empty())
            })
        })
    }

    /// Polls the manager and rebuilds every pad's sum.
    ///
    /// Runs the whole frame: update, binding pass, post-read, vibration,
    /// then the per-pad remaps, capping and lock toggles.
    pub fn update(
        &mut self,
        manager: &mut InputDeviceManager,
        ctx: &ActivationContext,
    ) -> FrameEvents {
        let mut events = FrameEvents::default();
        let mut sums = [[ButtonSum::default(); SLOTS]; PORTS];
        let mut lock_changes = [[Bitmask::<LockFlag>::empty(); SLOTS]; PORTS];
        for (port, pads) in self.pads.iter().enumerate() {
            for (slot, pad) in pads.iter().enumerate() {
                sums[port][slot] = pad.locked_sum;
            }
        }

        manager.update(ctx);
        self.turbo = self.turbo.wrapping_add(1);

        for device in manager.devices() {
            if !device.is_active() {
                continue;
            }
            for port in 0..PORTS {
                for slot in 0..SLOTS {
                    if !self.is_enabled(port, slot) {
                        continue;
                    }
                    let Some(bindings) = device.pad(port, slot) else {
                        continue;
                    };
                    for binding in &bindings.bindings {
                        if self.turbo & u32::from(binding.turbo) != 0 {
                            continue;
                        }
                        let Ok(command) = PadCommand::try_from(binding.command) else {
                            continue;
                        };
                        let value = device.control_value(binding.control_index);
                        let CommandTarget::Meta(meta) = command.target() else {
                            let force = binding_force(binding.sensitivity, value, binding.dead_zone);
                            sums[port][slot].add_force(command, force);
                            continue;
                        };
                        if !is_rising_edge(value, device.previous_value(binding.control_index)) {
                            continue;
                        }
                        match meta {
                            MetaCommand::ToggleMouse => {
                                self.mouse_capture = !self.mouse_capture;
                                events.mouse_toggled = true;
                            }
                            MetaCommand::LockButtons => lock_changes[port][slot].insert(LockFlag::Buttons),
                            MetaCommand::LockDirection => {
                                lock_changes[port][slot].insert(LockFlag::Direction);
                            }
                            MetaCommand::LockInput => lock_changes[port][slot].insert(LockFlag::Both),
                            MetaCommand::AnalogToggle => self.pads[port][slot].toggle_analog(),
                        }
                    }
                }
            }
        }
        manager.post_read();

        for port in 0..PORTS {
            for slot in 0..SLOTS {
                let pad = &mut self.pads[port][slot];
                for motor in 0..MOTORS {
                    let index = usize::from(motor);
                    let next = pad.next_vibrate[index];
                    if next | pad.current_vibrate[index] != 0 {
                        pad.current_vibrate[index] = next;
                        manager.set_effect(port, slot, motor, next);
                    }
                }
            }
        }

        for port in 0..PORTS {
            for slot in 0..SLOTS {
                let config = self.slots[port][slot];
                let pad = &mut self.pads[port][slot];
                let sum = &mut sums[port][slot];
                if !config.enabled {
                    *sum = ButtonSum::default();
                    pad.sum = *sum;
                    continue;
                }
                if config.pad_type == PadType::Guitar {
                    if self.gh2 {
                        remap_gh2(sum, &pad.sum);
                    } else {
                        sum.sticks[RIGHT_STICK].vert = sum.sticks[RIGHT_STICK].vert.saturating_neg();
                    }
                }
                if pad.mode == PadMode::Digital {
                    sum.fold_sticks_into_dpad();
                }
                sum.cap();
                let changed = lock_changes[port][slot];
                if !changed.is_empty() {
                    pad.apply_lock_toggles(changed, sum);
                }
                pad.sum = *sum;
            }
        }
        events
    }
}

/// Moves the frets onto the GH2 layout.
///
/// While the strum bar is idle a fret may only fall relative to the last
/// frame. On the frame the strum bar leaves idle, frets held last frame are
/// dropped so a strum registers as a fresh press.
fn remap_gh2(sum: &mut ButtonSum, previous: &ButtonSum) {
    let mut values = [0; GH2_FROM.len()];
    for (value, button) in values.iter_mut().zip(GH2_FROM) {
        *value = std::mem::take(&mut sum.buttons[button.index()]);
    }
    sum.buttons[Button::Triangle.index()] = values[1];
    for (value, button) in values.into_iter().zip(GH2_TO) {
        sum.buttons[button.index()] = value;
    }
    if sum.sticks[DPAD].vert.saturating_abs() <= STRUM_IDLE {
        for button in GH2_TO {
            let index = button.index();
            sum.buttons[index] = sum.buttons[index].min(previous.buttons[index]);
        }
    } else if previous.sticks[DPAD].vert.saturating_abs() <= STRUM_IDLE {
        for button in GH2_TO {
            let index = button.index();
            if previous.buttons[index] != 0 {
                sum.buttons[index] = 0;
            }
        }
    }
}
