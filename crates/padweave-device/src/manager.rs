use smallvec::SmallVec;

use crate::backend::ActivationContext;
use crate::binding::{PORTS, SLOTS};
use crate::control::{ControlKind, ControlUid, FULLY_DOWN};
use crate::device::{caseless_eq, Device, DeviceApi, DeviceKind, IdLevel};

/// Control that moved the most during a binding capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveControl {
    /// Index of the device in the manager.
    pub device: usize,
    pub uid: ControlUid,
    /// Virtual control index on that device.
    pub index: usize,
    /// Current value, or the motion for relative axes.
    pub value: i32,
}

/// Binding addressed by its flat index over all enabled devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSlot {
    Input { device: usize, index: usize },
    Effect { device: usize, index: usize },
}

/// Which devices should be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiPolicy {
    pub keyboard: Option<DeviceApi>,
    pub mouse: Option<DeviceApi>,
    pub game_apis: SmallVec<[DeviceApi; 4]>,
    /// Read game devices while the host window is unfocused.
    pub background: bool,
}

impl ApiPolicy {
    fn wants(&self, device: &Device, focused: bool) -> bool {
        let api = device.api();
        match device.kind() {
            DeviceKind::Keyboard => {
                focused && (api == DeviceApi::IgnoreKeyboard || self.keyboard == Some(api))
            }
            DeviceKind::Mouse => focused && self.mouse == Some(api),
            DeviceKind::Other => {
                (focused || self.background)
                    && (api == DeviceApi::Virtual || self.game_apis.contains(&api))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Pairing {
    Discard,
    Unmatched,
    Matched(usize),
}

/// Owns every known device and drives polling for all of them.
#[derive(Debug, Default)]
pub struct InputDeviceManager {
    devices: Vec<Device>,
}

impl InputDeviceManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_device(&mut self, device: Device) -> usize {
        log::debug!("Added device {} ({:?})", device.display_name(), device.api());
        self.devices.push(device);
        self.devices.len() - 1
    }

    #[must_use]
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    #[must_use]
    pub fn device(&self, index: usize) -> Option<&Device> {
        self.devices.get(index)
    }

    pub fn device_mut(&mut self, index: usize) -> Option<&mut Device> {
        self.devices.get_mut(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Removes every device, deactivating them.
    pub fn clear(&mut self) {
        self.devices.clear();
    }

    /// Hands the whole device set over, leaving the manager empty.
    pub fn take_devices(&mut self) -> Vec<Device> {
        std::mem::take(&mut self.devices)
    }

    pub fn enable_device(&mut self, index: usize) {
        if let Some(device) = self.devices.get_mut(index) {
            device.set_enabled(true);
        }
    }

    pub fn disable_device(&mut self, index: usize) {
        if let Some(device) = self.devices.get_mut(index) {
            device.set_enabled(false);
        }
    }

    pub fn disable_all_devices(&mut self) {
        for device in &mut self.devices {
            device.set_enabled(false);
        }
    }

    /// Deactivates every device while keeping it enabled, so the next
    /// update reacquires it.
    pub fn release_input(&mut self) {
        for device in &mut self.devices {
            device.deactivate();
        }
    }

    /// Enables the devices selected by `policy` and disables the rest.
    /// Detached devices are always disabled.
    pub fn refresh_enabled(&mut self, policy: &ApiPolicy, focused: bool) {
        for device in &mut self.devices {
            let wanted = device.is_attached() && policy.wants(device, focused);
            if wanted != device.is_enabled() {
                device.set_enabled(wanted);
            }
        }
    }

    /// Polls every enabled device.
    ///
    /// A device that just activated gets its first frame as a baseline, so
    /// controls already held at activation do not register as fresh presses.
    pub fn update(&mut self, ctx: &ActivationContext) {
        for device in &mut self.devices {
            if !device.is_enabled() {
                continue;
            }
            if !device.is_active() {
                if !device.activate(ctx) || !device.update() {
                    continue;
                }
                device.calc_virtual_state();
                device.post_read();
            } else if !device.update() {
                continue;
            }
            device.calc_virtual_state();
        }
    }

    /// Ends a frame on every active device.
    pub fn post_read(&mut self) {
        for device in &mut self.devices {
            device.post_read();
        }
    }

    /// Polls and returns the control that changed the most since the last
    /// frame, if any change is large enough to be a deliberate input.
    ///
    /// Does not end the frame; call [`post_read`](Self::post_read) after.
    pub fn get_active_device(&mut self, ctx: &ActivationContext) -> Option<ActiveControl> {
        self.update(ctx);
        let mut best_diff = i64::from(FULLY_DOWN / 2);
        let mut best = None;
        for (device_index, device) in self.devices.iter().enumerate() {
            let (Some(current), Some(previous)) = (device.virtual_state(), device.previous_state())
            else {
                continue;
            };
            let boost = device.api().boosts_button_capture();
            for (index, control) in device.virtual_controls().iter().enumerate() {
                let uid = control.uid;
                let (value, mut old) = (current[index], previous[index]);
                if value == old || uid.is_raw_pov() {
                    continue;
                }
                let kind = uid.kind();
                let is_button = kind.is_some_and(ControlKind::is_button);
                // Releasing a button or hat direction never counts as movement.
                if !kind.is_some_and(ControlKind::is_axis) && old.abs() > value.abs() {
                    old = 0;
                }
                let mut diff = (i64::from(value) - i64::from(old)).abs();
                if kind == Some(ControlKind::RelAxis) {
                    diff = diff / 4 + 1;
                }
                if boost && is_button {
                    diff *= 4;
                }
                if diff <= best_diff {
                    continue;
                }
                if uid.is_full_axis() {
                    if kind != Some(ControlKind::AbsAxis) || !crosses_middle(old, value) {
                        continue;
                    }
                } else if kind == Some(ControlKind::AbsAxis) && old > 15 * (FULLY_DOWN / 16) {
                    continue;
                }
                best_diff = diff;
                let value = if kind == Some(ControlKind::RelAxis) {
                    value.saturating_sub(old)
                } else {
                    value
                };
                best = Some(ActiveControl { device: device_index, uid, index, value });
            }
        }
        best
    }

    /// Carries the bindings of `old_devices` over to the current devices
    /// after an enumeration.
    ///
    /// Devices are paired by instance id, then product id, then display
    /// name, case-insensitively and one-to-one. Unpaired old devices with
    /// bindings stay on as detached devices.
    pub fn copy_bindings(&mut self, mut old_devices: Vec<Device>) {
        let mut taken = vec![false; self.devices.len()];
        let mut pairing: Vec<Pairing> = old_devices
            .iter()
            .map(|old| if old.has_bindings() { Pairing::Unmatched } else { Pairing::Discard })
            .collect();

        for level in IdLevel::ALL {
            for (old, pair) in old_devices.iter().zip(pairing.iter_mut()) {
                if !matches!(pair, Pairing::Unmatched) {
                    continue;
                }
                let Some(old_id) = old.ids().get(level) else {
                    continue;
                };
                let found = self.devices.iter().enumerate().position(|(index, device)| {
                    !taken[index] && device.ids().get(level).is_some_and(|id| caseless_eq(id, old_id))
                });
                if let Some(index) = found {
                    taken[index] = true;
                    *pair = Pairing::Matched(index);
                }
            }
        }

        for (old, pair) in old_devices.iter_mut().zip(pairing) {
            match pair {
                Pairing::Discard => {}
                Pairing::Unmatched => {
                    log::info!("Keeping bindings of missing device {}", old.display_name());
                    let ghost = old.take_as_detached();
                    self.devices.push(ghost);
                }
                Pairing::Matched(index) => self.devices[index].adopt_bindings(old),
            }
        }
    }

    /// Sends a motor value to every enabled device with force feedback.
    pub fn set_effect(&mut self, port: usize, slot: usize, motor: u8, force: u8) {
        for device in &mut self.devices {
            if device.is_enabled() && !device.ff_effect_types().is_empty() {
                device.set_effects(port, slot, motor, force);
            }
        }
    }

    /// Resolves a flat binding index for one pad.
    ///
    /// Enabled devices are walked in order; each contributes its input
    /// bindings followed by its force-feedback bindings.
    #[must_use]
    pub fn binding_at(&self, port: usize, slot: usize, mut index: usize) -> Option<BindingSlot> {
        if port >= PORTS || slot >= SLOTS {
            return None;
        }
        for (device_index, device) in self.devices.iter().enumerate() {
            if !device.is_enabled() {
                continue;
            }
            let pad = device.pad(port, slot)?;
            if index < pad.bindings.len() {
                return Some(BindingSlot::Input { device: device_index, index });
            }
            index -= pad.bindings.len();
            if index < pad.ff_bindings.len() {
                return Some(BindingSlot::Effect { device: device_index, index });
            }
            index -= pad.ff_bindings.len();
        }
        None
    }

    /// Deletes the binding at a flat index, see [`binding_at`](Self::binding_at).
    pub fn delete_by_index(&mut self, port: usize, slot: usize, index: usize) -> bool {
        match self.binding_at(port, slot, index) {
            Some(BindingSlot::Input { device, index }) => {
                self.devices[device].delete_binding(port, slot, index).is_some()
            }
            Some(BindingSlot::Effect { device, index }) => {
                self.devices[device].delete_effect_binding(port, slot, index).is_some()
            }
            None => false,
        }
    }
}

/// Full-range axes only count when swept from an extreme past the middle.
fn crosses_middle(old: i32, value: i32) -> bool {
    (old < FULLY_DOWN / 32 && value > FULLY_DOWN / 8)
        || (old > 31 * (FULLY_DOWN / 32) && value < 7 * (FULLY_DOWN / 8))
}
