use std::borrow::Cow;
use std::mem;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::backend::{ActivationContext, DeviceBackend};
use crate::binding::{pad_pairs, BindPolicy, Binding, PadBindings, Pads, MOTORS, PORTS, SLOTS};
use crate::control::{
    pov_pressures, virtual_uids, ControlKind, ControlUid, PhysicalControl, VirtualControl,
    BASE_SENSITIVITY, FULLY_DOWN,
};
use crate::effect::{
    EffectRequest, EffectShape, ForceFeedbackAxis, ForceFeedbackBinding, ForceFeedbackEffectType,
};

const DETACHED_PREFIX: &str = "[Detached] ";

/// Input API a device is read through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceApi {
    WindowMessages,
    RawInput,
    DirectInput,
    XInput,
    Ds3,
    Hid,
    /// Keyboard that swallows keys so the host does not see them.
    IgnoreKeyboard,
    Virtual,
}

impl DeviceApi {
    /// Button presses on this API are boosted when capturing bindings.
    #[must_use]
    pub const fn boosts_button_capture(self) -> bool {
        matches!(self, Self::Ds3)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Keyboard,
    Mouse,
    Other,
}

/// Identity level used to match devices across enumerations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdLevel {
    Instance,
    Product,
    DisplayName,
}

impl IdLevel {
    /// Most to least specific.
    pub const ALL: [Self; 3] = [Self::Instance, Self::Product, Self::DisplayName];
}

/// Names a device is known by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIds {
    pub display_name: Box<str>,
    pub instance_id: Box<str>,
    pub product_id: Option<Box<str>>,
}

impl DeviceIds {
    #[must_use]
    pub fn new(display_name: &str, instance_id: &str, product_id: Option<&str>) -> Self {
        Self {
            display_name: display_name
                .strip_prefix(DETACHED_PREFIX)
                .unwrap_or(display_name)
                .into(),
            instance_id: instance_id.into(),
            product_id: product_id.map(Into::into),
        }
    }

    #[must_use]
    pub fn get(&self, level: IdLevel) -> Option<&str> {
        match level {
            IdLevel::Instance => Some(&self.instance_id),
            IdLevel::Product => self.product_id.as_deref(),
            IdLevel::DisplayName => Some(&self.display_name),
        }
    }
}

#[derive(Debug, Clone)]
struct ControlState {
    physical: Vec<i32>,
    current: Vec<i32>,
    previous: Vec<i32>,
}

impl ControlState {
    fn new(physical: usize, virtual_count: usize) -> Self {
        Self {
            physical: vec![0; physical],
            current: vec![0; virtual_count],
            previous: vec![0; virtual_count],
        }
    }
}

/// One input device: its controls, its bindings for every pad and
/// the backend that reads it.
///
/// Detached devices carry bindings of hardware that is not present. They
/// have no backend and never activate.
pub struct Device {
    api: DeviceApi,
    kind: DeviceKind,
    ids: DeviceIds,
    enabled: bool,
    physical_controls: Vec<PhysicalControl>,
    virtual_controls: Vec<VirtualControl>,
    ff_axes: Vec<ForceFeedbackAxis>,
    ff_effect_types: Vec<ForceFeedbackEffectType>,
    pads: Pads,
    state: Option<ControlState>,
    backend: Option<Box<dyn DeviceBackend>>,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("api", &self.api)
            .field("kind", &self.kind)
            .field("ids", &self.ids)
            .field("enabled", &self.enabled)
            .field("attached", &self.is_attached())
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

impl Device {
    /// Creates an attached device read through `backend`.
    #[must_use]
    pub fn new(
        api: DeviceApi,
        kind: DeviceKind,
        ids: DeviceIds,
        backend: Box<dyn DeviceBackend>,
    ) -> Self {
        let mut device = Self::detached(api, kind, ids);
        device.backend = Some(backend);
        device
    }

    /// Creates a device without hardware, used for saved bindings.
    #[must_use]
    pub fn detached(api: DeviceApi, kind: DeviceKind, ids: DeviceIds) -> Self {
        Self {
            api,
            kind,
            ids,
            enabled: false,
            physical_controls: Vec::new(),
            virtual_controls: Vec::new(),
            ff_axes: Vec::new(),
            ff_effect_types: Vec::new(),
            pads: Pads::default(),
            state: None,
            backend: None,
        }
    }

    #[must_use]
    pub fn api(&self) -> DeviceApi {
        self.api
    }

    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    #[must_use]
    pub fn ids(&self) -> &DeviceIds {
        &self.ids
    }

    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.ids.instance_id
    }

    #[must_use]
    pub fn product_id(&self) -> Option<&str> {
        self.ids.product_id.as_deref()
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.ids.display_name
    }

    /// Display name as shown to the user, marked when the device is detached.
    #[must_use]
    pub fn display_label(&self) -> Cow<'_, str> {
        if self.is_attached() {
            Cow::Borrowed(&self.ids.display_name)
        } else {
            Cow::Owned(format!("{DETACHED_PREFIX}{}", self.ids.display_name))
        }
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.backend.is_some()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    #[must_use]
    pub fn physical_controls(&self) -> &[PhysicalControl] {
        &self.physical_controls
    }

    #[must_use]
    pub fn virtual_controls(&self) -> &[VirtualControl] {
        &self.virtual_controls
    }

    #[must_use]
    pub fn ff_axes(&self) -> &[ForceFeedbackAxis] {
        &self.ff_axes
    }

    #[must_use]
    pub fn ff_effect_types(&self) -> &[ForceFeedbackEffectType] {
        &self.ff_effect_types
    }

    #[must_use]
    pub fn pad(&self, port: usize, slot: usize) -> Option<&PadBindings> {
        self.pads.get(port)?.get(slot)
    }

    pub fn pad_mut(&mut self, port: usize, slot: usize) -> Option<&mut PadBindings> {
        self.pads.get_mut(port)?.get_mut(slot)
    }

    /// Whether any (port, slot) pair holds a binding.
    #[must_use]
    pub fn has_bindings(&self) -> bool {
        self.pads.iter().flatten().any(|pad| !pad.is_empty())
    }

    /// Registers a physical control and fans out its virtual controls.
    ///
    /// Returns the physical control index.
    pub fn add_physical_control(
        &mut self,
        kind: ControlKind,
        id: u16,
        vkey: Option<u32>,
        name: Option<&str>,
    ) -> usize {
        let physical_index = self.physical_controls.len();
        let mut base_virtual_index = None;
        for uid in virtual_uids(kind, id) {
            let index = self.add_virtual_control(uid, Some(physical_index));
            base_virtual_index.get_or_insert(index);
        }
        self.physical_controls.push(PhysicalControl {
            kind,
            id,
            vkey,
            name: name.map(Into::into),
            base_virtual_index: base_virtual_index.unwrap_or(self.virtual_controls.len()),
        });
        self.deactivate();
        physical_index
    }

    /// Adds a virtual control and returns its index.
    pub fn add_virtual_control(&mut self, uid: ControlUid, physical: Option<usize>) -> usize {
        self.virtual_controls.push(VirtualControl { uid, physical });
        self.virtual_controls.len() - 1
    }

    #[must_use]
    pub fn virtual_control_index(&self, uid: ControlUid) -> Option<usize> {
        self.virtual_controls.iter().position(|control| control.uid == uid)
    }

    pub fn add_ff_axis(&mut self, display_name: &str, id: i32) -> usize {
        self.ff_axes.push(ForceFeedbackAxis { display_name: display_name.into(), id });
        for binding in self.pads.iter_mut().flatten().flat_map(|pad| pad.ff_bindings.iter_mut()) {
            binding.axes.push(Default::default());
        }
        self.ff_axes.len() - 1
    }

    #[must_use]
    pub fn ff_axis_index(&self, id: i32) -> Option<usize> {
        self.ff_axes.iter().position(|axis| axis.id == id)
    }

    pub fn add_ff_effect_type(&mut self, display_name: &str, effect_id: &str, shape: EffectShape) -> usize {
        self.ff_effect_types.push(ForceFeedbackEffectType {
            display_name: display_name.into(),
            effect_id: effect_id.into(),
            shape,
        });
        self.ff_effect_types.len() - 1
    }

    /// Case-insensitive lookup of an effect type.
    #[must_use]
    pub fn ff_effect_index(&self, effect_id: &str) -> Option<usize> {
        self.ff_effect_types
            .iter()
            .position(|effect| caseless_eq(&effect.effect_id, effect_id))
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.deactivate();
        }
        self.enabled = enabled;
    }

    /// Acquires the hardware. Re-activating an active device restarts it.
    pub fn activate(&mut self, ctx: &ActivationContext) -> bool {
        if self.is_active() {
            self.deactivate();
        }
        let Some(backend) = self.backend.as_mut() else {
            return false;
        };
        match backend.activate(ctx) {
            Ok(()) => {
                self.state = Some(ControlState::new(
                    self.physical_controls.len(),
                    self.virtual_controls.len(),
                ));
                log::debug!("Activated {}", self.ids.display_name);
                true
            }
            Err(e) => {
                backend.deactivate();
                log::warn!("Failed to activate {}: {e}", self.ids.display_name);
                false
            }
        }
    }

    /// Releases the hardware and drops all control state.
    pub fn deactivate(&mut self) {
        if self.state.take().is_some() {
            if let Some(backend) = self.backend.as_mut() {
                backend.deactivate();
            }
            log::debug!("Deactivated {}", self.ids.display_name);
        }
    }

    /// Reads raw values from the backend. A failing device is deactivated.
    pub fn update(&mut self) -> bool {
        let (Some(backend), Some(state)) = (self.backend.as_mut(), self.state.as_mut()) else {
            return false;
        };
        let Err(e) = backend.update(&mut state.physical) else {
            return true;
        };
        log::warn!("Lost {}: {e}", self.ids.display_name);
        self.deactivate();
        false
    }

    /// Derives every virtual control value from the physical state.
    pub fn calc_virtual_state(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        for (control, &value) in self.physical_controls.iter().zip(&state.physical) {
            let base = control.base_virtual_index;
            let current = &mut state.current;
            match control.kind {
                ControlKind::PushButton | ControlKind::ToggleButton => current[base] = value,
                ControlKind::AbsAxis => {
                    // Even values keep both halves in exact agreement with the full range.
                    let value = value.clamp(-FULLY_DOWN, FULLY_DOWN) & !1;
                    current[base] = (value + FULLY_DOWN) / 2;
                    current[base + 1] = value.max(0);
                    current[base + 2] = (-value).max(0);
                }
                ControlKind::RelAxis => {
                    current[base] = value;
                    current[base + 1] = value.max(0);
                    current[base + 2] = value.saturating_neg().max(0);
                }
                ControlKind::Pov => {
                    current[base] = value;
                    current[base + 1..base + 5].copy_from_slice(&pov_pressures(value));
                }
            }
        }
    }

    /// Remembers the current virtual state as the previous frame.
    pub fn post_read(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.previous.copy_from_slice(&state.current);
        }
    }

    #[must_use]
    pub fn virtual_state(&self) -> Option<&[i32]> {
        self.state.as_ref().map(|state| state.current.as_slice())
    }

    #[must_use]
    pub fn previous_state(&self) -> Option<&[i32]> {
        self.state.as_ref().map(|state| state.previous.as_slice())
    }

    #[must_use]
    pub fn physical_state(&self) -> Option<&[i32]> {
        self.state.as_ref().map(|state| state.physical.as_slice())
    }

    /// Current value of a virtual control, 0 while inactive.
    #[must_use]
    pub fn control_value(&self, index: usize) -> i32 {
        self.virtual_state().and_then(|s| s.get(index).copied()).unwrap_or(0)
    }

    #[must_use]
    pub fn previous_value(&self, index: usize) -> i32 {
        self.previous_state().and_then(|s| s.get(index).copied()).unwrap_or(0)
    }

    /// Plays a single force-feedback binding.
    pub fn set_effect(&mut self, port: usize, slot: usize, index: usize, force: u8) -> bool {
        if !self.is_active() {
            return false;
        }
        let Some(binding) = self
            .pads
            .get(port)
            .and_then(|pads| pads.get(slot))
            .and_then(|pad| pad.ff_bindings.get(index))
        else {
            return false;
        };
        let effect = self.ff_effect_types.get(binding.effect_index);
        let (Some(effect), Some(backend)) = (effect, self.backend.as_mut()) else {
            return false;
        };
        let request = EffectRequest {
            motor: binding.motor,
            value: force,
            effect,
            axes: &self.ff_axes,
            forces: &binding.axes,
        };
        report_effect(&self.ids, backend.set_effect(&request))
    }

    /// Plays every force-feedback binding of `motor` on one pad.
    pub fn set_effects(&mut self, port: usize, slot: usize, motor: u8, force: u8) -> bool {
        if !self.is_active() || port >= PORTS || slot >= SLOTS {
            return false;
        }
        let Some(backend) = self.backend.as_mut() else {
            return false;
        };
        let requests: SmallVec<[EffectRequest<'_>; 4]> = self.pads[port][slot]
            .ff_bindings
            .iter()
            .filter(|binding| binding.motor == motor)
            .filter_map(|binding| {
                Some(EffectRequest {
                    motor,
                    value: force,
                    effect: self.ff_effect_types.get(binding.effect_index)?,
                    axes: &self.ff_axes,
                    forces: &binding.axes,
                })
            })
            .collect();
        if requests.is_empty() {
            return false;
        }
        report_effect(&self.ids, backend.set_effects(&requests))
    }

    /// Binds the virtual control `uid` to `command` on one pad.
    ///
    /// Returns the index of the new binding in that pad's list.
    #[allow(clippy::too_many_arguments)]
    pub fn bind_command(
        &mut self,
        uid: ControlUid,
        port: usize,
        slot: usize,
        command: u8,
        sensitivity: i32,
        turbo: u8,
        dead_zone: i32,
        policy: BindPolicy,
    ) -> Option<usize> {
        if port >= PORTS || slot >= SLOTS {
            return None;
        }
        let control_index = self.virtual_control_index(uid)?;
        let sensitivity = if sensitivity == 0 {
            BASE_SENSITIVITY
        } else if uid.kind() == Some(ControlKind::RelAxis) {
            sensitivity.saturating_abs()
        } else {
            sensitivity
        };

        let controls = &self.virtual_controls;
        let bindings = &mut self.pads[port][slot].bindings;
        let mut new_index = bindings
            .iter()
            .rposition(|b| b.control_index <= control_index)
            .map_or(0, |i| i + 1);
        bindings.insert(
            new_index,
            Binding { control_index, command, sensitivity, turbo, dead_zone },
        );

        let replaces = |other: &Binding| match policy {
            BindPolicy::Multiple => other.control_index == control_index && other.command == command,
            BindPolicy::Exclusive => {
                other.control_index == control_index
                    || controls.get(other.control_index).is_some_and(|c| c.uid.collides_with(uid))
            }
        };
        let mut index = 0;
        while index < bindings.len() {
            if index != new_index && replaces(&bindings[index]) {
                bindings.remove(index);
                if index < new_index {
                    new_index -= 1;
                }
            } else {
                index += 1;
            }
        }

        if policy == BindPolicy::Exclusive {
            for (other_port, other_slot) in pad_pairs() {
                if (other_port, other_slot) != (port, slot) {
                    self.pads[other_port][other_slot]
                        .bindings
                        .retain(|b| b.control_index != control_index);
                }
            }
        }
        Some(new_index)
    }

    /// Adds a force-feedback binding with every axis force at zero.
    ///
    /// `effect_id` of `None` picks the first effect type.
    pub fn create_effect_binding(
        &mut self,
        effect_id: Option<&str>,
        port: usize,
        slot: usize,
        motor: u8,
    ) -> Option<usize> {
        if port >= PORTS || slot >= SLOTS || motor >= MOTORS || self.ff_effect_types.is_empty() {
            return None;
        }
        let effect_index = match effect_id {
            Some(id) => self.ff_effect_index(id)?,
            None => 0,
        };
        let axis_count = self.ff_axes.len();
        let ff_bindings = &mut self.pads[port][slot].ff_bindings;
        let new_index = ff_bindings
            .iter()
            .rposition(|b| b.motor <= motor)
            .map_or(0, |i| i + 1);
        ff_bindings.insert(new_index, ForceFeedbackBinding::new(motor, effect_index, axis_count));
        Some(new_index)
    }

    pub fn delete_binding(&mut self, port: usize, slot: usize, index: usize) -> Option<Binding> {
        let bindings = &mut self.pad_mut(port, slot)?.bindings;
        (index < bindings.len()).then(|| bindings.remove(index))
    }

    pub fn delete_effect_binding(
        &mut self,
        port: usize,
        slot: usize,
        index: usize,
    ) -> Option<ForceFeedbackBinding> {
        let ff_bindings = &mut self.pad_mut(port, slot)?.ff_bindings;
        (index < ff_bindings.len()).then(|| ff_bindings.remove(index))
    }

    /// Moves every binding into a new detached device with the same
    /// virtual controls and force-feedback layout.
    pub(crate) fn take_as_detached(&mut self) -> Self {
        let mut ghost = Self::detached(self.api, self.kind, self.ids.clone());
        for control in &self.virtual_controls {
            ghost.add_virtual_control(control.uid, None);
        }
        ghost.ff_effect_types.clone_from(&self.ff_effect_types);
        ghost.ff_axes.clone_from(&self.ff_axes);
        ghost.pads = mem::take(&mut self.pads);
        ghost
    }

    /// Copies bindings of `old` onto this device, matching controls by uid,
    /// effects by id and axes by axis id. Unresolvable entries are dropped.
    pub(crate) fn adopt_bindings(&mut self, old: &Self) {
        for (port, slot) in pad_pairs() {
            let old_pad = &old.pads[port][slot];
            for binding in &old_pad.bindings {
                let resolved = old
                    .virtual_controls
                    .get(binding.control_index)
                    .and_then(|control| self.virtual_control_index(control.uid));
                if let Some(control_index) = resolved {
                    self.pads[port][slot].bindings.push(Binding { control_index, ..*binding });
                }
            }
            for ff_binding in &old_pad.ff_bindings {
                let resolved = old
                    .ff_effect_types
                    .get(ff_binding.effect_index)
                    .and_then(|effect| self.ff_effect_index(&effect.effect_id));
                let Some(effect_index) = resolved else {
                    continue;
                };
                let mut copy = ForceFeedbackBinding::new(ff_binding.motor, effect_index, self.ff_axes.len());
                for (axis, info) in old.ff_axes.iter().zip(&ff_binding.axes) {
                    if let Some(new_axis) = self.ff_axis_index(axis.id) {
                        copy.axes[new_axis] = *info;
                    }
                }
                self.pads[port][slot].ff_bindings.push(copy);
            }
        }
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        self.deactivate();
    }
}

fn report_effect(ids: &DeviceIds, result: crate::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            log::debug!("Effect rejected by {}: {e}", ids.display_name);
            false
        }
    }
}

pub(crate) fn caseless_eq(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ControlEvent, Direction, VirtualDeviceBuilder};

    fn pad_device() -> (Device, crate::VirtualHandle) {
        VirtualDeviceBuilder::new("Pad", "virtual-pad")
            .button(1, Some("Cross"))
            .axis(2, Some("X"))
            .relative_axis(3, None)
            .pov(4, None)
            .build()
    }

    fn uid_of(kind: ControlKind, id: u16) -> ControlUid {
        match kind {
            ControlKind::PushButton | ControlKind::ToggleButton => ControlUid::button(kind, id),
            ControlKind::AbsAxis | ControlKind::RelAxis => ControlUid::axis(kind, id),
            ControlKind::Pov => ControlUid::pov(id),
        }
    }

    fn poll(device: &mut Device) {
        assert!(device.update());
        device.calc_virtual_state();
    }

    #[test]
    fn fan_out_assigns_consecutive_virtual_indices() {
        let (device, _) = pad_device();
        assert_eq!(device.physical_controls().len(), 4);
        assert_eq!(device.virtual_controls().len(), 1 + 3 + 3 + 5);
        let axis = &device.physical_controls()[1];
        assert_eq!(axis.base_virtual_index, 1);
        assert_eq!(device.virtual_controls()[1].uid, uid_of(ControlKind::AbsAxis, 2));
        assert_eq!(device.virtual_controls()[11].physical, Some(3));
    }

    #[test]
    fn absolute_axis_halves_agree_with_full_range() {
        let (mut device, handle) = pad_device();
        assert!(device.activate(&ActivationContext::default()));
        for raw in [-FULLY_DOWN, -40_001, -2, 0, 1, 12_345, 40_000, FULLY_DOWN] {
            handle.send(ControlEvent::Set { id: 2, value: raw });
            poll(&mut device);
            let state = device.virtual_state().unwrap();
            let (full, pos, neg) = (state[1], state[2], state[3]);
            assert_eq!(pos - neg, full * 2 - FULLY_DOWN, "raw {raw}");
            assert!(pos == 0 || neg == 0);
        }
    }

    #[test]
    fn relative_axis_reports_motion_since_last_update() {
        let (mut device, handle) = pad_device();
        assert!(device.activate(&ActivationContext::default()));
        handle.send(ControlEvent::Move { id: 3, delta: -300 });
        handle.send(ControlEvent::Move { id: 3, delta: 100 });
        poll(&mut device);
        assert_eq!(&device.virtual_state().unwrap()[4..7], &[-200, 0, 200]);
        poll(&mut device);
        assert_eq!(&device.virtual_state().unwrap()[4..7], &[0, 0, 0]);
    }

    #[test]
    fn hat_directions_follow_raw_angle() {
        let (mut device, handle) = pad_device();
        assert!(device.activate(&ActivationContext::default()));
        handle.send(ControlEvent::Set { id: 4, value: 9000 });
        poll(&mut device);
        let state = device.virtual_state().unwrap();
        assert_eq!(&state[7..12], &[9000, 0, FULLY_DOWN, 0, 0]);
        let east = ControlUid::pov_direction(4, Direction::East);
        assert_eq!(device.virtual_control_index(east), Some(9));
    }

    #[test]
    fn deactivating_twice_is_harmless() {
        let (mut device, handle) = pad_device();
        assert!(device.activate(&ActivationContext::default()));
        assert!(handle.is_acquired());
        device.deactivate();
        device.deactivate();
        assert!(!handle.is_acquired());
        assert!(!device.is_active());
        assert!(device.virtual_state().is_none());
        assert!(device.physical_state().is_none());
        assert!(device.previous_state().is_none());
    }

    #[test]
    fn post_read_copies_current_into_previous() {
        let (mut device, handle) = pad_device();
        assert!(device.activate(&ActivationContext::default()));
        handle.send(ControlEvent::Set { id: 1, value: FULLY_DOWN });
        poll(&mut device);
        assert_eq!(device.previous_value(0), 0);
        device.post_read();
        assert_eq!(device.previous_value(0), FULLY_DOWN);
    }

    #[test]
    fn failed_update_deactivates() {
        let (mut device, handle) = pad_device();
        assert!(device.activate(&ActivationContext::default()));
        handle.send(ControlEvent::Disconnect);
        assert!(!device.update());
        assert!(!device.is_active());
        assert!(!handle.is_acquired());
    }

    #[test]
    fn refused_activation_releases_everything() {
        let (mut device, handle) = pad_device();
        handle.refuse_activation(true);
        assert!(!device.activate(&ActivationContext::default()));
        assert!(!device.is_active());
        assert!(!handle.is_acquired());
    }

    #[test]
    fn dropping_a_device_releases_hardware() {
        let (mut device, handle) = pad_device();
        assert!(device.activate(&ActivationContext::default()));
        assert!(handle.is_acquired());
        drop(device);
        assert!(!handle.is_acquired());
    }

    #[test]
    fn bindings_stay_sorted_by_control_index() {
        let (mut device, _) = pad_device();
        let axis_neg = ControlUid::axis_half(ControlKind::AbsAxis, 2, false);
        let cross = uid_of(ControlKind::PushButton, 1);
        let north = ControlUid::pov_direction(4, Direction::North);
        device.bind_command(north, 0, 0, 0x14, 0, 0, 0, BindPolicy::Multiple);
        device.bind_command(cross, 0, 0, 0x1F, 0, 0, 0, BindPolicy::Multiple);
        let index = device.bind_command(axis_neg, 0, 0, 0x23, 0, 0, 0, BindPolicy::Multiple);
        assert_eq!(index, Some(1));
        let indices: Vec<_> = device.pad(0, 0).unwrap().bindings.iter().map(|b| b.control_index).collect();
        assert_eq!(indices, vec![0, 3, 8]);
    }

    #[test]
    fn zero_sensitivity_becomes_base_and_relative_axes_drop_sign() {
        let (mut device, _) = pad_device();
        let cross = uid_of(ControlKind::PushButton, 1);
        let mouse_x = uid_of(ControlKind::RelAxis, 3);
        device.bind_command(cross, 0, 0, 0x1F, 0, 0, 0, BindPolicy::Multiple);
        device.bind_command(mouse_x, 0, 0, 0x20, -3 * BASE_SENSITIVITY, 0, 0, BindPolicy::Multiple);
        let bindings = &device.pad(0, 0).unwrap().bindings;
        assert_eq!(bindings[0].sensitivity, BASE_SENSITIVITY);
        assert_eq!(bindings[1].sensitivity, 3 * BASE_SENSITIVITY);
    }

    #[test]
    fn multiple_policy_only_replaces_exact_duplicates() {
        let (mut device, _) = pad_device();
        let cross = uid_of(ControlKind::PushButton, 1);
        device.bind_command(cross, 0, 0, 0x1F, 0, 0, 0, BindPolicy::Multiple);
        device.bind_command(cross, 0, 0, 0x1E, 0, 0, 0, BindPolicy::Multiple);
        device.bind_command(cross, 0, 0, 0x1F, 2 * BASE_SENSITIVITY, 0, 0, BindPolicy::Multiple);
        let bindings = &device.pad(0, 0).unwrap().bindings;
        assert_eq!(bindings.len(), 2);
        let cross_binding = bindings.iter().find(|b| b.command == 0x1F).unwrap();
        assert_eq!(cross_binding.sensitivity, 2 * BASE_SENSITIVITY);
    }

    #[test]
    fn exclusive_policy_unbinds_control_everywhere() {
        let (mut device, _) = pad_device();
        let cross = uid_of(ControlKind::PushButton, 1);
        device.bind_command(cross, 0, 0, 0x1F, 0, 0, 0, BindPolicy::Exclusive);
        device.bind_command(cross, 1, 1, 0x1E, 0, 0, 0, BindPolicy::Exclusive);
        assert!(device.pad(0, 0).unwrap().bindings.is_empty());
        assert_eq!(device.pad(1, 1).unwrap().bindings.len(), 1);
        device.bind_command(cross, 1, 1, 0x1D, 0, 0, 0, BindPolicy::Exclusive);
        let bindings = &device.pad(1, 1).unwrap().bindings;
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].command, 0x1D);
    }

    #[test]
    fn exclusive_full_axis_replaces_its_halves() {
        let (mut device, _) = pad_device();
        let pos = ControlUid::axis_half(ControlKind::AbsAxis, 2, true);
        let neg = ControlUid::axis_half(ControlKind::AbsAxis, 2, false);
        device.bind_command(pos, 0, 0, 0x21, 0, 0, 0, BindPolicy::Exclusive);
        device.bind_command(neg, 0, 0, 0x23, 0, 0, 0, BindPolicy::Exclusive);
        assert_eq!(device.pad(0, 0).unwrap().bindings.len(), 2);
        let index = device.bind_command(uid_of(ControlKind::AbsAxis, 2), 0, 0, 0x18, 0, 0, 0, BindPolicy::Exclusive);
        assert_eq!(index, Some(0));
        let bindings = &device.pad(0, 0).unwrap().bindings;
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].command, 0x18);
    }

    #[test]
    fn bind_rejects_unknown_uid_and_pad() {
        let (mut device, _) = pad_device();
        let missing = ControlUid::button(ControlKind::PushButton, 99);
        assert_eq!(device.bind_command(missing, 0, 0, 0x1F, 0, 0, 0, BindPolicy::Multiple), None);
        let cross = uid_of(ControlKind::PushButton, 1);
        assert_eq!(device.bind_command(cross, PORTS, 0, 0x1F, 0, 0, 0, BindPolicy::Multiple), None);
        assert!(!device.has_bindings());
    }

    #[test]
    fn effect_bindings_sorted_by_motor() {
        let (mut device, _) = VirtualDeviceBuilder::new("Wheel", "wheel")
            .ff_axis(0, "X")
            .ff_axis(1, "Y")
            .effect("constant", "Constant", EffectShape::Constant)
            .effect("sine", "Sine", EffectShape::Sine)
            .build();
        assert_eq!(device.create_effect_binding(None, 0, 0, 1), Some(0));
        assert_eq!(device.create_effect_binding(Some("SINE"), 0, 0, 0), Some(0));
        assert_eq!(device.create_effect_binding(Some("constant"), 0, 0, 1), Some(2));
        assert_eq!(device.create_effect_binding(Some("missing"), 0, 0, 0), None);
        assert_eq!(device.create_effect_binding(None, 0, 0, MOTORS), None);
        let ff = &device.pad(0, 0).unwrap().ff_bindings;
        assert_eq!(ff.iter().map(|b| b.motor).collect::<Vec<_>>(), vec![0, 1, 1]);
        assert_eq!(ff[0].effect_index, 1);
        assert_eq!(ff[1].effect_index, 0);
        assert!(ff.iter().all(|b| b.axes.len() == 2 && b.axes.iter().all(|a| a.force == 0)));
    }

    #[test]
    fn effect_binding_requires_effect_types() {
        let (mut device, _) = pad_device();
        assert_eq!(device.create_effect_binding(None, 0, 0, 0), None);
    }

    #[test]
    fn delete_binding_by_index() {
        let (mut device, _) = pad_device();
        let cross = uid_of(ControlKind::PushButton, 1);
        device.bind_command(cross, 0, 2, 0x1F, 0, 0, 0, BindPolicy::Multiple);
        assert_eq!(device.delete_binding(0, 2, 1), None);
        assert_eq!(device.delete_binding(0, 2, 0).map(|b| b.command), Some(0x1F));
        assert!(!device.has_bindings());
    }

    #[test]
    fn detached_label_and_stripped_name() {
        let ids = DeviceIds::new("[Detached] Old Pad", "id", None);
        let device = Device::detached(DeviceApi::DirectInput, DeviceKind::Other, ids);
        assert_eq!(device.display_name(), "Old Pad");
        assert_eq!(device.display_label(), "[Detached] Old Pad");
        assert!(!device.is_attached());
        let (attached, _) = pad_device();
        assert_eq!(attached.display_label(), "Pad");
    }

    #[test]
    fn caseless_comparison() {
        assert!(caseless_eq("HID\\VID_054C", "hid\\vid_054c"));
        assert!(!caseless_eq("pad", "pads"));
    }
}
