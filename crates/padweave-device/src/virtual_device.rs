//! In-process backend driven through a channel.
//!
//! Used for tests, demos and for input injected by other programs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use ahash::AHashMap;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use smallvec::SmallVec;

use crate::backend::{ActivationContext, DeviceBackend};
use crate::control::{ControlKind, POV_CENTERED};
use crate::device::{Device, DeviceApi, DeviceIds, DeviceKind};
use crate::effect::{sum_axis_forces, EffectRequest, EffectShape};
use crate::error::{DeviceError, Result};

/// Input events buffered between two updates.
const EVENT_CAPACITY: usize = 1024;

/// Input fed to a virtual device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Latches the raw value of a button, absolute axis or hat.
    Set { id: u16, value: i32 },
    /// Adds motion to a relative axis.
    Move { id: u16, delta: i32 },
    /// Makes the next update fail as if the device was unplugged.
    Disconnect,
}

/// Force output observed on a virtual device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedForce {
    pub motor: u8,
    pub value: u8,
    pub effect_id: Box<str>,
    pub forces: SmallVec<[i32; 4]>,
}

#[derive(Debug, Default)]
struct Shared {
    refuse_activation: AtomicBool,
    acquisitions: AtomicUsize,
    forces: Mutex<Vec<AppliedForce>>,
}

/// Held while the device is acquired. Dropping it releases the device.
#[derive(Debug)]
struct Acquisition(Arc<Shared>);

impl Acquisition {
    fn new(shared: &Arc<Shared>) -> Self {
        shared.acquisitions.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(shared))
    }
}

impl Drop for Acquisition {
    fn drop(&mut self) {
        self.0.acquisitions.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Control side of a virtual device.
#[derive(Debug, Clone)]
pub struct VirtualHandle {
    events: Sender<ControlEvent>,
    shared: Arc<Shared>,
}

impl VirtualHandle {
    /// Queues an event for the next update. Returns `false` when the
    /// queue is full or the device is gone.
    pub fn send(&self, event: ControlEvent) -> bool {
        match self.events.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                log::warn!("Virtual input queue full, dropping {event:?}");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn press(&self, id: u16) -> bool {
        self.send(ControlEvent::Set { id, value: crate::FULLY_DOWN })
    }

    pub fn release(&self, id: u16) -> bool {
        self.send(ControlEvent::Set { id, value: 0 })
    }

    /// Makes future activations fail with [`DeviceError::Busy`].
    pub fn refuse_activation(&self, refuse: bool) {
        self.shared.refuse_activation.store(refuse, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_acquired(&self) -> bool {
        self.shared.acquisitions.load(Ordering::SeqCst) > 0
    }

    /// Force output recorded so far, oldest first.
    #[must_use]
    pub fn applied_forces(&self) -> Vec<AppliedForce> {
        self.shared
            .forces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

struct VirtualBackend {
    kinds: Vec<ControlKind>,
    index_by_id: AHashMap<u16, usize>,
    values: Vec<i32>,
    motion: Vec<i32>,
    events: Receiver<ControlEvent>,
    shared: Arc<Shared>,
    acquisition: Option<Acquisition>,
    axis_count: usize,
}

impl VirtualBackend {
    fn apply(&mut self, event: ControlEvent) -> Result<()> {
        match event {
            ControlEvent::Set { id, value } => {
                if let Some(&index) = self.index_by_id.get(&id) {
                    self.values[index] = value;
                }
            }
            ControlEvent::Move { id, delta } => {
                if let Some(&index) = self.index_by_id.get(&id) {
                    self.motion[index] = self.motion[index].saturating_add(delta);
                }
            }
            ControlEvent::Disconnect => return Err(DeviceError::Disconnected),
        }
        Ok(())
    }

    fn record(&self, requests: &[EffectRequest<'_>]) {
        let Some(first) = requests.first() else {
            return;
        };
        let applied = AppliedForce {
            motor: first.motor,
            value: first.value,
            effect_id: first.effect.effect_id.clone(),
            forces: sum_axis_forces(requests, self.axis_count),
        };
        self.shared
            .forces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(applied);
    }
}

impl DeviceBackend for VirtualBackend {
    fn activate(&mut self, _ctx: &ActivationContext) -> Result<()> {
        if self.shared.refuse_activation.load(Ordering::SeqCst) {
            return Err(DeviceError::Busy("activation refused".into()));
        }
        self.acquisition = Some(Acquisition::new(&self.shared));
        self.motion.fill(0);
        Ok(())
    }

    fn deactivate(&mut self) {
        self.acquisition = None;
    }

    fn update(&mut self, physical: &mut [i32]) -> Result<()> {
        if self.acquisition.is_none() {
            return Err(DeviceError::Unavailable("not acquired".into()));
        }
        let events: Vec<ControlEvent> = self.events.try_iter().collect();
        for event in events {
            self.apply(event)?;
        }
        for (index, slot) in physical.iter_mut().enumerate().take(self.kinds.len()) {
            *slot = if self.kinds[index] == ControlKind::RelAxis {
                std::mem::take(&mut self.motion[index])
            } else {
                self.values[index]
            };
        }
        Ok(())
    }

    fn set_effect(&mut self, request: &EffectRequest<'_>) -> Result<()> {
        self.record(std::slice::from_ref(request));
        Ok(())
    }

    fn set_effects(&mut self, requests: &[EffectRequest<'_>]) -> Result<()> {
        self.record(requests);
        Ok(())
    }
}

/// Builds a [`Device`] backed by a channel, plus the handle that drives it.
///
/// Control ids are unique per device regardless of kind.
#[derive(Debug)]
pub struct VirtualDeviceBuilder {
    display_name: String,
    instance_id: String,
    product_id: Option<String>,
    api: DeviceApi,
    kind: DeviceKind,
    controls: Vec<(ControlKind, u16, Option<String>)>,
    ff_axes: Vec<(i32, String)>,
    effects: Vec<(String, String, EffectShape)>,
}

impl VirtualDeviceBuilder {
    #[must_use]
    pub fn new(display_name: &str, instance_id: &str) -> Self {
        Self {
            display_name: display_name.to_owned(),
            instance_id: instance_id.to_owned(),
            product_id: None,
            api: DeviceApi::Virtual,
            kind: DeviceKind::Other,
            controls: Vec::new(),
            ff_axes: Vec::new(),
            effects: Vec::new(),
        }
    }

    #[must_use]
    pub fn product_id(mut self, product_id: &str) -> Self {
        self.product_id = Some(product_id.to_owned());
        self
    }

    #[must_use]
    pub fn api(mut self, api: DeviceApi) -> Self {
        self.api = api;
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: DeviceKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn control(mut self, kind: ControlKind, id: u16, name: Option<&str>) -> Self {
        self.controls.push((kind, id, name.map(str::to_owned)));
        self
    }

    #[must_use]
    pub fn button(self, id: u16, name: Option<&str>) -> Self {
        self.control(ControlKind::PushButton, id, name)
    }

    #[must_use]
    pub fn axis(self, id: u16, name: Option<&str>) -> Self {
        self.control(ControlKind::AbsAxis, id, name)
    }

    #[must_use]
    pub fn relative_axis(self, id: u16, name: Option<&str>) -> Self {
        self.control(ControlKind::RelAxis, id, name)
    }

    #[must_use]
    pub fn pov(self, id: u16, name: Option<&str>) -> Self {
        self.control(ControlKind::Pov, id, name)
    }

    #[must_use]
    pub fn ff_axis(mut self, id: i32, name: &str) -> Self {
        self.ff_axes.push((id, name.to_owned()));
        self
    }

    #[must_use]
    pub fn effect(mut self, effect_id: &str, name: &str, shape: EffectShape) -> Self {
        self.effects.push((effect_id.to_owned(), name.to_owned(), shape));
        self
    }

    #[must_use]
    pub fn build(self) -> (Device, VirtualHandle) {
        let (tx, rx) = bounded(EVENT_CAPACITY);
        let shared = Arc::new(Shared::default());
        let mut index_by_id = AHashMap::with_capacity(self.controls.len());
        let mut kinds = Vec::with_capacity(self.controls.len());
        let mut values = Vec::with_capacity(self.controls.len());
        for (index, (kind, id, _)) in self.controls.iter().enumerate() {
            index_by_id.insert(*id, index);
            kinds.push(*kind);
            values.push(if *kind == ControlKind::Pov { POV_CENTERED } else { 0 });
        }
        let backend = VirtualBackend {
            motion: vec![0; kinds.len()],
            kinds,
            index_by_id,
            values,
            events: rx,
            shared: Arc::clone(&shared),
            acquisition: None,
            axis_count: self.ff_axes.len(),
        };

        let ids = DeviceIds::new(&self.display_name, &self.instance_id, self.product_id.as_deref());
        let mut device = Device::new(self.api, self.kind, ids, Box::new(backend));
        for (kind, id, name) in &self.controls {
            device.add_physical_control(*kind, *id, None, name.as_deref());
        }
        for (id, name) in &self.ff_axes {
            device.add_ff_axis(name, *id);
        }
        for (effect_id, name, shape) in &self.effects {
            device.add_ff_effect_type(name, effect_id, *shape);
        }
        (device, VirtualHandle { events: tx, shared })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latches_values_until_changed() {
        let (mut device, handle) = VirtualDeviceBuilder::new("Pad", "pad").button(5, None).build();
        assert!(device.activate(&ActivationContext::default()));
        handle.press(5);
        assert!(device.update());
        assert_eq!(device.physical_state(), Some(&[crate::FULLY_DOWN][..]));
        assert!(device.update());
        assert_eq!(device.physical_state(), Some(&[crate::FULLY_DOWN][..]));
        handle.release(5);
        assert!(device.update());
        assert_eq!(device.physical_state(), Some(&[0][..]));
    }

    #[test]
    fn hats_start_centered_and_unknown_ids_are_ignored() {
        let (mut device, handle) = VirtualDeviceBuilder::new("Pad", "pad").pov(0, None).build();
        assert!(device.activate(&ActivationContext::default()));
        handle.send(ControlEvent::Set { id: 77, value: 1 });
        assert!(device.update());
        assert_eq!(device.physical_state(), Some(&[POV_CENTERED][..]));
    }

    #[test]
    fn reactivation_discards_stale_motion() {
        let (mut device, handle) = VirtualDeviceBuilder::new("Mouse", "mouse")
            .relative_axis(0, None)
            .build();
        assert!(device.activate(&ActivationContext::default()));
        handle.send(ControlEvent::Move { id: 0, delta: 10 });
        assert!(device.update());
        assert_eq!(device.physical_state(), Some(&[10][..]));
        assert!(device.activate(&ActivationContext::default()));
        assert!(device.update());
        assert_eq!(device.physical_state(), Some(&[0][..]));
    }
}
