use std::sync::{Arc, Mutex, MutexGuard};

use padweave_device::{
    ActivationContext, ActiveControl, ApiPolicy, ControlUid, Device, DeviceKind, HotplugReceiver,
    InputDeviceManager,
};
use padweave_profile::{
    load_into, snapshot, GeneralSettings, LoadReport, PadCommand, PortSettings, Settings,
    SettingsError,
};
use thiserror::Error;

use crate::app::wire::{self, Reply};
use crate::app::{FrameEvents, PadSystem};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("device manager lock is poisoned")]
    Poisoned,
    #[error("no device at index {0}")]
    NoDevice(usize),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Lists the devices currently present. Called on start and after every
/// hot-plug notification.
pub type Enumerator = Box<dyn FnMut() -> Vec<Device> + Send>;

/// The device manager, the pads it feeds and everything that reshapes the
/// device set.
///
/// The manager sits behind a mutex shared with UI threads. Polls and
/// re-enumerations both hold it for their whole duration, so they never
/// interleave.
pub struct InputSession {
    manager: Arc<Mutex<InputDeviceManager>>,
    pads: PadSystem,
    hotplug: HotplugReceiver,
    enumerate: Enumerator,
    general: GeneralSettings,
    ports: Vec<PortSettings>,
    ctx: ActivationContext,
    focused: bool,
}

impl InputSession {
    /// Loads the saved bindings and merges them onto the devices
    /// `enumerate` reports.
    pub fn new(
        settings: &Settings,
        hotplug: HotplugReceiver,
        enumerate: impl FnMut() -> Vec<Device> + Send + 'static,
    ) -> Result<(Self, LoadReport), SessionError> {
        let mut manager = InputDeviceManager::new();
        let report = load_into(settings, &mut manager);
        let mut session = Self {
            manager: Arc::new(Mutex::new(manager)),
            pads: PadSystem::new(settings),
            hotplug,
            enumerate: Box::new(enumerate),
            general: settings.general.clone(),
            ports: settings.pads.clone(),
            ctx: ActivationContext { window: None, background: settings.general.background },
            focused: true,
        };
        session.refresh_devices()?;
        Ok((session, report))
    }

    /// Handle for threads that inspect or edit devices between frames.
    #[must_use]
    pub fn shared_manager(&self) -> Arc<Mutex<InputDeviceManager>> {
        Arc::clone(&self.manager)
    }

    #[must_use]
    pub fn pads(&self) -> &PadSystem {
        &self.pads
    }

    pub fn pads_mut(&mut self) -> &mut PadSystem {
        &mut self.pads
    }

    /// Sets the host window used for acquisition.
    pub fn set_window(&mut self, window: Option<u64>) {
        self.ctx.window = window;
    }

    /// Follows host focus. Keyboards and mice are only read while focused.
    pub fn set_focus(&mut self, focused: bool) -> Result<(), SessionError> {
        self.focused = focused;
        let mut manager = lock(&self.manager)?;
        apply_enablement(&mut manager, &self.pads, &self.general, focused);
        Ok(())
    }

    /// Re-enumerates devices and carries bindings over to the new set.
    pub fn refresh_devices(&mut self) -> Result<(), SessionError> {
        let fresh = (self.enumerate)();
        let mut manager = lock(&self.manager)?;
        let old = manager.take_devices();
        log::debug!("Re-enumerated {} devices, merging {} old ones", fresh.len(), old.len());
        for device in fresh {
            manager.add_device(device);
        }
        manager.copy_bindings(old);
        apply_enablement(&mut manager, &self.pads, &self.general, self.focused);
        Ok(())
    }

    /// Runs one frame: pending hot-plug work, then polling and
    /// aggregation for every pad.
    pub fn poll_frame(&mut self) -> Result<FrameEvents, SessionError> {
        if self.hotplug.needs_refresh() {
            self.refresh_devices()?;
        }
        let mut manager = lock(&self.manager)?;
        let events = self.pads.update(&mut manager, &self.ctx);
        if events.mouse_toggled {
            log::debug!("Mouse capture {}", if self.pads.mouse_capture() { "on" } else { "off" });
            apply_enablement(&mut manager, &self.pads, &self.general, self.focused);
        }
        Ok(events)
    }

    /// The console's reply to a read-data command for one pad.
    #[must_use]
    pub fn read_data(&self, port: usize, slot: usize) -> Option<Reply> {
        let pad = self.pads.pad(port, slot)?;
        Some(wire::read_data_reply(pad, self.pads.pad_type(port, slot), self.pads.gh2()))
    }

    /// Polls every selectable device and returns the control the user just
    /// moved, if any.
    ///
    /// Devices without bindings are read too, so call this repeatedly
    /// while waiting for input and [`refresh_enablement`](Self::refresh_enablement)
    /// once done.
    pub fn capture_control(&mut self) -> Result<Option<ActiveControl>, SessionError> {
        let mut manager = lock(&self.manager)?;
        manager.refresh_enabled(&api_policy(&self.general, &self.pads), true);
        let active = manager.get_active_device(&self.ctx);
        manager.post_read();
        Ok(active)
    }

    /// Returns to reading only the devices that drive a pad.
    pub fn refresh_enablement(&mut self) -> Result<(), SessionError> {
        let mut manager = lock(&self.manager)?;
        apply_enablement(&mut manager, &self.pads, &self.general, self.focused);
        Ok(())
    }

    /// Binds a control found by [`capture_control`](Self::capture_control).
    pub fn bind_control(
        &mut self,
        control: &ActiveControl,
        port: usize,
        slot: usize,
        command: PadCommand,
    ) -> Result<Option<usize>, SessionError> {
        self.bind(control.device, control.uid, port, slot, command)
    }

    /// Binds `uid` on the device at `device` at unit sensitivity, following
    /// the configured binding policy.
    pub fn bind(
        &mut self,
        device: usize,
        uid: ControlUid,
        port: usize,
        slot: usize,
        command: PadCommand,
    ) -> Result<Option<usize>, SessionError> {
        let mut manager = lock(&self.manager)?;
        let policy = self.general.bind_policy();
        let bound = manager
            .device_mut(device)
            .ok_or(SessionError::NoDevice(device))?
            .bind_command(uid, port, slot, command.id(), 0, 0, 0, policy);
        if bound.is_some() {
            log::debug!("Bound {uid} to {command} on pad {port}/{slot}");
            apply_enablement(&mut manager, &self.pads, &self.general, self.focused);
        }
        Ok(bound)
    }

    /// Settings document holding the current bindings.
    pub fn snapshot(&self) -> Result<Settings, SessionError> {
        let manager = lock(&self.manager)?;
        Ok(snapshot(&manager, &self.general, &self.ports))
    }
}

fn lock(manager: &Mutex<InputDeviceManager>) -> Result<MutexGuard<'_, InputDeviceManager>, SessionError> {
    manager.lock().map_err(|_| SessionError::Poisoned)
}

/// Configured APIs, without mice while mouse capture is toggled off.
fn api_policy(general: &GeneralSettings, pads: &PadSystem) -> ApiPolicy {
    let mut policy = general.api_policy();
    if !pads.mouse_capture() {
        policy.mouse = None;
    }
    policy
}

/// Enables the devices the settings select, then drops game devices that
/// drive none of the enabled pads.
fn apply_enablement(
    manager: &mut InputDeviceManager,
    pads: &PadSystem,
    general: &GeneralSettings,
    focused: bool,
) {
    manager.refresh_enabled(&api_policy(general, pads), focused);
    for index in 0..manager.len() {
        let idle = manager.device(index).is_some_and(|device| {
            device.is_enabled() && device.kind() == DeviceKind::Other && !pads.drives(device)
        });
        if idle {
            manager.disable_device(index);
        }
    }
}
