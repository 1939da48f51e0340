use crate::effect::EffectRequest;
use crate::error::{DeviceError, Result};

/// Host context handed to a backend when it acquires hardware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationContext {
    /// Native handle of the window that owns input focus, if any.
    pub window: Option<u64>,
    /// Keep reading input while the host window is unfocused.
    pub background: bool,
}

/// Platform side of a [`Device`](crate::Device).
///
/// A backend owns the OS resources of one physical device. Everything
/// acquired in `activate` is released in `deactivate`, including after a
/// partial activation failure.
pub trait DeviceBackend: Send {
    /// Acquires the device.
    fn activate(&mut self, ctx: &ActivationContext) -> Result<()>;

    /// Releases everything acquired by `activate`. Idempotent.
    fn deactivate(&mut self);

    /// Writes the current raw value of every physical control.
    ///
    /// Relative axes report the motion accumulated since the last call.
    fn update(&mut self, physical: &mut [i32]) -> Result<()>;

    /// Plays a single effect request.
    fn set_effect(&mut self, request: &EffectRequest<'_>) -> Result<()> {
        let _ = request;
        Err(DeviceError::Unsupported)
    }

    /// Plays every effect bound to one motor.
    fn set_effects(&mut self, requests: &[EffectRequest<'_>]) -> Result<()> {
        requests.iter().try_for_each(|request| self.set_effect(request))
    }
}
