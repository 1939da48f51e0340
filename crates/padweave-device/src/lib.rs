mod backend;
mod binding;
mod control;
mod device;
mod effect;
mod error;
mod events;
mod manager;
#[cfg(feature = "virtual-backend")]
mod virtual_device;

pub use crate::backend::{ActivationContext, DeviceBackend};
pub use crate::binding::{BindPolicy, Binding, PadBindings, MOTORS, PORTS, SLOTS};
pub use crate::control::{
    ControlKind, ControlUid, Direction, PhysicalControl, VirtualControl,
    BASE_SENSITIVITY, FULLY_DOWN, POV_CENTERED,
};
pub use crate::device::{Device, DeviceApi, DeviceIds, DeviceKind, IdLevel};
pub use crate::effect::{
    sum_axis_forces, AxisEffectInfo, EffectRequest, EffectShape, ForceFeedbackAxis,
    ForceFeedbackBinding, ForceFeedbackEffectType,
};
pub use crate::error::{DeviceError, Result};
pub use crate::events::{hotplug_channel, HotplugEvent, HotplugReceiver, HotplugSender};
pub use crate::manager::{ActiveControl, ApiPolicy, BindingSlot, InputDeviceManager};
#[cfg(feature = "virtual-backend")]
pub use crate::virtual_device::{
    AppliedForce, ControlEvent, VirtualDeviceBuilder, VirtualHandle,
};
