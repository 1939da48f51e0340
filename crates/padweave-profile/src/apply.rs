use padweave_device::{
    BindPolicy, Device, DeviceIds, EffectShape, InputDeviceManager, PORTS, SLOTS,
};
use smallvec::SmallVec;

use crate::record::{BindingRecord, EffectRecord};
use crate::settings::{DeviceSettings, GeneralSettings, PortSettings, Settings, SETTINGS_VERSION};
use crate::RecordError;

/// Axis name used for force-feedback axes only known from a record.
const UNKNOWN_AXIS_NAME: &str = "?";

/// A record that was skipped during a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub device: Box<str>,
    pub record: String,
    pub error: RecordError,
}

/// Outcome of [`load_into`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub devices: usize,
    pub bindings: usize,
    pub ff_bindings: usize,
    pub rejected: Vec<RejectedRecord>,
}

impl LoadReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    fn reject(&mut self, device: &str, record: &str, error: RecordError) {
        log::warn!("Skipping record {record:?} of {device}: {error}");
        self.rejected.push(RejectedRecord {
            device: device.into(),
            record: record.to_owned(),
            error,
        });
    }
}

/// Replaces the manager's devices with detached devices built from the
/// saved settings.
///
/// Records are replayed with multiple bindings allowed so that a saved
/// layout is restored verbatim. Controls, effects and axes named by records
/// are registered on the device as they are met. A bad record is skipped
/// and listed in the report.
pub fn load_into(settings: &Settings, manager: &mut InputDeviceManager) -> LoadReport {
    let mut report = LoadReport::default();
    manager.clear();
    for device_settings in &settings.devices {
        let device = load_device(device_settings, &mut report);
        manager.add_device(device);
        report.devices += 1;
    }
    log::debug!(
        "Loaded {} devices, {} bindings, {} force bindings",
        report.devices,
        report.bindings,
        report.ff_bindings
    );
    report
}

fn load_device(settings: &DeviceSettings, report: &mut LoadReport) -> Device {
    let ids = DeviceIds::new(
        &settings.display_name,
        &settings.instance_id,
        settings.product_id.as_deref(),
    );
    let mut device = Device::detached(settings.api, settings.kind, ids);
    let name = settings.display_name.as_str();

    for line in &settings.bindings {
        let record = match line.parse::<BindingRecord>() {
            Ok(record) => record,
            Err(e) => {
                report.reject(name, line, e);
                continue;
            }
        };
        if device.virtual_control_index(record.uid).is_none() {
            device.add_virtual_control(record.uid, None);
        }
        let bound = device.bind_command(
            record.uid,
            record.port,
            record.slot,
            record.command.id(),
            record.sensitivity,
            record.turbo,
            record.dead_zone,
            BindPolicy::Multiple,
        );
        match bound {
            Some(_) => report.bindings += 1,
            None => report.reject(name, line, RecordError::Rejected),
        }
    }

    for line in &settings.ff_bindings {
        let record = match line.parse::<EffectRecord>() {
            Ok(record) => record,
            Err(e) => {
                report.reject(name, line, e);
                continue;
            }
        };
        if device.ff_effect_index(&record.effect_id).is_none() {
            device.add_ff_effect_type(&record.effect_id, &record.effect_id, EffectShape::Constant);
        }
        let forces: SmallVec<[(usize, i32); 4]> = record
            .axes
            .iter()
            .map(|&(axis_id, force)| {
                let index = device
                    .ff_axis_index(axis_id)
                    .unwrap_or_else(|| device.add_ff_axis(UNKNOWN_AXIS_NAME, axis_id));
                (index, force)
            })
            .collect();
        let created = device.create_effect_binding(
            Some(&*record.effect_id),
            record.port,
            record.slot,
            record.motor,
        );
        let binding = created.and_then(|index| {
            device
                .pad_mut(record.port, record.slot)
                .and_then(|pad| pad.ff_bindings.get_mut(index))
        });
        let Some(binding) = binding else {
            report.reject(name, line, RecordError::Rejected);
            continue;
        };
        for (axis, force) in forces {
            binding.axes[axis].force = force;
        }
        report.ff_bindings += 1;
    }
    device
}

/// Builds a settings document from the manager's current bindings.
///
/// Devices without bindings are left out.
#[must_use]
pub fn snapshot(
    manager: &InputDeviceManager,
    general: &GeneralSettings,
    pads: &[PortSettings],
) -> Settings {
    let devices = manager
        .devices()
        .iter()
        .filter(|device| device.has_bindings())
        .map(device_settings)
        .collect();
    Settings {
        version: SETTINGS_VERSION,
        general: general.clone(),
        pads: pads.to_vec(),
        devices,
    }
}

fn device_settings(device: &Device) -> DeviceSettings {
    let mut bindings = Vec::new();
    let mut ff_bindings = Vec::new();
    for port in 0..PORTS {
        for slot in 0..SLOTS {
            let Some(pad) = device.pad(port, slot) else {
                continue;
            };
            for binding in &pad.bindings {
                let uid = device.virtual_controls()[binding.control_index].uid;
                let Ok(command) = binding.command.try_into() else {
                    log::warn!("Not saving unknown command {:#04x}", binding.command);
                    continue;
                };
                let record = BindingRecord {
                    uid,
                    port,
                    command,
                    sensitivity: binding.sensitivity,
                    turbo: binding.turbo,
                    slot,
                    dead_zone: binding.dead_zone,
                };
                bindings.push(record.to_string());
            }
            for binding in &pad.ff_bindings {
                let effect = &device.ff_effect_types()[binding.effect_index];
                let record = EffectRecord {
                    effect_id: effect.effect_id.clone(),
                    port,
                    motor: binding.motor,
                    slot,
                    axes: device
                        .ff_axes()
                        .iter()
                        .zip(&binding.axes)
                        .map(|(axis, info)| (axis.id, info.force))
                        .collect(),
                };
                ff_bindings.push(record.to_string());
            }
        }
    }
    DeviceSettings {
        display_name: device.display_name().to_owned(),
        instance_id: device.instance_id().to_owned(),
        product_id: device.product_id().map(str::to_owned),
        api: device.api(),
        kind: device.kind(),
        bindings,
        ff_bindings,
    }
}
