use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

/// Waveform family of a force-feedback effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectShape {
    #[default]
    Constant,
    Spring,
    Damper,
    Inertia,
    Friction,
    Square,
    Sine,
    Triangle,
    SawtoothUp,
    SawtoothDown,
}

/// An effect a device can render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForceFeedbackEffectType {
    pub display_name: Box<str>,
    /// Backend-specific identifier, persisted in settings.
    pub effect_id: Box<str>,
    pub shape: EffectShape,
}

/// One force-feedback actuator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForceFeedbackAxis {
    pub display_name: Box<str>,
    pub id: i32,
}

/// Strength of an effect on a single axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisEffectInfo {
    pub force: i32,
}

/// Routes one emulated motor to one effect of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForceFeedbackBinding {
    pub motor: u8,
    /// Index into the device's effect types.
    pub effect_index: usize,
    /// One entry per device force-feedback axis.
    pub axes: SmallVec<[AxisEffectInfo; 4]>,
}

impl ForceFeedbackBinding {
    pub(crate) fn new(motor: u8, effect_index: usize, axis_count: usize) -> Self {
        Self {
            motor,
            effect_index,
            axes: smallvec![AxisEffectInfo::default(); axis_count],
        }
    }
}

/// A motor value routed to a backend through one force-feedback binding.
#[derive(Debug, Clone, Copy)]
pub struct EffectRequest<'a> {
    pub motor: u8,
    /// Requested motor strength, 0..=255.
    pub value: u8,
    pub effect: &'a ForceFeedbackEffectType,
    pub axes: &'a [ForceFeedbackAxis],
    pub forces: &'a [AxisEffectInfo],
}

/// Sums the per-axis forces of several requests, scaled by each
/// request's motor value.
///
/// Backends that can only play one effect at a time use this to merge
/// every binding of a motor into a single output.
#[must_use]
pub fn sum_axis_forces(requests: &[EffectRequest<'_>], axis_count: usize) -> SmallVec<[i32; 4]> {
    let mut sums: SmallVec<[i32; 4]> = smallvec![0; axis_count];
    for request in requests {
        for (sum, info) in sums.iter_mut().zip(request.forces) {
            *sum += info.force * i32::from(request.value) / 255;
        }
    }
    sums
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_scaled_forces_per_axis() {
        let effect = ForceFeedbackEffectType {
            display_name: "Constant".into(),
            effect_id: "constant".into(),
            shape: EffectShape::Constant,
        };
        let axes = [
            ForceFeedbackAxis { display_name: "X".into(), id: 0 },
            ForceFeedbackAxis { display_name: "Y".into(), id: 1 },
        ];
        let first = [AxisEffectInfo { force: 10_000 }, AxisEffectInfo { force: 0 }];
        let second = [AxisEffectInfo { force: 2_000 }, AxisEffectInfo { force: -5_100 }];
        let requests = [
            EffectRequest { motor: 0, value: 255, effect: &effect, axes: &axes, forces: &first },
            EffectRequest { motor: 1, value: 51, effect: &effect, axes: &axes, forces: &second },
        ];
        let sums = sum_axis_forces(&requests, axes.len());
        assert_eq!(sums.as_slice(), &[10_400, -1_020]);
    }

    #[test]
    fn short_force_lists_leave_remaining_axes_untouched() {
        let effect = ForceFeedbackEffectType {
            display_name: "Rumble".into(),
            effect_id: "rumble".into(),
            shape: EffectShape::Square,
        };
        let forces = [AxisEffectInfo { force: 255 }];
        let request = EffectRequest { motor: 0, value: 255, effect: &effect, axes: &[], forces: &forces };
        assert_eq!(sum_axis_forces(&[request], 3).as_slice(), &[255, 0, 0]);
    }
}
