use padweave_device::{ApiPolicy, BindPolicy, DeviceApi, DeviceKind, PORTS, SLOTS};
use serde::{Deserialize, Serialize};

pub const SETTINGS_VERSION: u8 = 1;

/// The persisted settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub version: u8,
    #[serde(default)]
    pub general: GeneralSettings,
    /// One entry per port; missing ports use defaults.
    #[serde(default)]
    pub pads: Vec<PortSettings>,
    #[serde(default)]
    pub devices: Vec<DeviceSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            general: GeneralSettings::default(),
            pads: vec![PortSettings::default(); PORTS],
            devices: Vec::new(),
        }
    }
}

impl Settings {
    /// Settings of one port, defaults when the document has none.
    #[must_use]
    pub fn port(&self, port: usize) -> PortSettings {
        self.pads.get(port).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralSettings {
    /// Let one control drive several commands.
    pub multiple_bindings: bool,
    /// Guitar Hero 2 button layout for guitar pads.
    pub gh2: bool,
    /// Keep reading game devices while unfocused.
    pub background: bool,
    pub keyboard_api: Option<DeviceApi>,
    pub mouse_api: Option<DeviceApi>,
    pub direct_input: bool,
    pub xinput: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            multiple_bindings: false,
            gh2: false,
            background: false,
            keyboard_api: Some(DeviceApi::WindowMessages),
            mouse_api: None,
            direct_input: true,
            xinput: true,
        }
    }
}

impl GeneralSettings {
    #[must_use]
    pub fn bind_policy(&self) -> BindPolicy {
        BindPolicy::from_multiple(self.multiple_bindings)
    }

    /// Which devices the manager should read.
    #[must_use]
    pub fn api_policy(&self) -> ApiPolicy {
        let mut policy = ApiPolicy {
            keyboard: self.keyboard_api,
            mouse: self.mouse_api,
            background: self.background,
            ..ApiPolicy::default()
        };
        if self.direct_input {
            policy.game_apis.push(DeviceApi::DirectInput);
        }
        if self.xinput {
            policy.game_apis.push(DeviceApi::XInput);
        }
        policy.game_apis.extend([DeviceApi::Ds3, DeviceApi::Hid, DeviceApi::RawInput]);
        policy
    }
}

/// Kind of pad emulated on one (port, slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadType {
    Disabled,
    #[default]
    Dualshock2,
    Guitar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlotSettings {
    #[serde(rename = "type")]
    pub pad_type: PadType,
    /// Start the pad in analog mode.
    pub auto_analog: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortSettings {
    /// Slots 1 to 3 are only used with a multitap.
    pub multitap: bool,
    /// One entry per multitap slot; missing slots use defaults.
    pub slots: Vec<SlotSettings>,
}

impl PortSettings {
    #[must_use]
    pub fn slot(&self, slot: usize) -> SlotSettings {
        self.slots.get(slot).copied().unwrap_or_default()
    }

    /// Whether the pad on `slot` takes part in polling.
    #[must_use]
    pub fn is_slot_enabled(&self, slot: usize) -> bool {
        slot < SLOTS
            && (slot == 0 || self.multitap)
            && self.slot(slot).pad_type != PadType::Disabled
    }
}

/// A device and its bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceSettings {
    pub display_name: String,
    pub instance_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub api: DeviceApi,
    pub kind: DeviceKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ff_bindings: Vec<String>,
}
