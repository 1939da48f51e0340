use serde::Deserialize;

use crate::settings::{Settings, SETTINGS_VERSION};
use crate::SettingsError;

/// Parse a yaml settings document.
pub fn parse_settings(input: &str) -> Result<Settings, SettingsError> {
    let version = parse_version(input)?;
    match version {
        SETTINGS_VERSION => Ok(serde_yaml::from_str(input)?),
        _ => Err(SettingsError::UnsupportedVersion(version)),
    }
}

/// Serialize settings back to yaml.
pub fn to_yaml(settings: &Settings) -> Result<String, SettingsError> {
    Ok(serde_yaml::to_string(settings)?)
}

/// Settings with only a version.
#[derive(Debug, Clone, Deserialize)]
struct VersionedSettings {
    version: u8,
}

fn parse_version(input: &str) -> Result<u8, SettingsError> {
    let raw: VersionedSettings = serde_yaml::from_str(input)?;
    Ok(raw.version)
}

#[cfg(test)]
mod tests {
    use padweave_device::{DeviceApi, DeviceKind};

    use super::*;
    use crate::settings::PadType;

    const SAMPLE: &str = r#"
version: 1
general:
  multiple_bindings: true
  gh2: true
  keyboard_api: raw_input
pads:
  - multitap: true
    slots:
      - type: guitar
      - type: dualshock2
        auto_analog: true
devices:
  - display_name: Keyboard
    instance_id: "raw:kbd0"
    api: raw_input
    kind: keyboard
    bindings:
      - "0x00010039, 0, 31, 65536, 0, 0, 0"
"#;

    #[test]
    fn parses_sample_document() {
        let settings = parse_settings(SAMPLE).unwrap();
        assert!(settings.general.multiple_bindings);
        assert!(settings.general.gh2);
        assert_eq!(settings.general.keyboard_api, Some(DeviceApi::RawInput));
        assert!(settings.general.direct_input);
        assert!(settings.pads[0].multitap);
        let port = settings.port(0);
        assert_eq!(port.slot(0).pad_type, PadType::Guitar);
        assert!(port.slot(1).auto_analog);
        assert_eq!(port.slot(2).pad_type, PadType::Dualshock2);
        assert!(!settings.port(1).multitap);
        assert_eq!(settings.devices[0].kind, DeviceKind::Keyboard);
        assert_eq!(settings.devices[0].product_id, None);
        assert_eq!(settings.devices[0].bindings.len(), 1);
    }

    #[test]
    fn yaml_error_when_version_missing() {
        assert!(matches!(parse_settings("devices: []\n"), Err(SettingsError::Yaml(_))));
    }

    #[test]
    fn rejects_unknown_version() {
        assert!(matches!(
            parse_settings("version: 2\n"),
            Err(SettingsError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(matches!(
            parse_settings("version: 1\ngeneral:\n  turbo_everything: true\n"),
            Err(SettingsError::Yaml(_))
        ));
    }

    #[test]
    fn serialized_settings_parse_back() {
        let settings = parse_settings(SAMPLE).unwrap();
        let yaml = to_yaml(&settings).unwrap();
        assert_eq!(parse_settings(&yaml).unwrap(), settings);
    }
}
