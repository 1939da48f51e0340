use std::path::{Path, PathBuf};

use crate::parse::{parse_settings, to_yaml};
use crate::settings::Settings;
use crate::SettingsError;

const DEFAULT_SETTINGS_DIR: &str = ".config/padweave";
const SETTINGS_FILE_NAME: &str = "settings.yaml";

/// Directory holding the settings document.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Opens `path`, or the default directory under `$HOME`, creating it
    /// when missing.
    pub fn new(path: Option<&Path>) -> Result<Self, SettingsError> {
        let path = match path {
            Some(path) => path.to_owned(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            std::fs::create_dir_all(&path)?;
        } else if !path.is_dir() {
            return Err(SettingsError::PathIsNotDirectory(path.display().to_string()));
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings_path(&self) -> PathBuf {
        self.path.join(SETTINGS_FILE_NAME)
    }

    pub fn default_path() -> Result<PathBuf, SettingsError> {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(DEFAULT_SETTINGS_DIR))
            .map_err(|_| SettingsError::EnvVarNotSet("HOME".to_string()))
    }

    /// Reads the settings, or defaults when no file exists yet.
    pub fn load(&self) -> Result<Settings, SettingsError> {
        let path = self.settings_path();
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Settings::default());
        }
        let input = std::fs::read_to_string(&path)?;
        parse_settings(&input)
    }

    /// Writes the settings to a temporary file renamed over the document.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let yaml = to_yaml(settings)?;
        let path = self.settings_path();
        let tmp = path.with_extension("yaml.tmp");
        std::fs::write(&tmp, yaml)?;
        std::fs::rename(&tmp, &path)?;
        log::debug!("Saved settings to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DeviceSettings;
    use padweave_device::{DeviceApi, DeviceKind};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("padweave-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn creates_directory_and_defaults() {
        let dir = temp_dir("defaults");
        let store = SettingsStore::new(Some(&dir)).unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.load().unwrap(), Settings::default());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn save_then_load() {
        let dir = temp_dir("save");
        let store = SettingsStore::new(Some(&dir)).unwrap();
        let mut settings = Settings::default();
        settings.general.gh2 = true;
        settings.devices.push(DeviceSettings {
            display_name: "Pad".into(),
            instance_id: "pad".into(),
            product_id: None,
            api: DeviceApi::XInput,
            kind: DeviceKind::Other,
            bindings: vec!["0x00010001, 0, 31, 65536, 0, 0, 0".into()],
            ff_bindings: Vec::new(),
        });
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
        assert!(!store.settings_path().with_extension("yaml.tmp").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn rejects_file_path() {
        let dir = temp_dir("file");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("not-a-dir");
        std::fs::write(&file, "").unwrap();
        assert!(matches!(
            SettingsStore::new(Some(&file)),
            Err(SettingsError::PathIsNotDirectory(_))
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
