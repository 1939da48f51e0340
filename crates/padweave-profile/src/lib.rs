mod apply;
mod command;
mod parse;
mod record;
mod settings;
mod store;

use thiserror::Error;

pub use apply::{load_into, snapshot, LoadReport, RejectedRecord};
pub use command::{CommandTarget, MetaCommand, PadCommand, StickAxis};
pub use parse::{parse_settings, to_yaml};
pub use record::{BindingRecord, EffectRecord};
pub use settings::{
    DeviceSettings, GeneralSettings, PadType, PortSettings, Settings, SlotSettings,
    SETTINGS_VERSION,
};
pub use store::SettingsStore;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),
    #[error("environment variable not set: {0}")]
    EnvVarNotSet(String),
    #[error("path is not a directory: {0}")]
    PathIsNotDirectory(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single binding record was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid number in {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("unknown command: {0:#04x}")]
    UnknownCommand(i64),
    #[error("port out of range: {0}")]
    PortOutOfRange(i64),
    #[error("slot out of range: {0}")]
    SlotOutOfRange(i64),
    #[error("motor out of range: {0}")]
    MotorOutOfRange(i64),
    #[error("binding rejected by device")]
    Rejected,
}
