use thiserror::Error;

/// Failure reported by a device backend.
///
/// These never escape a [`Device`](crate::Device): activation and polling
/// failures are logged and surfaced as `false`.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The hardware is held exclusively by someone else.
    #[error("device busy: {0}")]
    Busy(String),
    /// Missing permissions, driver or API for this device.
    #[error("device unavailable: {0}")]
    Unavailable(String),
    /// The device went away in the middle of a session.
    #[error("device disconnected")]
    Disconnected,
    /// Operation is not supported by this backend.
    #[error("operation unsupported")]
    Unsupported,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A generic backend error.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Convenient result alias for backend operations.
pub type Result<T> = std::result::Result<T, DeviceError>;
