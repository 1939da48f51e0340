//! Pad emulation on top of `padweave-device`: per-frame aggregation of
//! bindings into console pad state, the console report format, and the
//! session that keeps the device set in sync with hot-plug events.

pub mod app;
pub mod logging;
pub mod session;

pub use session::{Enumerator, InputSession, SessionError};
