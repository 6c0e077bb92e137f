//! Shared ambient concerns for quire binaries: configuration, diagnostics
//! and tracing setup.

pub mod config;
pub mod error;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use config::{Config, DisplaySettings, EditorSettings, FileStore, Loader, Saver};
pub use error::{ParseError, QuireError, SerDeError};
