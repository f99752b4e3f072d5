//! TOML configuration plumbing shared by the tagdrive crates.
//!
//! Any `Deserialize` type can be read with [`ConfigLoader::load`]. Range and
//! consistency checks are separate: each section exposes a `validate()` that
//! fails with [`ConfigError::ValidationError`].
//!
//! ```rust,no_run
//! use serde::Deserialize;
//! use std::path::Path;
//! use tagdrive_common::config::{ConfigError, ConfigLoader, SharedConfig};
//!
//! #[derive(Debug, Deserialize)]
//! struct Probe {
//!     shared: SharedConfig,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let probe = Probe::load(Path::new("probe.toml"))?;
//!     probe.shared.validate()?;
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Why a configuration could not be turned into a running controller.
///
/// Never raised once the loop is running.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The path did not point at a file.
    #[error("no config file at {0}")]
    FileNotFound(String),

    /// Unreadable file, bad TOML, or an unknown tag such as an unsupported
    /// `controller_type`.
    #[error("config parse error: {0}")]
    ParseError(String),

    /// Parsed fine but a value is out of range or inconsistent.
    #[error("invalid config: {0}")]
    ValidationError(String),
}

/// `tracing` verbosity selected from `[shared].log_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-cycle detail.
    Trace,
    /// Behavior transitions and tunable edits.
    Debug,
    #[default]
    Info,
    /// Range violations and overruns.
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// `[shared]` section read by every tagdrive binary.
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "tagdrive-pancake"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Name used in log output to tell robots apart.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: "tagdrive".to_string(),
        }
    }
}

impl SharedConfig {
    /// Rejects an empty `service_name`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "shared.service_name must name the robot".into(),
            ));
        }
        Ok(())
    }
}

/// Reads a TOML document into any owned `Deserialize` type.
///
/// A missing path maps to [`ConfigError::FileNotFound`]; every other read or
/// decode failure maps to [`ConfigError::ParseError`].
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ConfigError::FileNotFound(path.display().to_string()))
            }
            Err(err) => Err(ConfigError::ParseError(format!("{}: {err}", path.display()))),
        }
    }

    fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::ParseError(err.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
