//! Crate error type.
//!
//! Public backend operations never surface these directly: discovery and I/O
//! failures degrade to "absent" / `false` and are logged. `Error` is what the
//! platform helpers return internally, and what configuration loading returns to
//! the caller.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to read config {path}: {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid config value `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("{0} is not supported on this device")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
