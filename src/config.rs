//! Backend configuration.
//!
//! [`BackendConfig`] is a plain serde struct so hosts can keep it in a TOML file
//! next to their other settings. Every field has a default; an empty document is
//! a valid config.
//!
//! ```
//! use padstream::BackendConfig;
//!
//! let cfg = BackendConfig::from_toml_str("queue_capacity = 256\nmax_gamepads = 8").unwrap();
//! assert_eq!(cfg.queue_capacity, 256);
//! assert_eq!(cfg.max_gamepads, Some(8));
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default capacity of the event ring buffer.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Ring buffer capacity. On overflow the oldest event is dropped.
    pub queue_capacity: usize,

    /// Overrides the per-platform device capacity (IOKit 32, evdev 64, XInput 4).
    ///
    /// XInput never exceeds its 4 hardware slots.
    pub max_gamepads: Option<usize>,

    /// evdev scan root.
    pub input_dir: PathBuf,

    /// Sleep quantum for the XInput blocking poll loop.
    pub poll_quantum_ms: u64,

    /// How often a blocking evdev poll re-enters the scan for hotplugged nodes.
    pub rescan_interval_ms: u64,

    /// Negate Y / Ry axes in the IOKit HID backend.
    pub invert_y_axes: bool,

    /// XInput libraries, tried in order.
    pub xinput_libraries: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_gamepads: None,
            input_dir: PathBuf::from("/dev/input"),
            poll_quantum_ms: 8,
            rescan_interval_ms: 250,
            invert_y_axes: false,
            xinput_libraries: vec![
                "xinput1_4.dll".into(),
                "xinput9_1_0.dll".into(),
                "xinput1_3.dll".into(),
            ],
        }
    }
}

impl BackendConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(Error::InvalidConfig {
                field: "queue_capacity",
                reason: "must be at least 1".into(),
            });
        }
        if self.max_gamepads == Some(0) {
            return Err(Error::InvalidConfig {
                field: "max_gamepads",
                reason: "must be at least 1".into(),
            });
        }
        if self.poll_quantum_ms == 0 {
            return Err(Error::InvalidConfig {
                field: "poll_quantum_ms",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Device capacity for a backend whose native default is `platform_default`.
    pub fn capacity_or(&self, platform_default: usize) -> usize {
        self.max_gamepads.unwrap_or(platform_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = BackendConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, BackendConfig::default());
        assert_eq!(cfg.queue_capacity, 1024);
        assert_eq!(
            cfg.xinput_libraries,
            ["xinput1_4.dll", "xinput9_1_0.dll", "xinput1_3.dll"]
        );
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = BackendConfig::from_toml_str("queue_capacity = 0").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { field: "queue_capacity", .. }));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = BackendConfig::from_toml_str("queue_capacity = \"lots\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pads.toml");
        std::fs::write(&path, "input_dir = \"/tmp/input\"\ninvert_y_axes = true\n").unwrap();
        let cfg = BackendConfig::load(&path).unwrap();
        assert_eq!(cfg.input_dir, PathBuf::from("/tmp/input"));
        assert!(cfg.invert_y_axes);
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = BackendConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }
}
