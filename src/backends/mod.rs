//! Platform backends.
//!
//! Exactly one [`Backend`] is chosen per [`Gamepads`](crate::Gamepads) handle:
//! - **Linux**: evdev nodes under [`BackendConfig::input_dir`].
//! - **Windows**: XInput slots, library resolved at runtime.
//! - **macOS**: IOKit HID manager on a background run-loop thread.
//! - anything else: [`NullBackend`].
//!
//! The protocol decoders in [`evdev`], [`xinput`] and [`hid`] build on every
//! target; only their `sys` bindings are platform gated.

use crate::config::BackendConfig;
use crate::device::Backend;

pub mod evdev;
pub mod hid;
#[cfg(target_os = "macos")]
#[cfg_attr(docsrs, doc(cfg(target_os = "macos")))]
pub mod macos;
pub mod null;
pub mod xinput;

pub use null::NullBackend;

/// Open the native backend for this target.
///
/// A backend that fails to start degrades to [`NullBackend`]; the failure is
/// logged, not returned.
pub fn open_native(config: &BackendConfig) -> Box<dyn Backend> {
    #[cfg(target_os = "linux")]
    {
        Box::new(evdev::open(config))
    }

    #[cfg(target_os = "windows")]
    {
        match xinput::open(config) {
            Ok(b) => Box::new(b),
            Err(e) => {
                tracing::warn!(error = %e, "xinput unavailable, no gamepads will be reported");
                Box::new(NullBackend::new())
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        match macos::open(config) {
            Ok(b) => Box::new(b),
            Err(e) => {
                tracing::warn!(error = %e, "iokit unavailable, no gamepads will be reported");
                Box::new(NullBackend::new())
            }
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        let _ = config;
        Box::new(NullBackend::new())
    }
}
