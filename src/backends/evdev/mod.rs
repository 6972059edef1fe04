//! evdev backend.
//!
//! The decoder (`decoder.rs`) only talks to the kernel through the
//! [`NodeSource`] / [`EvdevNode`] traits, so it is exercised on every host with
//! in-memory nodes. `sys.rs` is the real `/dev/input` implementation.

pub mod caps;
pub mod codes;
mod decoder;
pub mod node;
#[cfg(target_os = "linux")]
pub mod sys;

pub use caps::{BitSet, Capabilities};
pub use decoder::{EvdevBackend, DEFAULT_CAPACITY};
pub use node::{EvdevNode, NodeSource, RawInputEvent, ReadStatus, Readiness, RumbleEffect};

#[cfg(target_os = "linux")]
pub fn open(config: &crate::config::BackendConfig) -> EvdevBackend<sys::LinuxNodeSource> {
    EvdevBackend::new(sys::LinuxNodeSource::new(config.input_dir.clone()), config)
}
