//! # padstream
//!
//! Native gamepad input for Linux (evdev), Windows (XInput) and macOS (IOKit
//! HID), decoded into one canonical event stream.
//!
//! - [`Gamepads`] is the handle applications hold.
//! - [`Event`] / [`EventKind`] is what it produces; [`codec`] turns events into
//!   fixed 32-byte records for hosts on the other side of an FFI boundary.
//! - [`BackendConfig`] tunes queue size, device capacity and platform knobs, and
//!   loads from TOML.
//!
//! Logging goes through [`tracing`]; install a subscriber to see device
//! connect/disconnect and decode diagnostics.

pub mod backends;
pub mod codec;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod identity;
pub mod manager;
pub mod metadata;
pub mod queue;
pub mod registry;

pub use config::BackendConfig;
pub use device::{AxisInfo, Backend};
pub use error::{Error, Result};
pub use event::{codes, hid_code, tags, Event, EventKind, GamepadId};
pub use manager::Gamepads;
pub use metadata::GamepadInfo;
