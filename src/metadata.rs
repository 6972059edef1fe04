//! Gamepad identity snapshot.
//!
//! [`GamepadInfo`] is a lightweight, cloneable description of a connected
//! gamepad suitable for UI display, logging and persistence. Backends fill it in
//! once at connect time.
//!
//! # Conventions
//! - `uuid` is the 32-hex fingerprint from [`identity`](crate::identity); mapping
//!   databases key layouts by it.
//! - `path` is a platform hint (`/dev/input/event7`, `xinput:2`, `iokit:0x14200000`)
//!   useful for diagnostics. Treat it as opaque.
//!
//! # Example
//! ```no_run
//! use padstream::Gamepads;
//!
//! let mut pads = Gamepads::new();
//! pads.poll();
//! for info in pads.gamepads() {
//!     println!("{} {} ({:04x}:{:04x})", info.id, info.name, info.vendor_id, info.product_id);
//! }
//! ```

use crate::event::GamepadId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamepadInfo {
    pub id: GamepadId,

    /// Product name reported by the driver, or a synthesized label.
    pub name: String,

    /// 32-character lowercase hex fingerprint.
    pub uuid: String,

    /// USB vendor id (`0` if unknown).
    pub vendor_id: u16,

    /// USB product id (`0` if unknown).
    pub product_id: u16,

    /// Whether [`set_rumble`](crate::Gamepads::set_rumble) can do anything.
    pub force_feedback: bool,

    /// Opaque platform location hint.
    pub path: Option<String>,
}
