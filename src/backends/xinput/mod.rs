//! XInput backend.
//!
//! XInput exposes up to four controllers as fixed slots `0..4`. The slot index
//! doubles as the [`GamepadId`](crate::GamepadId); there is no other identity
//! (every slot reports the nil fingerprint and zero vendor/product).
//!
//! The decoder is written against [`XInputApi`] so the diffing logic runs on
//! any host. `sys.rs` resolves the real library at runtime, trying each name in
//! [`BackendConfig::xinput_libraries`](crate::BackendConfig) in order.

mod decoder;
#[cfg(target_os = "windows")]
pub mod sys;

pub use decoder::XInputBackend;

/// Hardware slot count.
pub const SLOT_COUNT: usize = 4;

/// `wButtons` bit masks.
pub mod buttons {
    pub const DPAD_UP: u16 = 0x0001;
    pub const DPAD_DOWN: u16 = 0x0002;
    pub const DPAD_LEFT: u16 = 0x0004;
    pub const DPAD_RIGHT: u16 = 0x0008;
    pub const START: u16 = 0x0010;
    pub const BACK: u16 = 0x0020;
    pub const LEFT_THUMB: u16 = 0x0040;
    pub const RIGHT_THUMB: u16 = 0x0080;
    pub const LEFT_SHOULDER: u16 = 0x0100;
    pub const RIGHT_SHOULDER: u16 = 0x0200;
    pub const A: u16 = 0x1000;
    pub const B: u16 = 0x2000;
    pub const X: u16 = 0x4000;
    pub const Y: u16 = 0x8000;
}

/// One `XINPUT_STATE` sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct XState {
    pub packet: u32,
    pub buttons: u16,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub lx: i16,
    pub ly: i16,
    pub rx: i16,
    pub ry: i16,
}

/// The two XInput entry points the backend needs.
pub trait XInputApi: Send {
    /// `XInputGetState`; `None` when the slot is empty.
    fn get_state(&mut self, slot: u32) -> Option<XState>;

    /// `XInputSetState`; `false` on failure or when unavailable.
    fn set_vibration(&mut self, slot: u32, left: u16, right: u16) -> bool;

    /// Whether `XInputSetState` was resolved.
    fn supports_vibration(&self) -> bool;
}

#[cfg(target_os = "windows")]
pub fn open(config: &crate::config::BackendConfig) -> crate::Result<XInputBackend<sys::XInputLibrary>> {
    let lib = sys::XInputLibrary::load(&config.xinput_libraries)?;
    Ok(XInputBackend::new(lib, config))
}
