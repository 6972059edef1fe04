//! evdev constants and logical-code tables.
//!
//! Values mirror `linux/input-event-codes.h`. They are plain integers so the
//! decoder builds on every host.

use crate::event::codes;

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_ABS: u16 = 0x03;
pub const EV_FF: u16 = 0x15;
pub const EV_MAX: u16 = 0x1f;

pub const KEY_MAX: u16 = 0x2ff;
pub const ABS_MAX: u16 = 0x3f;
pub const FF_MAX: u16 = 0x7f;

pub const BTN_JOYSTICK: u16 = 0x120;
pub const BTN_GAMEPAD: u16 = 0x130;
pub const BTN_SOUTH: u16 = 0x130;
pub const BTN_EAST: u16 = 0x131;
pub const BTN_C: u16 = 0x132;
pub const BTN_NORTH: u16 = 0x133;
pub const BTN_WEST: u16 = 0x134;
pub const BTN_Z: u16 = 0x135;
pub const BTN_TL: u16 = 0x136;
pub const BTN_TR: u16 = 0x137;
pub const BTN_TL2: u16 = 0x138;
pub const BTN_TR2: u16 = 0x139;
pub const BTN_SELECT: u16 = 0x13a;
pub const BTN_START: u16 = 0x13b;
pub const BTN_MODE: u16 = 0x13c;
pub const BTN_THUMBL: u16 = 0x13d;
pub const BTN_THUMBR: u16 = 0x13e;
pub const BTN_DPAD_UP: u16 = 0x220;
pub const BTN_DPAD_DOWN: u16 = 0x221;
pub const BTN_DPAD_LEFT: u16 = 0x222;
pub const BTN_DPAD_RIGHT: u16 = 0x223;

pub const ABS_X: u16 = 0x00;
pub const ABS_Y: u16 = 0x01;
pub const ABS_Z: u16 = 0x02;
pub const ABS_RX: u16 = 0x03;
pub const ABS_RY: u16 = 0x04;
pub const ABS_RZ: u16 = 0x05;
pub const ABS_HAT0X: u16 = 0x10;
pub const ABS_HAT0Y: u16 = 0x11;

pub const FF_RUMBLE: u16 = 0x50;

/// `(evdev key code, logical button)` in logical order.
pub const BUTTON_MAP: &[(u16, u32)] = &[
    (BTN_SOUTH, codes::BTN_SOUTH),
    (BTN_EAST, codes::BTN_EAST),
    (BTN_C, codes::BTN_C),
    (BTN_NORTH, codes::BTN_NORTH),
    (BTN_WEST, codes::BTN_WEST),
    (BTN_Z, codes::BTN_Z),
    (BTN_TL, codes::BTN_LT),
    (BTN_TR, codes::BTN_RT),
    (BTN_TL2, codes::BTN_LT2),
    (BTN_TR2, codes::BTN_RT2),
    (BTN_SELECT, codes::BTN_SELECT),
    (BTN_START, codes::BTN_START),
    (BTN_MODE, codes::BTN_MODE),
    (BTN_THUMBL, codes::BTN_LTHUMB),
    (BTN_THUMBR, codes::BTN_RTHUMB),
    (BTN_DPAD_UP, codes::BTN_DPAD_UP),
    (BTN_DPAD_DOWN, codes::BTN_DPAD_DOWN),
    (BTN_DPAD_LEFT, codes::BTN_DPAD_LEFT),
    (BTN_DPAD_RIGHT, codes::BTN_DPAD_RIGHT),
];

/// `(evdev abs code, logical axis)` in logical order.
pub const AXIS_MAP: &[(u16, u32)] = &[
    (ABS_X, codes::AXIS_LSTICKX),
    (ABS_Y, codes::AXIS_LSTICKY),
    (ABS_Z, codes::AXIS_LEFTZ),
    (ABS_RX, codes::AXIS_RSTICKX),
    (ABS_RY, codes::AXIS_RSTICKY),
    (ABS_RZ, codes::AXIS_RIGHTZ),
    (ABS_HAT0X, codes::AXIS_DPADX),
    (ABS_HAT0Y, codes::AXIS_DPADY),
];

/// Key bits that mark a node as gamepad-class.
pub const GAMEPAD_KEYS: &[u16] = &[
    BTN_GAMEPAD,
    BTN_JOYSTICK,
    BTN_SOUTH,
    BTN_EAST,
    BTN_NORTH,
    BTN_WEST,
    BTN_TL,
    BTN_TR,
    BTN_START,
    BTN_SELECT,
    BTN_MODE,
    BTN_DPAD_UP,
    BTN_DPAD_DOWN,
    BTN_DPAD_LEFT,
    BTN_DPAD_RIGHT,
];

pub fn map_button(code: u16) -> Option<u32> {
    BUTTON_MAP
        .iter()
        .find(|&&(raw, _)| raw == code)
        .map(|&(_, logical)| logical)
}

pub fn map_axis(code: u16) -> Option<u32> {
    AXIS_MAP
        .iter()
        .find(|&&(raw, _)| raw == code)
        .map(|&(_, logical)| logical)
}

/// Logical axis back to its evdev abs code.
pub fn abs_for_axis(logical: u32) -> Option<u16> {
    AXIS_MAP
        .iter()
        .find(|&&(_, l)| l == logical)
        .map(|&(raw, _)| raw)
}

pub fn is_hat(code: u16) -> bool {
    matches!(code, ABS_HAT0X | ABS_HAT0Y)
}

/// Normalize an `EV_ABS` value.
///
/// Hats collapse to their sign. Everything else is treated as a centered
/// signed 16-bit axis.
pub fn normalize_abs(code: u16, value: i32) -> f64 {
    if is_hat(code) {
        return f64::from(value.signum());
    }
    let v = value.clamp(-32768, 32767);
    (f64::from(v) / 32767.0).clamp(-1.0, 1.0)
}
