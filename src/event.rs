//! Events and logical codes.
//!
//! Every backend reports input as a canonical [`Event`]: a device id, an
//! [`EventKind`] and a wall-clock timestamp in milliseconds.
//!
//! ## Value conventions
//! - **Axes:** normalized to `[-1.0, 1.0]`.
//! - **Buttons:** press/release edges; pressed carries `1.0`, released `0.0`.
//! - **Analog buttons (triggers):** [`EventKind::ButtonChanged`] in `[0.0, 1.0]`.
//! - **Hats (D-pad):** decoded into two axes (`x`, `y`) each in `{-1, 0, 1}`.
//!   The hat Y axis is reported **pre-inversion** (up = `-1`); flipping it is the
//!   consumer's job.
//!
//! ## Codes
//! Codes are backend-stable integers. evdev and XInput use the logical tables in
//! [`codes`] (buttons `0..`, axes `100..`). The IOKit HID backend reports the raw
//! `(usage_page << 16) | usage` of the originating element, see [`hid_code`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable per-backend device identifier.
///
/// evdev and IOKit allocate ids from a monotonically increasing counter
/// starting at `0`; XInput uses the controller slot `0..4` directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GamepadId(pub u32);

impl fmt::Display for GamepadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for GamepadId {
    fn from(v: u32) -> Self {
        GamepadId(v)
    }
}

/// What happened on a device.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EventKind {
    /// Device appeared and is ready for queries.
    Connected,
    /// Device went away; its id is no longer valid for queries.
    Disconnected,
    /// Digital button went down.
    ButtonPressed { code: u32 },
    /// Digital button went up.
    ButtonReleased { code: u32 },
    /// Analog button (trigger) moved; `value` in `[0, 1]`.
    ButtonChanged { code: u32, value: f64 },
    /// Axis moved; `value` in `[-1, 1]`.
    AxisChanged { code: u32, value: f64 },
}

impl EventKind {
    /// Wire tag used by the binary codec.
    pub fn tag(&self) -> u32 {
        match self {
            EventKind::Connected => tags::CONNECTED,
            EventKind::Disconnected => tags::DISCONNECTED,
            EventKind::ButtonPressed { .. } => tags::BUTTON_PRESSED,
            EventKind::ButtonReleased { .. } => tags::BUTTON_RELEASED,
            EventKind::AxisChanged { .. } => tags::AXIS_CHANGED,
            EventKind::ButtonChanged { .. } => tags::BUTTON_CHANGED,
        }
    }

    /// Code of the control that changed (`0` for connection events).
    pub fn code(&self) -> u32 {
        match *self {
            EventKind::Connected | EventKind::Disconnected => 0,
            EventKind::ButtonPressed { code }
            | EventKind::ButtonReleased { code }
            | EventKind::ButtonChanged { code, .. }
            | EventKind::AxisChanged { code, .. } => code,
        }
    }

    /// Normalized value carried by the event.
    pub fn value(&self) -> f64 {
        match *self {
            EventKind::ButtonPressed { .. } => 1.0,
            EventKind::ButtonChanged { value, .. } | EventKind::AxisChanged { value, .. } => value,
            _ => 0.0,
        }
    }
}

/// Timestamped event popped from a backend's queue.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Event {
    pub id: GamepadId,
    pub kind: EventKind,
    /// Milliseconds since the Unix epoch.
    pub time_ms: i64,
}

impl Event {
    pub fn new(id: GamepadId, kind: EventKind, time_ms: i64) -> Self {
        Self { id, kind, time_ms }
    }

    /// Button edge helper: `pressed` picks between the two edge kinds.
    pub fn button(id: GamepadId, code: u32, pressed: bool, time_ms: i64) -> Self {
        let kind = if pressed {
            EventKind::ButtonPressed { code }
        } else {
            EventKind::ButtonReleased { code }
        };
        Self::new(id, kind, time_ms)
    }

    pub fn axis(id: GamepadId, code: u32, value: f64, time_ms: i64) -> Self {
        Self::new(id, EventKind::AxisChanged { code, value }, time_ms)
    }
}

/// Wire tags for [`EventKind`].
pub mod tags {
    pub const CONNECTED: u32 = 0;
    pub const DISCONNECTED: u32 = 1;
    pub const BUTTON_PRESSED: u32 = 2;
    pub const BUTTON_RELEASED: u32 = 3;
    pub const AXIS_CHANGED: u32 = 4;
    pub const BUTTON_CHANGED: u32 = 5;
}

/// Logical codes shared by the evdev and XInput backends.
pub mod codes {
    pub const BTN_SOUTH: u32 = 0;
    pub const BTN_EAST: u32 = 1;
    pub const BTN_C: u32 = 2;
    pub const BTN_NORTH: u32 = 3;
    pub const BTN_WEST: u32 = 4;
    pub const BTN_Z: u32 = 5;
    pub const BTN_LT: u32 = 6;
    pub const BTN_RT: u32 = 7;
    pub const BTN_LT2: u32 = 8;
    pub const BTN_RT2: u32 = 9;
    pub const BTN_SELECT: u32 = 10;
    pub const BTN_START: u32 = 11;
    pub const BTN_MODE: u32 = 12;
    pub const BTN_LTHUMB: u32 = 13;
    pub const BTN_RTHUMB: u32 = 14;
    pub const BTN_DPAD_UP: u32 = 15;
    pub const BTN_DPAD_DOWN: u32 = 16;
    pub const BTN_DPAD_LEFT: u32 = 17;
    pub const BTN_DPAD_RIGHT: u32 = 18;

    pub const AXIS_LSTICKX: u32 = 100;
    pub const AXIS_LSTICKY: u32 = 101;
    pub const AXIS_LEFTZ: u32 = 102;
    pub const AXIS_RSTICKX: u32 = 103;
    pub const AXIS_RSTICKY: u32 = 104;
    pub const AXIS_RIGHTZ: u32 = 105;
    pub const AXIS_DPADX: u32 = 106;
    pub const AXIS_DPADY: u32 = 107;

    /// `true` for codes in the axis space.
    pub fn is_axis(code: u32) -> bool {
        code >= AXIS_LSTICKX
    }
}

/// Raw IOKit HID code: `(usage_page << 16) | usage`.
#[inline]
pub fn hid_code(usage_page: u32, usage: u32) -> u32 {
    (usage_page << 16) | (usage & 0xFFFF)
}

/// Wall-clock milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
