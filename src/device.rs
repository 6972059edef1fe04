//! The backend abstraction.
//!
//! One [`Backend`] exists per [`Gamepads`](crate::Gamepads) handle, picked once
//! at construction. Every query is best-effort: an unknown or disconnected id
//! yields `None` / an empty list / `false`, never an error.

use crate::event::{Event, GamepadId};
use crate::metadata::GamepadInfo;
use serde::{Deserialize, Serialize};

/// Logical range of an axis, in raw device units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisInfo {
    pub min: i32,
    pub max: i32,
}

pub trait Backend: Send {
    /// Short name for logs (`"evdev"`, `"xinput"`, `"iokit"`, `"null"`).
    fn name(&self) -> &'static str;

    /// Run one non-blocking decode pass.
    fn poll(&mut self);

    /// Decode until at least one event is queued or the timeout elapses.
    ///
    /// `timeout_ms < 0` blocks indefinitely, `0` behaves like [`poll`](Self::poll).
    /// Returns `true` if events are available.
    fn poll_timeout(&mut self, timeout_ms: i32) -> bool;

    /// Pop the oldest queued event.
    fn next_event(&mut self) -> Option<Event>;

    /// Pop the oldest event, decoding for up to `timeout_ms` if none is queued.
    fn next_event_timeout(&mut self, timeout_ms: i32) -> Option<Event> {
        if let Some(ev) = self.next_event() {
            return Some(ev);
        }
        if self.poll_timeout(timeout_ms) {
            self.next_event()
        } else {
            None
        }
    }

    /// Number of currently connected gamepads.
    fn gamepad_count(&self) -> usize;

    /// Ids of currently connected gamepads, ascending.
    fn gamepad_ids(&self) -> Vec<GamepadId>;

    fn info(&self, id: GamepadId) -> Option<GamepadInfo>;

    /// Axis codes exposed by `id`, in stable order.
    fn axes(&self, id: GamepadId) -> Vec<u32>;

    /// Button codes exposed by `id`, in stable order.
    fn buttons(&self, id: GamepadId) -> Vec<u32>;

    fn axis_info(&self, id: GamepadId, code: u32) -> Option<AxisInfo>;

    /// Start (or stop) rumble. Amplitudes are `[0, 1]`; a non-positive duration or
    /// zero amplitudes stop any running effect.
    fn set_rumble(&mut self, id: GamepadId, strong: f32, weak: f32, duration_ms: i32) -> bool;
}

/// Rumble request after clamping and conversion to motor magnitudes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RumbleRequest {
    Stop,
    Play {
        strong: u16,
        weak: u16,
        duration_ms: u32,
    },
}

impl RumbleRequest {
    pub(crate) fn new(strong: f32, weak: f32, duration_ms: i32) -> Self {
        let strong = magnitude(strong);
        let weak = magnitude(weak);
        if duration_ms <= 0 || (strong == 0 && weak == 0) {
            return RumbleRequest::Stop;
        }
        RumbleRequest::Play {
            strong,
            weak,
            duration_ms: duration_ms.unsigned_abs(),
        }
    }
}

/// `[0, 1]` amplitude to a 16-bit motor magnitude. NaN counts as zero.
pub(crate) fn magnitude(amplitude: f32) -> u16 {
    if amplitude.is_nan() {
        return 0;
    }
    (amplitude.clamp(0.0, 1.0) * f32::from(u16::MAX)).round() as u16
}
