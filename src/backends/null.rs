//! Backend for targets without native gamepad support.
//!
//! Enumerates nothing and answers every query with "absent". It is also the
//! fallback when a native backend cannot start (missing XInput library, HID
//! manager failure).

use crate::device::{AxisInfo, Backend};
use crate::event::{Event, GamepadId};
use crate::metadata::GamepadInfo;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct NullBackend;

impl NullBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for NullBackend {
    fn name(&self) -> &'static str {
        "null"
    }

    fn poll(&mut self) {}

    /// Sleeps out a positive timeout so callers polling in a loop do not spin.
    /// A negative timeout never returns: nothing can ever arrive.
    fn poll_timeout(&mut self, timeout_ms: i32) -> bool {
        if timeout_ms < 0 {
            loop {
                std::thread::park();
            }
        }
        if timeout_ms > 0 {
            std::thread::sleep(Duration::from_millis(u64::from(timeout_ms.unsigned_abs())));
        }
        false
    }

    fn next_event(&mut self) -> Option<Event> {
        None
    }

    fn gamepad_count(&self) -> usize {
        0
    }

    fn gamepad_ids(&self) -> Vec<GamepadId> {
        Vec::new()
    }

    fn info(&self, _id: GamepadId) -> Option<GamepadInfo> {
        None
    }

    fn axes(&self, _id: GamepadId) -> Vec<u32> {
        Vec::new()
    }

    fn buttons(&self, _id: GamepadId) -> Vec<u32> {
        Vec::new()
    }

    fn axis_info(&self, _id: GamepadId, _code: u32) -> Option<AxisInfo> {
        None
    }

    fn set_rumble(&mut self, _id: GamepadId, _strong: f32, _weak: f32, _duration_ms: i32) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_is_absent() {
        let mut b = NullBackend::new();
        b.poll();
        assert!(!b.poll_timeout(0));
        assert_eq!(b.gamepad_count(), 0);
        assert!(b.next_event().is_none());
        assert!(b.next_event_timeout(0).is_none());
        assert!(b.info(GamepadId(0)).is_none());
        assert!(!b.set_rumble(GamepadId(0), 1.0, 1.0, 100));
    }

    #[test]
    fn negative_timeout_blocks() {
        let waiter = std::thread::spawn(|| NullBackend::new().next_event_timeout(-1));
        std::thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished());
    }
}
