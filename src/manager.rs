//! The consumer-facing handle.
//!
//! [`Gamepads`] owns one [`Backend`] for its whole life. Construct it, call
//! [`poll`](Gamepads::poll) (or a blocking variant) once per frame, then drain
//! events with [`next_event`](Gamepads::next_event).
//!
//! ```no_run
//! use padstream::{EventKind, Gamepads};
//!
//! let mut pads = Gamepads::new();
//! loop {
//!     pads.poll_timeout(16);
//!     while let Some(ev) = pads.next_event() {
//!         match ev.kind {
//!             EventKind::Connected => println!("{} connected: {:?}", ev.id, pads.name(ev.id)),
//!             EventKind::ButtonPressed { code } => println!("{} pressed {code}", ev.id),
//!             _ => {}
//!         }
//!     }
//! }
//! ```

use crate::backends;
use crate::codec;
use crate::config::BackendConfig;
use crate::device::{AxisInfo, Backend};
use crate::error::Result;
use crate::event::{Event, GamepadId};
use crate::metadata::GamepadInfo;

pub struct Gamepads {
    backend: Box<dyn Backend>,
}

impl Gamepads {
    /// Open the native backend with default settings.
    ///
    /// Never fails; a platform that cannot start its backend reports no gamepads.
    pub fn new() -> Self {
        Self::with_backend(backends::open_native(&BackendConfig::default()))
    }

    /// Open the native backend with `config`, after validating it.
    pub fn with_config(config: &BackendConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_backend(backends::open_native(config)))
    }

    /// Wrap an already constructed backend.
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        tracing::debug!(backend = backend.name(), "gamepad backend ready");
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// One non-blocking decode pass.
    pub fn poll(&mut self) {
        self.backend.poll();
    }

    /// Decode until an event is queued or `timeout_ms` elapses (`< 0` waits forever).
    pub fn poll_timeout(&mut self, timeout_ms: i32) -> bool {
        self.backend.poll_timeout(timeout_ms)
    }

    pub fn next_event(&mut self) -> Option<Event> {
        self.backend.next_event()
    }

    pub fn next_event_timeout(&mut self, timeout_ms: i32) -> Option<Event> {
        self.backend.next_event_timeout(timeout_ms)
    }

    /// Pop the next event as a 32-byte record; empty when none is queued.
    pub fn next_event_bytes(&mut self) -> Vec<u8> {
        codec::encode_event(self.backend.next_event().as_ref())
    }

    pub fn gamepad_count(&self) -> usize {
        self.backend.gamepad_count()
    }

    /// Snapshots of every connected gamepad, by ascending id.
    pub fn gamepads(&self) -> Vec<GamepadInfo> {
        self.backend
            .gamepad_ids()
            .into_iter()
            .filter_map(|id| self.backend.info(id))
            .collect()
    }

    pub fn info(&self, id: GamepadId) -> Option<GamepadInfo> {
        self.backend.info(id)
    }

    pub fn name(&self, id: GamepadId) -> Option<String> {
        self.backend.info(id).map(|i| i.name)
    }

    pub fn uuid(&self, id: GamepadId) -> Option<String> {
        self.backend.info(id).map(|i| i.uuid)
    }

    /// `0` for an unknown id.
    pub fn vendor_id(&self, id: GamepadId) -> u16 {
        self.backend.info(id).map_or(0, |i| i.vendor_id)
    }

    /// `0` for an unknown id.
    pub fn product_id(&self, id: GamepadId) -> u16 {
        self.backend.info(id).map_or(0, |i| i.product_id)
    }

    pub fn is_force_feedback_supported(&self, id: GamepadId) -> bool {
        self.backend.info(id).is_some_and(|i| i.force_feedback)
    }

    pub fn axes(&self, id: GamepadId) -> Vec<u32> {
        self.backend.axes(id)
    }

    pub fn buttons(&self, id: GamepadId) -> Vec<u32> {
        self.backend.buttons(id)
    }

    pub fn axis_info(&self, id: GamepadId, code: u32) -> Option<AxisInfo> {
        self.backend.axis_info(id, code)
    }

    /// Start rumble on `id`; amplitudes in `[0, 1]`. A non-positive duration stops it.
    pub fn set_rumble(&mut self, id: GamepadId, strong: f32, weak: f32, duration_ms: i32) -> bool {
        self.backend.set_rumble(id, strong, weak, duration_ms)
    }
}

impl Default for Gamepads {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Gamepads {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gamepads")
            .field("backend", &self.backend.name())
            .field("gamepads", &self.backend.gamepad_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::NullBackend;
    use crate::error::Error;
    use crate::event::EventKind;
    use std::collections::VecDeque;

    /// One fixed pad and a scripted event list.
    struct Scripted {
        events: VecDeque<Event>,
        rumbles: Vec<(u32, f32, f32, i32)>,
    }

    impl Backend for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }
        fn poll(&mut self) {}
        fn poll_timeout(&mut self, _timeout_ms: i32) -> bool {
            !self.events.is_empty()
        }
        fn next_event(&mut self) -> Option<Event> {
            self.events.pop_front()
        }
        fn gamepad_count(&self) -> usize {
            1
        }
        fn gamepad_ids(&self) -> Vec<GamepadId> {
            vec![GamepadId(3)]
        }
        fn info(&self, id: GamepadId) -> Option<GamepadInfo> {
            (id == GamepadId(3)).then(|| GamepadInfo {
                id,
                name: "Pad".into(),
                uuid: "03000000".to_string() + &"0".repeat(24),
                vendor_id: 0x045e,
                product_id: 0x028e,
                force_feedback: true,
                path: None,
            })
        }
        fn axes(&self, _id: GamepadId) -> Vec<u32> {
            vec![100, 101]
        }
        fn buttons(&self, _id: GamepadId) -> Vec<u32> {
            vec![0]
        }
        fn axis_info(&self, _id: GamepadId, code: u32) -> Option<AxisInfo> {
            (code == 100).then_some(AxisInfo { min: -1, max: 1 })
        }
        fn set_rumble(&mut self, id: GamepadId, strong: f32, weak: f32, duration_ms: i32) -> bool {
            self.rumbles.push((id.0, strong, weak, duration_ms));
            true
        }
    }

    fn scripted() -> Gamepads {
        Gamepads::with_backend(Box::new(Scripted {
            events: VecDeque::from([
                Event::new(GamepadId(3), EventKind::Connected, 10),
                Event::button(GamepadId(3), 0, true, 11),
            ]),
            rumbles: Vec::new(),
        }))
    }

    #[test]
    fn identity_queries_go_through_info() {
        let pads = scripted();
        assert_eq!(pads.backend_name(), "scripted");
        assert_eq!(pads.name(GamepadId(3)).as_deref(), Some("Pad"));
        assert_eq!(pads.vendor_id(GamepadId(3)), 0x045e);
        assert_eq!(pads.product_id(GamepadId(3)), 0x028e);
        assert!(pads.is_force_feedback_supported(GamepadId(3)));
        assert_eq!(pads.vendor_id(GamepadId(9)), 0);
        assert!(pads.uuid(GamepadId(9)).is_none());
        assert_eq!(pads.gamepads().len(), 1);
    }

    #[test]
    fn events_drain_in_order_then_bytes_go_empty() {
        let mut pads = scripted();
        assert_eq!(pads.next_event().map(|e| e.kind), Some(EventKind::Connected));
        let bytes = pads.next_event_bytes();
        assert_eq!(bytes.len(), codec::EVENT_RECORD_LEN);
        let ev = codec::decode_event(&bytes).unwrap();
        assert_eq!(ev.kind, EventKind::ButtonPressed { code: 0 });
        assert!(pads.next_event_bytes().is_empty());
        assert!(pads.next_event_timeout(0).is_none());
    }

    #[test]
    fn rumble_is_forwarded() {
        let mut pads = scripted();
        assert!(pads.set_rumble(GamepadId(3), 0.5, 0.25, 200));
        assert_eq!(pads.axis_info(GamepadId(3), 100), Some(AxisInfo { min: -1, max: 1 }));
        assert_eq!(pads.axis_info(GamepadId(3), 999), None);
    }

    #[test]
    fn with_config_rejects_invalid_settings() {
        let cfg = BackendConfig {
            queue_capacity: 0,
            ..BackendConfig::default()
        };
        assert!(matches!(
            Gamepads::with_config(&cfg),
            Err(Error::InvalidConfig { field: "queue_capacity", .. })
        ));
    }

    #[test]
    fn null_backend_reports_nothing() {
        let mut pads = Gamepads::with_backend(Box::new(NullBackend::new()));
        pads.poll();
        assert_eq!(pads.gamepad_count(), 0);
        assert!(pads.gamepads().is_empty());
        assert!(!pads.set_rumble(GamepadId(0), 1.0, 1.0, 100));
        assert!(pads.next_event_bytes().is_empty());
    }
}
