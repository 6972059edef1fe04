//! Linux-style evdev decoding, hotplug and rumble.

use super::caps::Capabilities;
use super::codes::{self, EV_ABS, EV_KEY};
use super::node::{EvdevNode, NodeSource, RawInputEvent, ReadStatus, Readiness, RumbleEffect};
use crate::config::BackendConfig;
use crate::device::{AxisInfo, Backend, RumbleRequest};
use crate::event::{now_ms, Event, EventKind, GamepadId};
use crate::identity::UuidLayout;
use crate::metadata::GamepadInfo;
use crate::queue::EventQueue;
use crate::registry::{Registry, Slot};
use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Open node limit when the config does not override it.
pub const DEFAULT_CAPACITY: usize = 64;

/// Per-node state kept in the registry.
pub struct NodeState<N> {
    node: N,
    path: PathBuf,
    caps: Capabilities,
    force_feedback: bool,
    effect: Option<i16>,
    rumble_until: Option<i64>,
}

pub struct EvdevBackend<S: NodeSource> {
    source: S,
    registry: Registry<NodeState<S::Node>>,
    /// Paths probed and found not to be gamepads.
    rejected: HashSet<PathBuf>,
    queue: EventQueue,
    rescan_interval_ms: u64,
    scratch: Vec<RawInputEvent>,
}

impl<S: NodeSource> EvdevBackend<S> {
    /// Build a backend and run the initial scan.
    pub fn new(source: S, config: &BackendConfig) -> Self {
        let mut backend = Self {
            source,
            registry: Registry::with_capacity(config.capacity_or(DEFAULT_CAPACITY)),
            rejected: HashSet::new(),
            queue: EventQueue::with_capacity(config.queue_capacity),
            rescan_interval_ms: config.rescan_interval_ms.max(1),
            scratch: Vec::new(),
        };
        backend.scan(now_ms());
        backend
    }

    /// One full rescan/read pass with an explicit clock.
    ///
    /// Waits up to `timeout_ms` for input. Returns `true` if the queue is non-empty.
    pub fn cycle(&mut self, timeout_ms: i32, now: i64) -> bool {
        self.tick_rumble(now);
        self.scan(now);

        let ids: Vec<GamepadId> = self.registry.iter().map(Slot::id).collect();
        let nodes: Vec<&S::Node> = self.registry.iter().map(|s| &s.state.node).collect();
        let ready = match self.source.wait(&nodes, timeout_ms) {
            Ok(r) => r,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return !self.queue.is_empty(),
            Err(e) => {
                warn!(error = %e, "evdev: readiness wait failed");
                return !self.queue.is_empty();
            }
        };
        drop(nodes);

        for (id, readiness) in ids.into_iter().zip(ready) {
            match readiness {
                Readiness::Idle => {}
                Readiness::Readable => self.read_node(id, now),
                Readiness::Failed => {
                    debug!(%id, "evdev: node reported error/hangup");
                    self.disconnect(id, now);
                }
            }
        }
        !self.queue.is_empty()
    }

    /// Stop every effect whose expiry has passed. The kernel effect is kept for reuse.
    pub fn tick_rumble(&mut self, now: i64) {
        for slot in self.registry.iter_mut() {
            let st = &mut slot.state;
            let (Some(until), Some(effect)) = (st.rumble_until, st.effect) else {
                continue;
            };
            if now < until {
                continue;
            }
            st.rumble_until = None;
            if let Err(e) = st.node.play(effect, false) {
                warn!(id = %slot.info.id, error = %e, "evdev: failed to stop rumble");
            } else {
                debug!(id = %slot.info.id, "evdev: rumble expired");
            }
        }
    }

    /// Rumble with an explicit clock.
    pub fn rumble_at(
        &mut self,
        id: GamepadId,
        strong: f32,
        weak: f32,
        duration_ms: i32,
        now: i64,
    ) -> bool {
        let Some(slot) = self.registry.get_mut(id) else {
            return false;
        };
        if !slot.connected || !slot.state.force_feedback {
            return false;
        }
        let st = &mut slot.state;

        match RumbleRequest::new(strong, weak, duration_ms) {
            RumbleRequest::Stop => {
                st.rumble_until = None;
                if let Some(effect) = st.effect {
                    if let Err(e) = st.node.play(effect, false) {
                        warn!(%id, error = %e, "evdev: failed to stop rumble");
                        return false;
                    }
                }
                debug!(%id, "evdev: rumble stopped");
                true
            }
            RumbleRequest::Play {
                strong,
                weak,
                duration_ms,
            } => {
                // Free the previous effect before uploading its replacement.
                if let Some(old) = st.effect.take() {
                    if let Err(e) = st.node.erase(old) {
                        debug!(%id, error = %e, "evdev: failed to erase previous effect");
                    }
                }
                let effect = RumbleEffect {
                    strong,
                    weak,
                    duration_ms: u16::try_from(duration_ms).unwrap_or(u16::MAX),
                };
                st.rumble_until = None;
                let fx = match st.node.upload_rumble(effect) {
                    Ok(fx) => fx,
                    Err(e) => {
                        warn!(%id, error = %e, "evdev: rumble upload failed");
                        return false;
                    }
                };
                if let Err(e) = st.node.play(fx, true) {
                    warn!(%id, error = %e, "evdev: rumble play failed");
                    if let Err(e) = st.node.erase(fx) {
                        debug!(%id, error = %e, "evdev: failed to erase unplayed effect");
                    }
                    return false;
                }
                st.effect = Some(fx);
                st.rumble_until = Some(now + i64::from(duration_ms));
                debug!(%id, strong, weak, duration_ms, "evdev: rumble started");
                true
            }
        }
    }

    /// Open every new `event*` node and register the gamepads among them.
    fn scan(&mut self, now: i64) {
        let paths = match self.source.scan() {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "evdev: scan failed");
                return;
            }
        };

        let source = &self.source;
        self.rejected.retain(|p| source.exists(p));

        for path in paths {
            if self.registry.is_full() {
                break;
            }
            if self.rejected.contains(&path) || self.is_tracked(&path) {
                continue;
            }
            let mut node = match self.source.open(&path) {
                Ok(n) => n,
                Err(e) => {
                    trace!(path = %path.display(), error = %e, "evdev: cannot open node");
                    continue;
                }
            };
            let caps = match node.capabilities() {
                Ok(c) if c.is_gamepad() => c,
                Ok(_) => {
                    debug!(path = %path.display(), "evdev: not a gamepad");
                    self.rejected.insert(path);
                    continue;
                }
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "evdev: capability probe failed");
                    self.rejected.insert(path);
                    continue;
                }
            };
            self.admit(path, node, caps, now);
        }
    }

    fn admit(&mut self, path: PathBuf, mut node: S::Node, caps: Capabilities, now: i64) {
        let ids = node.ids().unwrap_or_default();
        let name = match node.name() {
            Ok(n) if !n.is_empty() => n,
            _ => format!("evdev {:04x}:{:04x}", ids.vendor, ids.product),
        };
        let force_feedback = caps.has_rumble() && node.writable();
        let uuid = ids.fingerprint(UuidLayout::Generic);
        let path_hint = path.display().to_string();

        let state = NodeState {
            node,
            path,
            caps,
            force_feedback,
            effect: None,
            rumble_until: None,
        };
        let Some(id) = self.registry.insert(
            |id| GamepadInfo {
                id,
                name,
                uuid,
                vendor_id: ids.vendor,
                product_id: ids.product,
                force_feedback,
                path: Some(path_hint),
            },
            state,
        ) else {
            return;
        };

        if let Some(slot) = self.registry.get(id) {
            info!(
                %id,
                name = %slot.info.name,
                vendor_id = slot.info.vendor_id,
                product_id = slot.info.product_id,
                path = %slot.state.path.display(),
                force_feedback,
                "gamepad connected"
            );
        }
        self.queue.push(Event::new(id, EventKind::Connected, now));
    }

    fn is_tracked(&self, path: &std::path::Path) -> bool {
        self.registry.iter().any(|s| s.state.path == path)
    }

    fn read_node(&mut self, id: GamepadId, now: i64) {
        let Some(slot) = self.registry.get_mut(id) else {
            return;
        };
        let mut raw = std::mem::take(&mut self.scratch);
        raw.clear();
        let status = slot.state.node.read_events(&mut raw);

        for ev in &raw {
            if let Some(out) = decode(id, *ev, now) {
                trace!(%id, kind = ev.kind, code = ev.code, value = ev.value, "evdev: sample");
                self.queue.push(out);
            }
        }
        self.scratch = raw;

        match status {
            Ok(ReadStatus::Drained) => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Ok(ReadStatus::Closed) => {
                debug!(%id, "evdev: end of file");
                self.disconnect(id, now);
            }
            Err(e) => {
                warn!(%id, error = %e, "evdev: read failed");
                self.disconnect(id, now);
            }
        }
    }

    fn disconnect(&mut self, id: GamepadId, now: i64) {
        let Some(slot) = self.registry.remove(id) else {
            return;
        };
        info!(%id, name = %slot.info.name, "gamepad disconnected");
        self.queue.push(Event::new(id, EventKind::Disconnected, now));
        release(slot);
    }

    fn caps(&self, id: GamepadId) -> Option<&Capabilities> {
        self.registry
            .get(id)
            .filter(|s| s.connected)
            .map(|s| &s.state.caps)
    }
}

/// Free the kernel effect; dropping the node closes it.
fn release<N: EvdevNode>(slot: Slot<NodeState<N>>) {
    let mut st = slot.state;
    if let Some(effect) = st.effect.take() {
        if st.rumble_until.is_some() {
            let _ = st.node.play(effect, false);
        }
        if let Err(e) = st.node.erase(effect) {
            debug!(id = %slot.info.id, error = %e, "evdev: failed to erase effect");
        }
    }
}

/// Map one raw record to a canonical event. Unmapped codes yield `None`.
fn decode(id: GamepadId, ev: RawInputEvent, now: i64) -> Option<Event> {
    match ev.kind {
        EV_KEY => {
            let code = codes::map_button(ev.code)?;
            Some(Event::button(id, code, ev.value != 0, now))
        }
        EV_ABS => {
            let code = codes::map_axis(ev.code)?;
            Some(Event::axis(id, code, codes::normalize_abs(ev.code, ev.value), now))
        }
        _ => None,
    }
}

impl<S: NodeSource> Backend for EvdevBackend<S> {
    fn name(&self) -> &'static str {
        "evdev"
    }

    fn poll(&mut self) {
        self.cycle(0, now_ms());
    }

    fn poll_timeout(&mut self, timeout_ms: i32) -> bool {
        if timeout_ms == 0 {
            return self.cycle(0, now_ms());
        }
        // Wake up periodically so hotplugged nodes join the wait set.
        let step = i32::try_from(self.rescan_interval_ms).unwrap_or(i32::MAX);
        let deadline = (timeout_ms > 0)
            .then(|| Instant::now() + Duration::from_millis(u64::from(timeout_ms.unsigned_abs())));
        loop {
            let wait = match deadline {
                None => step,
                Some(d) => {
                    let left = d.saturating_duration_since(Instant::now()).as_millis();
                    i32::try_from(left).unwrap_or(i32::MAX).min(step)
                }
            };
            if self.cycle(wait, now_ms()) {
                return true;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return false;
            }
        }
    }

    fn next_event(&mut self) -> Option<Event> {
        self.queue.try_pop()
    }

    fn gamepad_count(&self) -> usize {
        self.registry.connected_count()
    }

    fn gamepad_ids(&self) -> Vec<GamepadId> {
        self.registry.connected_ids()
    }

    fn info(&self, id: GamepadId) -> Option<GamepadInfo> {
        self.registry
            .get(id)
            .filter(|s| s.connected)
            .map(|s| s.info.clone())
    }

    fn axes(&self, id: GamepadId) -> Vec<u32> {
        self.caps(id).map(Capabilities::axes).unwrap_or_default()
    }

    fn buttons(&self, id: GamepadId) -> Vec<u32> {
        self.caps(id).map(Capabilities::buttons).unwrap_or_default()
    }

    fn axis_info(&self, id: GamepadId, code: u32) -> Option<AxisInfo> {
        self.caps(id)?.axis_info(code)
    }

    fn set_rumble(&mut self, id: GamepadId, strong: f32, weak: f32, duration_ms: i32) -> bool {
        self.rumble_at(id, strong, weak, duration_ms, now_ms())
    }
}

impl<S: NodeSource> Drop for EvdevBackend<S> {
    fn drop(&mut self) {
        for slot in self.registry.drain() {
            release(slot);
        }
    }
}
