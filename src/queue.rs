//! Bounded event queues.
//!
//! [`EventQueue`] is the single-threaded ring used by the cooperative backends
//! (evdev, XInput): the decode path and the consumer run on the same thread, so
//! it needs no locking.
//!
//! [`SharedEventQueue`] is the mailbox used by the IOKit backend, where device
//! callbacks run on a background run-loop thread and the consumer may block in
//! [`SharedEventQueue::wait_pop`] from any thread.
//!
//! Both evict the oldest event when full, so the retained contents are always the
//! most recent `capacity` events in push order.

use crate::event::Event;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Fixed-capacity FIFO that drops its oldest entry on overflow.
#[derive(Debug)]
pub struct EventQueue {
    buf: VecDeque<Event>,
    capacity: usize,
}

impl EventQueue {
    /// `capacity` is clamped to at least 1.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `event`, evicting the oldest entry if the queue is full.
    ///
    /// Returns the evicted event, if any.
    pub fn push(&mut self, event: Event) -> Option<Event> {
        let evicted = if self.buf.len() == self.capacity {
            self.buf.pop_front()
        } else {
            None
        };
        self.buf.push_back(event);
        evicted
    }

    pub fn try_pop(&mut self) -> Option<Event> {
        self.buf.pop_front()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.buf.iter()
    }
}

impl Extend<Event> for EventQueue {
    fn extend<I: IntoIterator<Item = Event>>(&mut self, iter: I) {
        for ev in iter {
            self.push(ev);
        }
    }
}

#[derive(Debug)]
struct Inner {
    queue: Mutex<EventQueue>,
    ready: Condvar,
}

/// Thread-safe [`EventQueue`] with blocking receive.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone, Debug)]
pub struct SharedEventQueue {
    inner: Arc<Inner>,
}

impl SharedEventQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                queue: Mutex::new(EventQueue::with_capacity(capacity)),
                ready: Condvar::new(),
            }),
        }
    }

    /// Never blocks on a full queue; wakes one waiting consumer.
    pub fn push(&self, event: Event) {
        let was_empty = {
            let mut q = self.inner.queue.lock();
            let was_empty = q.is_empty();
            q.push(event);
            was_empty
        };
        if was_empty {
            self.inner.ready.notify_one();
        }
    }

    pub fn extend(&self, events: impl IntoIterator<Item = Event>) {
        let was_empty = {
            let mut q = self.inner.queue.lock();
            let was_empty = q.is_empty();
            q.extend(events);
            was_empty && !q.is_empty()
        };
        if was_empty {
            self.inner.ready.notify_all();
        }
    }

    pub fn try_pop(&self) -> Option<Event> {
        self.inner.queue.lock().try_pop()
    }

    /// Pop with a timeout in milliseconds.
    ///
    /// - `timeout_ms < 0`: block until an event arrives.
    /// - `timeout_ms == 0`: same as [`try_pop`](Self::try_pop).
    /// - `timeout_ms > 0`: wait up to that long.
    pub fn wait_pop(&self, timeout_ms: i32) -> Option<Event> {
        let mut q = self.inner.queue.lock();
        if let Some(ev) = q.try_pop() {
            return Some(ev);
        }
        if timeout_ms == 0 {
            return None;
        }
        if timeout_ms < 0 {
            loop {
                self.inner.ready.wait(&mut q);
                if let Some(ev) = q.try_pop() {
                    return Some(ev);
                }
            }
        }
        let deadline = Instant::now() + Duration::from_millis(timeout_ms.unsigned_abs().into());
        loop {
            if self.inner.ready.wait_until(&mut q, deadline).timed_out() {
                return q.try_pop();
            }
            if let Some(ev) = q.try_pop() {
                return Some(ev);
            }
        }
    }

    /// Block like [`wait_pop`](Self::wait_pop) but leave the event queued.
    ///
    /// Returns `true` if the queue is non-empty on return.
    pub fn wait_ready(&self, timeout_ms: i32) -> bool {
        let mut q = self.inner.queue.lock();
        if !q.is_empty() || timeout_ms == 0 {
            return !q.is_empty();
        }
        if timeout_ms < 0 {
            while q.is_empty() {
                self.inner.ready.wait(&mut q);
            }
            return true;
        }
        let deadline = Instant::now() + Duration::from_millis(timeout_ms.unsigned_abs().into());
        while q.is_empty() {
            if self.inner.ready.wait_until(&mut q, deadline).timed_out() {
                break;
            }
        }
        !q.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.queue.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, GamepadId};
    use std::thread;

    fn ev(n: u32) -> Event {
        Event::new(GamepadId(n), EventKind::Connected, i64::from(n))
    }

    #[test]
    fn overflow_evicts_oldest() {
        let mut q = EventQueue::with_capacity(3);
        for n in 0..5 {
            q.push(ev(n));
        }
        assert_eq!(q.len(), 3);
        let ids: Vec<u32> = std::iter::from_fn(|| q.try_pop()).map(|e| e.id.0).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn push_reports_evicted_entry() {
        let mut q = EventQueue::with_capacity(1);
        assert!(q.push(ev(1)).is_none());
        assert_eq!(q.push(ev(2)).map(|e| e.id.0), Some(1));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut q = EventQueue::with_capacity(0);
        q.push(ev(7));
        assert_eq!(q.capacity(), 1);
        assert_eq!(q.try_pop().map(|e| e.id.0), Some(7));
    }

    #[test]
    fn wait_pop_zero_timeout_does_not_block() {
        let q = SharedEventQueue::with_capacity(4);
        assert!(q.wait_pop(0).is_none());
        q.push(ev(1));
        assert_eq!(q.wait_pop(0).map(|e| e.id.0), Some(1));
    }

    #[test]
    fn wait_pop_times_out() {
        let q = SharedEventQueue::with_capacity(4);
        let start = Instant::now();
        assert!(q.wait_pop(20).is_none());
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn wait_pop_wakes_on_push_from_other_thread() {
        let q = SharedEventQueue::with_capacity(4);
        let producer = q.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            producer.push(ev(9));
        });
        assert_eq!(q.wait_pop(-1).map(|e| e.id.0), Some(9));
        handle.join().unwrap();
    }

    #[test]
    fn wait_ready_leaves_event_queued() {
        let q = SharedEventQueue::with_capacity(4);
        q.push(ev(5));
        assert!(q.wait_ready(100));
        assert_eq!(q.len(), 1);
    }
}
