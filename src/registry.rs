//! Device slot arena.
//!
//! A [`Registry`] owns one [`Slot`] per tracked device, addressed by a stable
//! [`GamepadId`]. Ids come from a per-registry counter and are never handed out
//! twice. Capacity is fixed at construction; inserting into a full registry is a
//! silent no-op.
//!
//! Slots carry backend-specific state `S` (file descriptors, HID handles,
//! capability tables). Removing a slot hands that state back so the caller can
//! release it.

use crate::event::GamepadId;
use crate::metadata::GamepadInfo;
use std::collections::HashMap;

#[derive(Debug)]
pub struct Slot<S> {
    pub info: GamepadInfo,
    pub connected: bool,
    pub state: S,
}

impl<S> Slot<S> {
    pub fn id(&self) -> GamepadId {
        self.info.id
    }
}

#[derive(Debug)]
pub struct Registry<S> {
    slots: Vec<Slot<S>>,
    by_id: HashMap<GamepadId, usize>,
    next_id: u32,
    capacity: usize,
}

impl<S> Registry<S> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            by_id: HashMap::with_capacity(capacity),
            next_id: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Allocate a slot. `make_info` receives the freshly assigned id.
    ///
    /// Returns `None` (and allocates nothing) when the registry is full.
    pub fn insert(
        &mut self,
        make_info: impl FnOnce(GamepadId) -> GamepadInfo,
        state: S,
    ) -> Option<GamepadId> {
        if self.is_full() {
            return None;
        }
        let id = GamepadId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let mut info = make_info(id);
        info.id = id;
        self.by_id.insert(id, self.slots.len());
        self.slots.push(Slot {
            info,
            connected: true,
            state,
        });
        Some(id)
    }

    pub fn get(&self, id: GamepadId) -> Option<&Slot<S>> {
        self.by_id.get(&id).map(|&i| &self.slots[i])
    }

    pub fn get_mut(&mut self, id: GamepadId) -> Option<&mut Slot<S>> {
        match self.by_id.get(&id) {
            Some(&i) => self.slots.get_mut(i),
            None => None,
        }
    }

    /// First connected slot matching `pred`.
    pub fn find_connected(&self, mut pred: impl FnMut(&Slot<S>) -> bool) -> Option<GamepadId> {
        self.slots
            .iter()
            .find(|s| s.connected && pred(s))
            .map(Slot::id)
    }

    /// Remove a slot, returning it so its platform state can be released.
    pub fn remove(&mut self, id: GamepadId) -> Option<Slot<S>> {
        let idx = self.by_id.remove(&id)?;
        let slot = self.slots.swap_remove(idx);
        if let Some(moved) = self.slots.get(idx) {
            self.by_id.insert(moved.id(), idx);
        }
        Some(slot)
    }

    /// Remove every slot, oldest first.
    pub fn drain(&mut self) -> Vec<Slot<S>> {
        self.by_id.clear();
        let mut slots: Vec<Slot<S>> = self.slots.drain(..).collect();
        slots.sort_by_key(Slot::id);
        slots
    }

    pub fn connected_count(&self) -> usize {
        self.slots.iter().filter(|s| s.connected).count()
    }

    /// Connected ids, ascending.
    pub fn connected_ids(&self) -> Vec<GamepadId> {
        let mut ids: Vec<GamepadId> = self
            .slots
            .iter()
            .filter(|s| s.connected)
            .map(Slot::id)
            .collect();
        ids.sort();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot<S>> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Slot<S>> {
        self.slots.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str) -> impl FnOnce(GamepadId) -> GamepadInfo + '_ {
        move |id| GamepadInfo {
            id,
            name: name.to_string(),
            uuid: String::new(),
            vendor_id: 0,
            product_id: 0,
            force_feedback: false,
            path: None,
        }
    }

    #[test]
    fn ids_are_monotonic_and_not_reused() {
        let mut reg: Registry<()> = Registry::with_capacity(4);
        let a = reg.insert(info("a"), ()).unwrap();
        let b = reg.insert(info("b"), ()).unwrap();
        assert_eq!((a, b), (GamepadId(0), GamepadId(1)));
        reg.remove(a).unwrap();
        let c = reg.insert(info("c"), ()).unwrap();
        assert_eq!(c, GamepadId(2));
        assert!(reg.get(a).is_none());
        assert_eq!(reg.get(b).unwrap().info.name, "b");
        assert_eq!(reg.get(c).unwrap().info.name, "c");
    }

    #[test]
    fn full_registry_drops_silently() {
        let mut reg: Registry<u8> = Registry::with_capacity(1);
        assert!(reg.insert(info("a"), 1).is_some());
        assert!(reg.insert(info("b"), 2).is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn remove_keeps_index_consistent_after_swap() {
        let mut reg: Registry<&str> = Registry::with_capacity(8);
        let ids: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|s| reg.insert(info(s), s).unwrap())
            .collect();
        assert_eq!(reg.remove(ids[1]).unwrap().state, "b");
        for (id, want) in [(ids[0], "a"), (ids[2], "c"), (ids[3], "d")] {
            assert_eq!(reg.get(id).unwrap().state, want);
        }
        assert_eq!(reg.connected_ids(), vec![ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn find_connected_skips_disconnected_slots() {
        let mut reg: Registry<u32> = Registry::with_capacity(4);
        let a = reg.insert(info("a"), 7).unwrap();
        assert_eq!(reg.find_connected(|s| s.state == 7), Some(a));
        reg.get_mut(a).unwrap().connected = false;
        assert_eq!(reg.find_connected(|s| s.state == 7), None);
        assert_eq!(reg.connected_count(), 0);
    }
}
