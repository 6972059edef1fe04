//! Capability bitmaps and gamepad classification.

use super::codes::*;
use crate::device::AxisInfo;
use std::collections::BTreeMap;

/// Bitmap as returned by `EVIOCGBIT`, stored as bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitSet {
    bytes: Vec<u8>,
}

impl BitSet {
    /// Room for bits `0..=max`.
    pub fn for_max(max: u16) -> Self {
        Self {
            bytes: vec![0; usize::from(max) / 8 + 1],
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn test(&self, bit: u16) -> bool {
        let bit = usize::from(bit);
        self.bytes
            .get(bit / 8)
            .is_some_and(|b| b & (1 << (bit % 8)) != 0)
    }

    pub fn set(&mut self, bit: u16) {
        let bit = usize::from(bit);
        if self.bytes.len() <= bit / 8 {
            self.bytes.resize(bit / 8 + 1, 0);
        }
        self.bytes[bit / 8] |= 1 << (bit % 8);
    }

    pub fn with(mut self, bits: &[u16]) -> Self {
        for &b in bits {
            self.set(b);
        }
        self
    }
}

/// Everything probed from a node before deciding whether to keep it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub ev: BitSet,
    pub keys: BitSet,
    pub abs: BitSet,
    pub ff: BitSet,
    /// `absinfo` min/max per abs code, when the kernel reported one.
    pub abs_ranges: BTreeMap<u16, AxisInfo>,
}

impl Capabilities {
    /// Accept only nodes that look like a gamepad: `EV_KEY` or `EV_ABS`, sticks
    /// (X and Y) or a hat, and at least one gamepad-class button.
    pub fn is_gamepad(&self) -> bool {
        let has_key = self.ev.test(EV_KEY);
        let has_abs = self.ev.test(EV_ABS);
        if !has_key && !has_abs {
            return false;
        }
        let has_gamepad_key = GAMEPAD_KEYS.iter().any(|&k| self.keys.test(k));
        let has_sticks = self.abs.test(ABS_X) && self.abs.test(ABS_Y);
        let has_hat = self.abs.test(ABS_HAT0X) || self.abs.test(ABS_HAT0Y);
        has_gamepad_key && (has_sticks || has_hat)
    }

    pub fn has_rumble(&self) -> bool {
        self.ev.test(EV_FF) && self.ff.test(FF_RUMBLE)
    }

    /// Logical button codes present on the node.
    pub fn buttons(&self) -> Vec<u32> {
        BUTTON_MAP
            .iter()
            .filter(|&&(raw, _)| self.keys.test(raw))
            .map(|&(_, logical)| logical)
            .collect()
    }

    /// Logical axis codes present on the node.
    pub fn axes(&self) -> Vec<u32> {
        AXIS_MAP
            .iter()
            .filter(|&&(raw, _)| self.abs.test(raw))
            .map(|&(_, logical)| logical)
            .collect()
    }

    pub fn axis_info(&self, logical: u32) -> Option<AxisInfo> {
        let raw = abs_for_axis(logical)?;
        if !self.abs.test(raw) {
            return None;
        }
        Some(self.abs_ranges.get(&raw).copied().unwrap_or(if is_hat(raw) {
            AxisInfo { min: -1, max: 1 }
        } else {
            AxisInfo {
                min: -32768,
                max: 32767,
            }
        }))
    }
}
