//! Emulated-side state built from performed mappings.
//!
//! [`EmulatedState`] is an [`ActionSink`] that keeps what an emulator would see:
//! the pin mask per port, pot registers, held keyboard cells and queued UI
//! actions. It is what `poll` prints, and what the integration tests assert on.
//!
//! # Semantics
//! - A pin press sets the bit, a release clears it. Several inputs mapped to the
//!   same pin share the bit; the last edge wins.
//! - Pot registers store the last value performed on them.
//! - UI actions queue up until [`EmulatedState::take_ui_actions`].

use crate::mapping::{ActionSink, KeyPosition, PotAxis};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmulatedState {
    pins: BTreeMap<Option<u8>, u16>,
    pots: BTreeMap<(Option<u8>, PotAxis), i32>,
    keys: BTreeSet<KeyPosition>,
    ui_actions: Vec<String>,
    activations: u32,
}

impl EmulatedState {
    /// Pin mask of `port` (`None` for an unassigned device).
    #[inline]
    pub fn pins(&self, port: Option<u8>) -> u16 {
        self.pins.get(&port).copied().unwrap_or(0)
    }

    #[inline]
    pub fn pot(&self, port: Option<u8>, axis: PotAxis) -> i32 {
        self.pots.get(&(port, axis)).copied().unwrap_or(0)
    }

    #[inline]
    pub fn is_key_held(&self, key: &KeyPosition) -> bool {
        self.keys.contains(key)
    }

    pub fn held_keys(&self) -> impl Iterator<Item = &KeyPosition> {
        self.keys.iter()
    }

    pub fn activations(&self) -> u32 {
        self.activations
    }

    /// Drain queued UI actions.
    pub fn take_ui_actions(&mut self) -> Vec<String> {
        std::mem::take(&mut self.ui_actions)
    }
}

impl ActionSink for EmulatedState {
    fn pin(&mut self, port: Option<u8>, pin: u16, value: i32) {
        let mask = self.pins.entry(port).or_insert(0);
        if value != 0 {
            *mask |= pin;
        } else {
            *mask &= !pin;
        }
    }

    fn key(&mut self, key: KeyPosition, value: i32) {
        if value != 0 {
            self.keys.insert(key);
        } else {
            self.keys.remove(&key);
        }
    }

    fn pot(&mut self, port: Option<u8>, axis: PotAxis, value: i32) {
        self.pots.insert((port, axis), value);
    }

    fn ui_action(&mut self, name: &str) {
        self.ui_actions.push(name.to_string());
    }

    fn ui_activate(&mut self) {
        self.activations += 1;
    }
}
