//! Key → lane mapping and press judgement.

use crate::config::{GameConfig, normalize_key};

use super::animator::FallMapping;
use super::notes::{NoteField, NoteId};

/// Ordered key table; index is the lane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keymap {
    keys: Vec<String>,
    pressed: Vec<bool>,
}

impl Keymap {
    pub fn from_config(cfg: &GameConfig) -> Self {
        let keys: Vec<String> = cfg.lanes.iter().map(|l| normalize_key(&l.key)).collect();
        let pressed = vec![false; keys.len()];
        Self { keys, pressed }
    }

    pub fn lane_for(&self, key: &str) -> Option<usize> {
        let key = normalize_key(key);
        self.keys.iter().position(|k| *k == key)
    }

    pub fn key_for(&self, lane: usize) -> Option<&str> {
        self.keys.get(lane).map(String::as_str)
    }

    pub fn lane_count(&self) -> usize {
        self.keys.len()
    }

    /// Mark the lane indicator active. Returns the lane when the key is bound.
    pub fn press(&mut self, key: &str) -> Option<usize> {
        let lane = self.lane_for(key)?;
        self.pressed[lane] = true;
        Some(lane)
    }

    pub fn release(&mut self, key: &str) -> Option<usize> {
        let lane = self.lane_for(key)?;
        self.pressed[lane] = false;
        Some(lane)
    }

    pub fn is_pressed(&self, lane: usize) -> bool {
        self.pressed.get(lane).copied().unwrap_or(false)
    }

    pub fn release_all(&mut self) {
        self.pressed.iter_mut().for_each(|p| *p = false);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressOutcome {
    Hit(NoteId),
    /// Nothing hittable in the lane: an early, late or stray press.
    Miss,
}

/// Judge a press in `lane` against the earliest pending note of that lane.
/// Later notes are never considered, even if the earliest is out of reach.
pub fn judge_press(
    field: &mut NoteField,
    mapping: &FallMapping,
    lane: usize,
    elapsed: f64,
) -> PressOutcome {
    let Some(note) = field.front(lane) else {
        return PressOutcome::Miss;
    };
    let id = note.id;
    if mapping.in_hit_band(mapping.position(elapsed, note.time)) && field.resolve_hit(id) {
        PressOutcome::Hit(id)
    } else {
        PressOutcome::Miss
    }
}
