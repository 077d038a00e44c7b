//! Per-frame note placement.
//!
//! Position grows at a constant velocity: a note enters the field (position
//! 0) `lead_time` seconds before its scheduled time, crosses the hit line at
//! exactly its scheduled time and keeps falling until the field end.

use crate::config::GameConfig;

use super::notes::{NoteField, NoteId};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FallMapping {
    lead_time: f64,
    fall_speed: f64,
    field_length: f64,
    band: (f64, f64),
}

impl FallMapping {
    pub fn from_config(cfg: &GameConfig) -> Self {
        Self {
            lead_time: cfg.lead_time,
            fall_speed: cfg.fall_speed,
            field_length: cfg.field_length,
            band: cfg.hit_band(),
        }
    }

    pub fn position(&self, elapsed: f64, note_time: f64) -> f64 {
        (elapsed - note_time + self.lead_time) * self.fall_speed
    }

    pub fn hit_line(&self) -> f64 {
        self.lead_time * self.fall_speed
    }

    pub fn field_length(&self) -> f64 {
        self.field_length
    }

    pub fn band(&self) -> (f64, f64) {
        self.band
    }

    pub fn in_hit_band(&self, position: f64) -> bool {
        position >= self.band.0 && position <= self.band.1
    }

    pub fn past_field(&self, position: f64) -> bool {
        position > self.field_length
    }
}

/// A note that should be drawn this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteSprite {
    pub id: NoteId,
    pub lane: usize,
    pub position: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub elapsed: f64,
    pub sprites: Vec<NoteSprite>,
    /// Notes that left the field unresolved during this frame.
    pub missed: Vec<NoteId>,
    /// Some pending note is inside the hit band (drives the hit-line flash).
    pub hit_line_flash: bool,
}

/// Place every pending note for `elapsed` and resolve the ones that fell off
/// the field as missed.
pub fn advance(field: &mut NoteField, mapping: &FallMapping, elapsed: f64) -> FrameReport {
    let mut report = FrameReport { elapsed, ..FrameReport::default() };
    for note in field.pending() {
        let position = mapping.position(elapsed, note.time);
        if mapping.past_field(position) {
            report.missed.push(note.id);
            continue;
        }
        if mapping.in_hit_band(position) {
            report.hit_line_flash = true;
        }
        if position >= 0.0 {
            report.sprites.push(NoteSprite { id: note.id, lane: note.lane, position });
        }
    }
    report.missed.retain(|id| field.resolve_miss(*id));
    report
}

/// Resolve the leading notes of `lane` that are already past the field end
/// at `elapsed`, without waiting for the next frame.
pub fn sweep_lane(
    field: &mut NoteField,
    mapping: &FallMapping,
    lane: usize,
    elapsed: f64,
) -> Vec<NoteId> {
    let mut missed = Vec::new();
    while let Some(note) = field.front(lane) {
        let id = note.id;
        if !mapping.past_field(mapping.position(elapsed, note.time)) || !field.resolve_miss(id) {
            break;
        }
        missed.push(id);
    }
    missed
}
