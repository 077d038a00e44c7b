//! Notes, the beat scheduler and the per-lane queues used for hit testing.

use std::collections::VecDeque;

use rand::Rng;

/// Hard ceiling on generated notes so a pathological interval cannot
/// allocate without bound.
pub const MAX_NOTES: usize = 100_000;

/// Stable handle of a note within one round (its index in schedule order).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteState {
    Pending,
    Hit,
    Missed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub id: NoteId,
    /// Seconds from song start at which the note sits on the hit line.
    pub time: f64,
    pub lane: usize,
    state: NoteState,
}

impl Note {
    pub fn new(id: NoteId, time: f64, lane: usize) -> Self {
        Self { id, time, lane, state: NoteState::Pending }
    }

    pub fn state(&self) -> NoteState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == NoteState::Pending
    }

    /// Pending -> Hit. Returns false (and changes nothing) if already resolved.
    fn mark_hit(&mut self) -> bool {
        self.resolve(NoteState::Hit)
    }

    /// Pending -> Missed. Returns false (and changes nothing) if already resolved.
    fn mark_missed(&mut self) -> bool {
        self.resolve(NoteState::Missed)
    }

    fn resolve(&mut self, to: NoteState) -> bool {
        if self.state != NoteState::Pending {
            return false;
        }
        self.state = to;
        true
    }
}

/// Notes at `0, interval, 2*interval, ...` strictly below `duration`, one
/// random lane each. Degenerate input yields no notes.
pub fn schedule_notes<R: Rng + ?Sized>(
    duration: f64,
    interval: f64,
    lane_count: usize,
    rng: &mut R,
) -> Vec<Note> {
    let usable = duration.is_finite() && interval.is_finite() && duration > 0.0 && interval > 0.0;
    if !usable || lane_count == 0 {
        return Vec::new();
    }
    let mut notes = Vec::new();
    loop {
        let time = notes.len() as f64 * interval;
        if time >= duration {
            break;
        }
        if notes.len() == MAX_NOTES {
            log::warn!("schedule truncated at {MAX_NOTES} notes (interval {interval}s)");
            break;
        }
        let lane = rng.gen_range(0..lane_count);
        notes.push(Note::new(NoteId(notes.len()), time, lane));
    }
    notes
}

/// All notes of the round plus, per lane, the unresolved ones in time order.
#[derive(Clone, Debug, Default)]
pub struct NoteField {
    notes: Vec<Note>,
    queues: Vec<VecDeque<NoteId>>,
}

impl NoteField {
    /// `notes` must be sorted by time, as `schedule_notes` produces them.
    /// Ids are reassigned to match positions in the field.
    pub fn new(mut notes: Vec<Note>, lane_count: usize) -> Self {
        for (i, note) in notes.iter_mut().enumerate() {
            note.id = NoteId(i);
        }
        let mut queues = vec![VecDeque::new(); lane_count];
        for note in notes.iter().filter(|n| n.is_pending()) {
            if let Some(q) = queues.get_mut(note.lane) {
                q.push_back(note.id);
            }
        }
        Self { notes, queues }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(id.0)
    }

    pub fn lane_count(&self) -> usize {
        self.queues.len()
    }

    /// Earliest unresolved note in `lane`: the only one a press can hit.
    pub fn front(&self, lane: usize) -> Option<&Note> {
        let id = *self.queues.get(lane)?.front()?;
        self.get(id)
    }

    /// Unresolved notes, lane by lane, each lane in time order.
    pub fn pending(&self) -> impl Iterator<Item = &Note> + '_ {
        self.queues.iter().flatten().filter_map(move |id| self.get(*id))
    }

    pub fn pending_count(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    pub fn is_exhausted(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }

    pub fn resolve_hit(&mut self, id: NoteId) -> bool {
        self.resolve(id, Note::mark_hit)
    }

    pub fn resolve_miss(&mut self, id: NoteId) -> bool {
        self.resolve(id, Note::mark_missed)
    }

    fn resolve(&mut self, id: NoteId, mark: fn(&mut Note) -> bool) -> bool {
        let Some(note) = self.notes.get_mut(id.0) else {
            return false;
        };
        if !mark(note) {
            return false;
        }
        if let Some(q) = self.queues.get_mut(note.lane) {
            if q.front() == Some(&id) {
                q.pop_front();
            } else {
                q.retain(|queued| *queued != id);
            }
        }
        true
    }

    pub fn clear(&mut self) {
        self.notes.clear();
        self.queues.iter_mut().for_each(VecDeque::clear);
    }
}
