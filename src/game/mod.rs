//! Round lifecycle: the session controller that owns the clock, the note
//! field, the keymap and the scoreboard.
//!
//! The controller is host-agnostic. The browser front end (`crate::web`)
//! feeds it `AudioContext.currentTime` readings and key identifiers, and
//! draws whatever `tick` reports; native tests feed a `ManualClock`.
//!
//! Frame loop ownership: every `start` hands out a `FrameTicket`. A frame
//! callback must present its ticket to `tick`; `stop` (or a new `start`)
//! bumps the generation, so callbacks still queued from an older round are
//! discarded instead of producing ghost notes.

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::GameConfig;
use crate::error::{GameError, GameResult};

pub mod animator;
pub mod clock;
pub mod input;
pub mod notes;
pub mod score;

use animator::{FallMapping, FrameReport};
use clock::Timekeeper;
use input::{Keymap, PressOutcome};
use notes::{NoteField, NoteId};
use score::Scoreboard;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Running => "running",
            Status::Paused => "paused",
            Status::Stopped => "stopped",
        }
    }
}

/// Everything the renderer needs to react to, in the order it happened.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GameEvent {
    KeyDown { lane: usize },
    KeyUp { lane: usize },
    Hit { lane: usize, note: NoteId },
    /// A press found nothing hittable in its lane.
    PressMiss { lane: usize },
    /// A note fell past the field end unresolved.
    NoteMissed { lane: usize, note: NoteId },
    RoundComplete,
}

impl GameEvent {
    /// Transient judgement text, if the event shows one.
    pub fn feedback(&self) -> Option<&'static str> {
        match self {
            GameEvent::Hit { .. } => Some("Perfect"),
            GameEvent::PressMiss { .. } | GameEvent::NoteMissed { .. } => Some("Miss"),
            _ => None,
        }
    }

    pub fn shakes(&self) -> bool {
        matches!(self, GameEvent::PressMiss { .. } | GameEvent::NoteMissed { .. })
    }
}

/// Proof that a frame callback belongs to the current round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTicket(u64);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Track {
    pub duration: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub report: FrameReport,
    pub events: Vec<GameEvent>,
}

pub struct Session {
    config: GameConfig,
    mapping: FallMapping,
    keymap: Keymap,
    status: Status,
    track: Option<Track>,
    timekeeper: Timekeeper,
    field: NoteField,
    scoreboard: Scoreboard,
    rng: SmallRng,
    generation: u64,
}

impl Session {
    pub fn new(config: GameConfig) -> GameResult<Self> {
        Self::with_rng(config, SmallRng::from_entropy())
    }

    /// Deterministic lane choice, for tests and demos.
    pub fn with_seed(config: GameConfig, seed: u64) -> GameResult<Self> {
        Self::with_rng(config, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, rng: SmallRng) -> GameResult<Self> {
        config.validate()?;
        Ok(Self {
            mapping: FallMapping::from_config(&config),
            keymap: Keymap::from_config(&config),
            field: NoteField::new(Vec::new(), config.lane_count()),
            config,
            status: Status::Idle,
            track: None,
            timekeeper: Timekeeper::new(),
            scoreboard: Scoreboard::default(),
            rng,
            generation: 0,
        })
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn mapping(&self) -> &FallMapping {
        &self.mapping
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn field(&self) -> &NoteField {
        &self.field
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn track(&self) -> Option<Track> {
        self.track
    }

    pub fn elapsed(&mut self, now: f64) -> f64 {
        self.timekeeper.elapsed(now)
    }

    fn busy(&self, action: &'static str) -> GameError {
        log::warn!("rejected {action} while {}", self.status.as_str());
        GameError::Busy { action, status: self.status.as_str() }
    }

    fn in_round(&self) -> bool {
        matches!(self.status, Status::Running | Status::Paused)
    }

    // --- Track -----------------------------------------------------------------

    /// Record a decoded track. Replaces any previously loaded one.
    pub fn load_track(&mut self, duration: f64) -> GameResult<()> {
        if self.in_round() {
            return Err(self.busy("load a track"));
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err(self.track_failed(format!("unusable duration {duration}")));
        }
        log::info!("track loaded ({duration:.2}s)");
        self.track = Some(Track { duration });
        Ok(())
    }

    /// The decoder rejected the bytes: forget any loaded track so Start
    /// cannot run against stale audio. A round in progress keeps its track.
    pub fn track_failed(&mut self, reason: impl Into<String>) -> GameError {
        let reason = reason.into();
        log::warn!("track decode failed: {reason}");
        if self.in_round() {
            return self.busy("load a track");
        }
        self.track = None;
        GameError::Decode(reason)
    }

    // --- Lifecycle -------------------------------------------------------------

    pub fn start(&mut self, now: f64) -> GameResult<FrameTicket> {
        if self.in_round() {
            return Err(self.busy("start"));
        }
        let Some(track) = self.track else {
            log::warn!("start requested without a track");
            return Err(GameError::NoTrackLoaded);
        };
        self.scoreboard.reset();
        self.keymap.release_all();
        self.regenerate_notes(track, 0.0);
        self.timekeeper.start(now);
        self.status = Status::Running;
        self.generation += 1;
        log::info!(
            "round started: {} notes over {:.2}s, {} lanes",
            self.field.notes().len(),
            track.duration,
            self.keymap.lane_count()
        );
        Ok(FrameTicket(self.generation))
    }

    /// Running -> Paused or Paused -> Running. Returns the new status.
    pub fn toggle_pause(&mut self, now: f64) -> GameResult<Status> {
        match self.status {
            Status::Running => {
                self.timekeeper.pause(now);
                self.status = Status::Paused;
            }
            Status::Paused => {
                self.timekeeper.resume(now);
                self.status = Status::Running;
            }
            _ => return Err(self.busy("pause")),
        }
        log::info!("session {}", self.status.as_str());
        Ok(self.status)
    }

    /// End the round. Returns false when there was no round to stop.
    pub fn stop(&mut self) -> bool {
        self.generation += 1;
        if !self.in_round() {
            return false;
        }
        self.end_round();
        log::info!("round stopped at score {}", self.scoreboard.score);
        true
    }

    fn end_round(&mut self) {
        self.status = Status::Stopped;
        self.timekeeper.stop();
        self.field.clear();
        self.keymap.release_all();
    }

    /// Whether the frame loop holding `ticket` should keep rescheduling.
    pub fn is_current(&self, ticket: FrameTicket) -> bool {
        ticket.0 == self.generation && self.in_round()
    }

    // --- Configuration ---------------------------------------------------------

    pub fn set_keybinds<S: AsRef<str>>(&mut self, keys: &[S], now: f64) -> GameResult<()> {
        if self.status == Status::Paused {
            return Err(self.busy("change keybinds"));
        }
        let next = self.config.with_keys(keys)?;
        self.apply_config(next);
        if self.status == Status::Running {
            if let Some(track) = self.track {
                let elapsed = self.timekeeper.elapsed(now);
                self.regenerate_notes(track, elapsed);
            }
        }
        log::info!("keybinds set to {:?}", self.config.lanes.iter().map(|l| &l.key).collect::<Vec<_>>());
        Ok(())
    }

    pub fn set_lane_colors<S: AsRef<str>>(&mut self, colors: &[S]) {
        self.config = self.config.with_colors(colors);
    }

    /// Replace the whole configuration between rounds.
    pub fn configure(&mut self, config: GameConfig) -> GameResult<()> {
        if self.in_round() {
            return Err(self.busy("reconfigure"));
        }
        config.validate()?;
        self.apply_config(config);
        Ok(())
    }

    fn apply_config(&mut self, config: GameConfig) {
        self.mapping = FallMapping::from_config(&config);
        self.keymap = Keymap::from_config(&config);
        self.field = NoteField::new(Vec::new(), config.lane_count());
        self.config = config;
    }

    /// Fresh schedule for the current lane set; notes already below the hit
    /// band at `from` are dropped.
    fn regenerate_notes(&mut self, track: Track, from: f64) {
        let mut notes = notes::schedule_notes(
            track.duration,
            self.config.beat_interval,
            self.config.lane_count(),
            &mut self.rng,
        );
        let cutoff = from - self.config.hit_window / self.config.fall_speed;
        notes.retain(|n| n.time >= cutoff);
        self.field = NoteField::new(notes, self.config.lane_count());
    }

    // --- Input -----------------------------------------------------------------

    /// Unbound keys produce no events. Presses outside a running round only
    /// light the indicator.
    pub fn key_down(&mut self, key: &str, now: f64) -> Vec<GameEvent> {
        let Some(lane) = self.keymap.press(key) else {
            return Vec::new();
        };
        let mut events = vec![GameEvent::KeyDown { lane }];
        if self.status != Status::Running {
            return events;
        }
        let elapsed = self.timekeeper.elapsed(now);
        // Notes that fell off since the last frame are misses, not targets.
        for note in animator::sweep_lane(&mut self.field, &self.mapping, lane, elapsed) {
            self.scoreboard.record_miss();
            events.push(GameEvent::NoteMissed { lane, note });
        }
        match input::judge_press(&mut self.field, &self.mapping, lane, elapsed) {
            PressOutcome::Hit(note) => {
                self.scoreboard.record_hit(self.config.hit_award);
                log::trace!("hit lane {lane} note {} at {elapsed:.3}s", note.0);
                events.push(GameEvent::Hit { lane, note });
            }
            PressOutcome::Miss => {
                self.scoreboard.record_miss();
                log::debug!("stray press lane {lane} at {elapsed:.3}s");
                events.push(GameEvent::PressMiss { lane });
            }
        }
        events
    }

    pub fn key_up(&mut self, key: &str) -> Option<GameEvent> {
        self.keymap.release(key).map(|lane| GameEvent::KeyUp { lane })
    }

    // --- Frame -----------------------------------------------------------------

    /// Advance one frame. `None` when the ticket is stale or the session is
    /// not running (paused frames draw nothing new).
    pub fn tick(&mut self, ticket: FrameTicket, now: f64) -> Option<Frame> {
        if ticket.0 != self.generation || self.status != Status::Running {
            return None;
        }
        let elapsed = self.timekeeper.elapsed(now);
        let report = animator::advance(&mut self.field, &self.mapping, elapsed);
        let mut events = Vec::with_capacity(report.missed.len());
        for &note in &report.missed {
            self.scoreboard.record_miss();
            let lane = self.field.get(note).map(|n| n.lane).unwrap_or_default();
            log::debug!("note {} in lane {lane} fell off the field", note.0);
            events.push(GameEvent::NoteMissed { lane, note });
        }
        let finished = self.track.is_some_and(|t| elapsed >= t.duration) && self.field.is_exhausted();
        if finished {
            self.generation += 1;
            self.end_round();
            log::info!(
                "round complete: score {}, max combo {}, accuracy {:.1}%",
                self.scoreboard.score,
                self.scoreboard.max_combo,
                self.scoreboard.accuracy() * 100.0
            );
            events.push(GameEvent::RoundComplete);
        }
        Some(Frame { report, events })
    }
}
