//! Song-relative time.
//!
//! `Timekeeper` never reads a clock on its own: every call takes the current
//! playback clock reading (`AudioContext.currentTime` in the browser), so the
//! same code runs against a manual clock in tests.

/// Source of the playback clock, in seconds.
pub trait PlaybackClock {
    fn now(&self) -> f64;
}

/// Clock driven by hand; used by native tests and by the session when the
/// host feeds timestamps directly.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: std::cell::Cell<f64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self { now: std::cell::Cell::new(start) }
    }

    pub fn set(&self, now: f64) {
        self.now.set(now);
    }

    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }
}

impl PlaybackClock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Stopped,
    /// `origin` is the clock reading that corresponds to elapsed 0.
    Running { origin: f64 },
    Paused { elapsed: f64 },
}

/// Tracks elapsed song time across pause / resume.
#[derive(Clone, Copy, Debug)]
pub struct Timekeeper {
    phase: Phase,
    /// Highest value handed out while running; guards against a clock that
    /// steps backwards.
    high_water: f64,
}

impl Default for Timekeeper {
    fn default() -> Self {
        Self::new()
    }
}

impl Timekeeper {
    pub fn new() -> Self {
        Self { phase: Phase::Stopped, high_water: 0.0 }
    }

    pub fn start(&mut self, now: f64) {
        self.phase = Phase::Running { origin: now };
        self.high_water = 0.0;
    }

    pub fn pause(&mut self, now: f64) {
        if let Phase::Running { .. } = self.phase {
            let elapsed = self.elapsed(now);
            self.phase = Phase::Paused { elapsed };
        }
    }

    /// Rebase the origin so elapsed time continues from the frozen value.
    pub fn resume(&mut self, now: f64) {
        if let Phase::Paused { elapsed } = self.phase {
            self.phase = Phase::Running { origin: now - elapsed };
        }
    }

    pub fn stop(&mut self) {
        self.phase = Phase::Stopped;
        self.high_water = 0.0;
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    /// Seconds since song start. Frozen while paused, 0 when stopped.
    pub fn elapsed(&mut self, now: f64) -> f64 {
        match self.phase {
            Phase::Stopped => 0.0,
            Phase::Paused { elapsed } => elapsed,
            Phase::Running { origin } => {
                self.high_water = self.high_water.max(now - origin);
                self.high_water
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_relative_to_start() {
        let clock = ManualClock::new(12.0);
        let mut tk = Timekeeper::new();
        assert_eq!(tk.elapsed(clock.now()), 0.0);
        tk.start(clock.now());
        clock.advance(1.5);
        assert!((tk.elapsed(clock.now()) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn pause_freezes_and_resume_continues() {
        let clock = ManualClock::new(0.0);
        let mut tk = Timekeeper::new();
        tk.start(clock.now());
        clock.advance(2.0);
        let before = tk.elapsed(clock.now());
        tk.pause(clock.now());
        clock.advance(10.0);
        assert_eq!(tk.elapsed(clock.now()), before);
        tk.resume(clock.now());
        assert!((tk.elapsed(clock.now()) - before).abs() < 1e-9);
        clock.advance(0.5);
        assert!((tk.elapsed(clock.now()) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn elapsed_never_decreases_while_running() {
        let clock = ManualClock::new(5.0);
        let mut tk = Timekeeper::new();
        tk.start(clock.now());
        clock.set(6.0);
        assert_eq!(tk.elapsed(clock.now()), 1.0);
        clock.set(5.5);
        assert_eq!(tk.elapsed(clock.now()), 1.0);
    }

    #[test]
    fn stop_resets_to_zero() {
        let mut tk = Timekeeper::new();
        tk.start(0.0);
        assert_eq!(tk.elapsed(3.0), 3.0);
        tk.stop();
        assert_eq!(tk.elapsed(4.0), 0.0);
        assert!(!tk.is_running());
        tk.start(4.0);
        assert_eq!(tk.elapsed(4.25), 0.25);
    }

    #[test]
    fn resume_without_pause_is_a_no_op() {
        let mut tk = Timekeeper::new();
        tk.start(1.0);
        tk.resume(50.0);
        assert_eq!(tk.elapsed(2.0), 1.0);
    }
}
