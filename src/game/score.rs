//! Score and combo bookkeeping.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Scoreboard {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub hits: u32,
    pub misses: u32,
}

impl Scoreboard {
    pub fn record_hit(&mut self, award: u64) {
        self.score = self.score.saturating_add(award);
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.hits += 1;
    }

    /// Any miss, whether a note fell off the field or a press found nothing.
    pub fn record_miss(&mut self) {
        self.combo = 0;
        self.misses += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Hits over judged notes and presses, 0..=1. 0 before anything is judged.
    pub fn accuracy(&self) -> f64 {
        let judged = self.hits + self.misses;
        if judged == 0 { 0.0 } else { self.hits as f64 / judged as f64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_build_combo_and_misses_reset_it() {
        let mut sb = Scoreboard::default();
        sb.record_hit(100);
        sb.record_hit(100);
        assert_eq!((sb.score, sb.combo), (200, 2));
        sb.record_miss();
        assert_eq!((sb.score, sb.combo, sb.max_combo), (200, 0, 2));
        sb.record_hit(100);
        assert_eq!(sb.max_combo, 2);
        assert!((sb.accuracy() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn reset_clears_everything() {
        let mut sb = Scoreboard::default();
        sb.record_hit(100);
        sb.reset();
        assert_eq!(sb, Scoreboard::default());
        assert_eq!(sb.accuracy(), 0.0);
    }
}
