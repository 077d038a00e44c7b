//! Gameplay tuning and lane bindings.
//!
//! Everything the round needs that is not derived from the track lives here:
//! beat spacing, fall geometry (all in canvas pixels), hit band width, the
//! award per hit and the ordered key → lane table. Defaults reproduce the
//! classic four-lane A/S/D/F layout.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

/// Upper bound on lanes; the canvas layout assumes a handful of columns.
pub const MAX_LANES: usize = 8;

pub const DEFAULT_KEYS: [&str; 4] = ["A", "S", "D", "F"];
pub const DEFAULT_COLORS: [&str; 4] = ["#ff0000", "#00ff00", "#0000ff", "#ffff00"];

/// One column of the play field: the key that hits it and its note color.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneBinding {
    pub key: String,
    pub color: String,
}

impl LaneBinding {
    pub fn new(key: &str, color: &str) -> Self {
        Self { key: normalize_key(key), color: color.to_string() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    /// Seconds between generated notes.
    pub beat_interval: f64,
    /// Seconds a note is visible before it reaches the hit line. The clock
    /// starts with the audio, so notes scheduled earlier than this first
    /// appear partway down the field instead of falling in from the top.
    pub lead_time: f64,
    /// Pixels per second along the fall axis.
    pub fall_speed: f64,
    /// Half-width of the hit band around the hit line, in pixels.
    pub hit_window: f64,
    /// Distance from spawn edge to field end; unresolved notes past it miss.
    pub field_length: f64,
    /// Points per hit.
    pub hit_award: u64,
    pub lanes: Vec<LaneBinding>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            beat_interval: 0.5,
            lead_time: 1.0,
            fall_speed: 250.0,
            hit_window: 25.0,
            field_length: 300.0,
            hit_award: 100,
            lanes: DEFAULT_KEYS
                .iter()
                .zip(DEFAULT_COLORS.iter())
                .map(|(k, c)| LaneBinding::new(k, c))
                .collect(),
        }
    }
}

impl GameConfig {
    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> GameResult<Self> {
        let mut cfg: GameConfig =
            serde_json::from_str(json).map_err(|e| GameError::invalid(e.to_string()))?;
        for lane in &mut cfg.lanes {
            lane.key = normalize_key(&lane.key);
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Position at which a note sits exactly on its scheduled time.
    pub fn hit_line(&self) -> f64 {
        self.lead_time * self.fall_speed
    }

    /// Inclusive `(start, end)` of the hittable band.
    pub fn hit_band(&self) -> (f64, f64) {
        let line = self.hit_line();
        (line - self.hit_window, line + self.hit_window)
    }

    /// Replace the key of every lane, keeping colors. Lane count may change;
    /// new lanes reuse the default palette.
    pub fn with_keys<S: AsRef<str>>(&self, keys: &[S]) -> GameResult<Self> {
        let mut next = self.clone();
        next.lanes = keys
            .iter()
            .enumerate()
            .map(|(i, k)| {
                let color = self
                    .lanes
                    .get(i)
                    .map(|l| l.color.clone())
                    .unwrap_or_else(|| DEFAULT_COLORS[i % DEFAULT_COLORS.len()].to_string());
                LaneBinding { key: normalize_key(k.as_ref()), color }
            })
            .collect();
        next.validate()?;
        Ok(next)
    }

    /// Recolor lanes in order; extra colors are ignored, missing ones keep
    /// the current color.
    pub fn with_colors<S: AsRef<str>>(&self, colors: &[S]) -> Self {
        let mut next = self.clone();
        for (lane, color) in next.lanes.iter_mut().zip(colors) {
            lane.color = color.as_ref().to_string();
        }
        next
    }

    pub fn validate(&self) -> GameResult<()> {
        if self.lanes.is_empty() {
            return Err(GameError::invalid("at least one lane is required"));
        }
        if self.lanes.len() > MAX_LANES {
            return Err(GameError::invalid(format!("at most {MAX_LANES} lanes are supported")));
        }
        for (i, lane) in self.lanes.iter().enumerate() {
            if lane.key.is_empty() {
                return Err(GameError::invalid(format!("lane {i} has no key")));
            }
            if self.lanes[..i].iter().any(|other| other.key == lane.key) {
                return Err(GameError::invalid(format!("key '{}' is bound twice", lane.key)));
            }
        }
        let positive = [
            ("beatInterval", self.beat_interval),
            ("leadTime", self.lead_time),
            ("fallSpeed", self.fall_speed),
            ("fieldLength", self.field_length),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(GameError::invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if !(self.hit_window.is_finite() && self.hit_window >= 0.0) {
            return Err(GameError::invalid("hitWindow must not be negative"));
        }
        let (start, end) = self.hit_band();
        if start < 0.0 || end > self.field_length {
            return Err(GameError::invalid(format!(
                "hit band [{start}, {end}] must lie inside the field [0, {}]",
                self.field_length
            )));
        }
        Ok(())
    }
}

/// Single characters compare case-insensitively ("a" and "A" are one key);
/// named keys ("ArrowLeft", " ") are kept verbatim.
pub fn normalize_key(key: &str) -> String {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_uppercase().collect(),
        _ => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_four_lane_layout() {
        let cfg = GameConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.lane_count(), 4);
        assert_eq!(cfg.lanes[0], LaneBinding::new("a", "#ff0000"));
        assert!((cfg.hit_line() - 250.0).abs() < 1e-9);
        assert_eq!(cfg.hit_band(), (225.0, 275.0));
    }

    #[test]
    fn normalize_key_uppercases_single_characters_only() {
        assert_eq!(normalize_key("j"), "J");
        assert_eq!(normalize_key(" "), " ");
        assert_eq!(normalize_key("ArrowLeft"), "ArrowLeft");
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = GameConfig::default().with_keys(&["a", "S", "A", "F"]).unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
    }

    #[test]
    fn with_keys_keeps_colors_and_extends_palette() {
        let cfg = GameConfig::default().with_keys(&["j", "k", "l", ";", "h"]).unwrap();
        assert_eq!(cfg.lane_count(), 5);
        assert_eq!(cfg.lanes[0].key, "J");
        assert_eq!(cfg.lanes[0].color, "#ff0000");
        assert_eq!(cfg.lanes[4].color, DEFAULT_COLORS[0]);
    }

    #[test]
    fn empty_lane_set_is_rejected() {
        let keys: [&str; 0] = [];
        assert!(GameConfig::default().with_keys(&keys).is_err());
    }

    #[test]
    fn hit_band_must_fit_inside_field() {
        let cfg = GameConfig { field_length: 260.0, ..GameConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = GameConfig { fall_speed: 0.0, ..GameConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn with_colors_recolors_in_order() {
        let cfg = GameConfig::default().with_colors(&["#111", "#222"]);
        assert_eq!(cfg.lanes[0].color, "#111");
        assert_eq!(cfg.lanes[1].color, "#222");
        assert_eq!(cfg.lanes[2].color, DEFAULT_COLORS[2]);
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn from_json_fills_missing_fields_with_defaults() {
        let cfg = GameConfig::from_json(r#"{"beatInterval": 0.25, "hitAward": 50}"#).unwrap();
        assert_eq!(cfg.beat_interval, 0.25);
        assert_eq!(cfg.hit_award, 50);
        assert_eq!(cfg.lane_count(), 4);
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn from_json_normalizes_and_validates_lanes() {
        let cfg = GameConfig::from_json(
            r##"{"lanes": [{"key": "j", "color": "#fff"}, {"key": "k", "color": "#000"}]}"##,
        )
        .unwrap();
        assert_eq!(cfg.lanes[0].key, "J");
        assert!(GameConfig::from_json(r#"{"lanes": []}"#).is_err());
        assert!(GameConfig::from_json("not json").is_err());
    }
}
