#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that maps active survival time onto difficulty pressure.

use serde::{Deserialize, Serialize};

const SECONDS_PER_MINUTE: f64 = 60.0;

/// Tuning knobs of the difficulty curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTuning {
    /// Minutes of active play required to climb one level.
    pub minutes_per_level: f64,
    /// Highest reachable level.
    pub max_level: u32,
    /// Chaos budget at the very start of play.
    pub chaos_base: f64,
    /// Chaos budget gained per minute of active play.
    pub chaos_per_minute: f64,
    /// Health decay rate contributed by every level.
    pub decay_per_level: f64,
}

impl Default for DifficultyTuning {
    fn default() -> Self {
        Self {
            minutes_per_level: 2.0,
            max_level: 10,
            chaos_base: 1.0,
            chaos_per_minute: 0.5,
            decay_per_level: 0.1,
        }
    }
}

/// Quantities derived from survival time on every tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifficultySnapshot {
    /// Survival time expressed in minutes.
    pub minutes: f64,
    /// Difficulty level in `[1, max_level]`.
    pub level: u32,
    /// Abstract pressure metric exposed for presentation.
    pub chaos_budget: f64,
    /// Baseline health decay applied regardless of open incidents.
    pub health_decay_rate: f64,
}

/// Stateless difficulty curve.
#[derive(Clone, Debug, Default)]
pub struct Difficulty {
    tuning: DifficultyTuning,
}

impl Difficulty {
    /// Creates a difficulty curve from the supplied tuning.
    #[must_use]
    pub fn new(tuning: DifficultyTuning) -> Self {
        Self { tuning }
    }

    /// Derives the difficulty pressure for `survival_secs` seconds of active play.
    ///
    /// Negative inputs are treated as zero so a clock hiccup can never push
    /// the level below one.
    #[must_use]
    pub fn derive(&self, survival_secs: f64) -> DifficultySnapshot {
        let minutes = survival_secs.max(0.0) / SECONDS_PER_MINUTE;
        let level = self.level_at(minutes);
        DifficultySnapshot {
            minutes,
            level,
            chaos_budget: self.tuning.chaos_base + self.tuning.chaos_per_minute * minutes,
            health_decay_rate: self.tuning.decay_per_level * f64::from(level),
        }
    }

    fn level_at(&self, minutes: f64) -> u32 {
        let cap = self.tuning.max_level.max(1);
        if self.tuning.minutes_per_level <= 0.0 {
            return cap;
        }

        let climbed = (minutes / self.tuning.minutes_per_level).floor();
        if climbed >= f64::from(cap) {
            return cap;
        }
        (1 + climbed as u32).min(cap)
    }
}
