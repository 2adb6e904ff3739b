//! Session configuration and its validation.

use std::time::Duration;

use incident_rush_system_difficulty::DifficultyTuning;
use incident_rush_system_health::HealthTuning;
use incident_rush_system_waves::WaveTuning;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Complete tuning of a survival session.
///
/// Every section falls back to its defaults, so a TOML document only needs
/// to name the values it overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Period of the tick driver in milliseconds.
    pub tick_period_ms: u64,
    /// Difficulty curve.
    pub difficulty: DifficultyTuning,
    /// Health model.
    pub health: HealthTuning,
    /// Wave cadence.
    pub waves: WaveTuning,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 1_000,
            difficulty: DifficultyTuning::default(),
            health: HealthTuning::default(),
            waves: WaveTuning::default(),
        }
    }
}

/// Reasons a session configuration is rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid TOML or does not match the schema.
    #[error("failed to parse session config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The tick period is zero.
    #[error("tick period must be greater than zero")]
    ZeroTickPeriod,
    /// The difficulty cap is zero.
    #[error("difficulty cap must be at least 1, got {0}")]
    InvalidMaxLevel(u32),
    /// A value that must be strictly positive is not.
    #[error("`{field}` must be greater than zero, got {value}")]
    NonPositive {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// A rate that must not be negative is.
    #[error("`{field}` must not be negative, got {value}")]
    Negative {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// Wave incident counts are empty or inverted.
    #[error("wave incident counts are invalid: base {base}, max {max}")]
    InvalidIncidentCounts {
        /// Configured base count.
        base: u32,
        /// Configured maximum count.
        max: u32,
    },
    /// The wave cooldown floor is below one second.
    #[error("wave cooldown floor must be at least one second, got {0}")]
    InvalidCooldown(u64),
}

impl SessionConfig {
    /// Parses a configuration from a TOML document and validates it.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Tick period as a duration.
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Checks every invariant the session relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period_ms == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }
        if self.difficulty.max_level == 0 {
            return Err(ConfigError::InvalidMaxLevel(self.difficulty.max_level));
        }

        positive("difficulty.minutes_per_level", self.difficulty.minutes_per_level)?;
        positive("waves.min_interval_minutes", self.waves.min_interval_minutes)?;

        non_negative("difficulty.chaos_base", self.difficulty.chaos_base)?;
        non_negative("difficulty.chaos_per_minute", self.difficulty.chaos_per_minute)?;
        non_negative("difficulty.decay_per_level", self.difficulty.decay_per_level)?;
        non_negative("health.severity_weight", self.health.severity_weight)?;
        non_negative("health.age_growth_per_minute", self.health.age_growth_per_minute)?;
        non_negative(
            "health.regeneration_per_minute",
            self.health.regeneration_per_minute,
        )?;
        non_negative("health.bonus_per_severity", self.health.bonus_per_severity)?;
        non_negative("health.max_resolution_bonus", self.health.max_resolution_bonus)?;
        non_negative(
            "waves.interval_reduction_per_level",
            self.waves.interval_reduction_per_level,
        )?;

        let (base, max) = (
            self.waves.base_incident_count,
            self.waves.max_incident_count,
        );
        if base == 0 || base > max {
            return Err(ConfigError::InvalidIncidentCounts { base, max });
        }
        if self.waves.min_cooldown_secs < 1 {
            return Err(ConfigError::InvalidCooldown(self.waves.min_cooldown_secs));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}
