#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave cadence system that announces spawn boundaries.
//!
//! The scheduler never creates incidents. It only decides when a wave starts
//! and how many incidents the incident collaborator should open for it. Each
//! call to [`WaveScheduler::advance`] represents one tick and starts at most
//! one wave. Cooldowns are measured in active play time, so the cadence does
//! not depend on the tick period.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning knobs of the wave cadence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    /// Minutes between waves at difficulty zero.
    pub base_interval_minutes: f64,
    /// Minutes removed from the interval per difficulty level.
    pub interval_reduction_per_level: f64,
    /// Shortest allowed interval in minutes.
    pub min_interval_minutes: f64,
    /// Incidents in the earliest waves.
    pub base_incident_count: u32,
    /// Waves required before the incident count grows by one.
    pub waves_per_extra_incident: u32,
    /// Largest incident count of a single wave.
    pub max_incident_count: u32,
    /// Cooldown in seconds at difficulty zero.
    pub base_cooldown_secs: u64,
    /// Shortest allowed cooldown in seconds.
    pub min_cooldown_secs: u64,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            base_interval_minutes: 3.0,
            interval_reduction_per_level: 0.2,
            min_interval_minutes: 1.0,
            base_incident_count: 1,
            waves_per_extra_incident: 3,
            max_incident_count: 5,
            base_cooldown_secs: 15,
            min_cooldown_secs: 5,
        }
    }
}

/// Description of a wave that just started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveStart {
    /// Sequence number of the wave, starting at one.
    pub wave_number: u32,
    /// Number of incidents requested for the wave.
    pub incident_count: u32,
    /// Difficulty level when the wave started.
    pub difficulty_level: u32,
}

/// Stateful wave cadence tracker owned by a session.
#[derive(Clone, Debug)]
pub struct WaveScheduler {
    tuning: WaveTuning,
    wave_number: u32,
    incident_count: u32,
    cooldown: bool,
    cooldown_remaining: Duration,
}

impl WaveScheduler {
    /// Creates a scheduler positioned before the first wave.
    #[must_use]
    pub fn new(tuning: WaveTuning) -> Self {
        let incident_count = tuning.base_incident_count.max(1);
        Self {
            tuning,
            wave_number: 0,
            incident_count,
            cooldown: false,
            cooldown_remaining: Duration::ZERO,
        }
    }

    /// Number of waves started so far.
    #[must_use]
    pub const fn wave_number(&self) -> u32 {
        self.wave_number
    }

    /// Incident count of the latest wave.
    #[must_use]
    pub const fn incident_count(&self) -> u32 {
        self.incident_count
    }

    /// Reports whether a cooldown currently gates the next wave.
    #[must_use]
    pub const fn cooldown_active(&self) -> bool {
        self.cooldown
    }

    /// Active time left before the cooldown expires.
    #[must_use]
    pub const fn cooldown_remaining(&self) -> Duration {
        self.cooldown_remaining
    }

    /// Minutes between waves at `level`.
    #[must_use]
    pub fn interval_minutes(&self, level: u32) -> f64 {
        let interval = self.tuning.base_interval_minutes
            - self.tuning.interval_reduction_per_level * f64::from(level);
        interval.max(self.tuning.min_interval_minutes).max(f64::EPSILON)
    }

    /// Cooldown armed after a wave that started at `level`.
    #[must_use]
    pub fn cooldown(&self, level: u32) -> Duration {
        let secs = self
            .tuning
            .base_cooldown_secs
            .saturating_sub(u64::from(level))
            .max(self.tuning.min_cooldown_secs);
        Duration::from_secs(secs)
    }

    /// Evaluates one tick covering `elapsed` active time and reports a wave
    /// start, if any. `minutes` is the total active play time.
    pub fn advance(&mut self, minutes: f64, level: u32, elapsed: Duration) -> Option<WaveStart> {
        if self.cooldown {
            self.cooldown_remaining = self.cooldown_remaining.saturating_sub(elapsed);
            if !self.cooldown_remaining.is_zero() {
                return None;
            }
            self.cooldown = false;
            return Some(self.start_wave(level));
        }

        let expected = self.expected_wave(minutes, level);
        if expected > u64::from(self.wave_number) {
            return Some(self.start_wave(level));
        }
        None
    }

    fn expected_wave(&self, minutes: f64, level: u32) -> u64 {
        let elapsed_intervals = (minutes.max(0.0) / self.interval_minutes(level)).floor();
        if elapsed_intervals >= u64::MAX as f64 {
            return u64::MAX;
        }
        (elapsed_intervals as u64).saturating_add(1)
    }

    fn start_wave(&mut self, level: u32) -> WaveStart {
        self.wave_number = self.wave_number.saturating_add(1);
        self.incident_count = self.incident_count_for(self.wave_number);
        self.cooldown = true;
        self.cooldown_remaining = self.cooldown(level);
        WaveStart {
            wave_number: self.wave_number,
            incident_count: self.incident_count,
            difficulty_level: level,
        }
    }

    fn incident_count_for(&self, wave_number: u32) -> u32 {
        let growth = match self.tuning.waves_per_extra_incident {
            0 => 0,
            per_step => wave_number / per_step,
        };
        self.tuning
            .base_incident_count
            .saturating_add(growth)
            .min(self.tuning.max_incident_count)
            .max(1)
    }
}

impl Default for WaveScheduler {
    fn default() -> Self {
        Self::new(WaveTuning::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{WaveScheduler, WaveTuning};
    use std::time::Duration;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn first_tick_opens_wave_one() {
        let mut scheduler = WaveScheduler::default();
        let start = scheduler.advance(0.0, 1, SECOND).expect("first wave");
        assert_eq!(start.wave_number, 1);
        assert_eq!(start.incident_count, 1);
        assert!(scheduler.cooldown_active());
        assert_eq!(scheduler.cooldown_remaining(), Duration::from_secs(14));
    }

    #[test]
    fn cooldown_drains_by_elapsed_time() {
        let mut scheduler = WaveScheduler::default();
        let _ = scheduler.advance(0.0, 1, SECOND);

        let half = Duration::from_millis(500);
        for _ in 0..27 {
            assert!(scheduler.advance(0.1, 1, half).is_none());
        }
        assert_eq!(scheduler.cooldown_remaining(), half);
        let start = scheduler.advance(0.2, 1, half).expect("second wave");
        assert_eq!(start.wave_number, 2);
    }

    #[test]
    fn zero_elapsed_keeps_the_cooldown() {
        let mut scheduler = WaveScheduler::default();
        let _ = scheduler.advance(0.0, 1, SECOND);
        assert!(scheduler.advance(0.0, 1, Duration::ZERO).is_none());
        assert_eq!(scheduler.cooldown_remaining(), Duration::from_secs(14));
    }

    #[test]
    fn interval_shrinks_and_floors() {
        let scheduler = WaveScheduler::default();
        assert!((scheduler.interval_minutes(1) - 2.8).abs() < 1e-9);
        assert!((scheduler.interval_minutes(10) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cooldown_is_floored() {
        let scheduler = WaveScheduler::default();
        assert_eq!(scheduler.cooldown(1), Duration::from_secs(14));
        assert_eq!(scheduler.cooldown(10), Duration::from_secs(5));
        assert_eq!(scheduler.cooldown(40), Duration::from_secs(5));
    }

    #[test]
    fn incident_count_is_capped() {
        let scheduler = WaveScheduler::default();
        assert_eq!(scheduler.incident_count_for(2), 1);
        assert_eq!(scheduler.incident_count_for(3), 2);
        assert_eq!(scheduler.incident_count_for(12), 5);
        assert_eq!(scheduler.incident_count_for(400), 5);
    }

    #[test]
    fn zero_growth_step_keeps_base_count() {
        let scheduler = WaveScheduler::new(WaveTuning {
            waves_per_extra_incident: 0,
            ..WaveTuning::default()
        });
        assert_eq!(scheduler.incident_count_for(9), 1);
    }
}
