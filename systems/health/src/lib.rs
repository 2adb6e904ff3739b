#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that integrates cluster health once per tick.
//!
//! Penalties are expressed per minute. A tick applies them in proportion to
//! the active play time it covers, so a one-second tick removes one sixtieth.

use std::time::Duration;

use incident_rush_core::{
    ActiveIncident, Severity, Timestamp, CLUSTER_HEALTH_MAX, CLUSTER_HEALTH_MIN,
};
use serde::{Deserialize, Serialize};

/// Tuning knobs of the health model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthTuning {
    /// Penalty per minute contributed by each point of severity.
    pub severity_weight: f64,
    /// Growth of an incident's penalty per minute it stays unresolved.
    pub age_growth_per_minute: f64,
    /// Health regenerated per minute once any incident was resolved.
    pub regeneration_per_minute: f64,
    /// Health granted per point of severity when an incident is resolved.
    pub bonus_per_severity: f64,
    /// Largest health bonus a single resolution may grant.
    pub max_resolution_bonus: f64,
}

impl Default for HealthTuning {
    fn default() -> Self {
        Self {
            severity_weight: 2.0,
            age_growth_per_minute: 0.5,
            regeneration_per_minute: 0.5,
            bonus_per_severity: 2.0,
            max_resolution_bonus: 10.0,
        }
    }
}

/// Outcome of a single health integration step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HealthUpdate {
    /// Health after the step, clamped to `[0, 100]`.
    pub health: f64,
    /// Combined per-minute penalty of all open incidents.
    pub incident_penalty: f64,
    /// Signed change applied before clamping.
    pub delta: f64,
}

impl HealthUpdate {
    /// Reports whether the cluster collapsed during the step.
    #[must_use]
    pub fn collapsed(&self) -> bool {
        self.health <= CLUSTER_HEALTH_MIN
    }
}

/// Health bonus granted for a resolved incident.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolutionBonus {
    /// Bonus granted before clamping.
    pub granted: f64,
    /// Health after applying the bonus.
    pub health: f64,
}

/// Stateless health integrator.
#[derive(Clone, Debug, Default)]
pub struct HealthModel {
    tuning: HealthTuning,
}

impl HealthModel {
    /// Creates a health model from the supplied tuning.
    #[must_use]
    pub fn new(tuning: HealthTuning) -> Self {
        Self { tuning }
    }

    /// Per-minute penalty of a single open incident at `now`.
    ///
    /// The age factor grows without bound.
    #[must_use]
    pub fn incident_penalty(&self, incident: &ActiveIncident, now: Timestamp) -> f64 {
        let age_minutes = incident.age(now).as_secs_f64() / 60.0;
        incident.severity.as_factor()
            * self.tuning.severity_weight
            * (1.0 + self.tuning.age_growth_per_minute * age_minutes)
    }

    /// Advances `health` over a tick covering `elapsed` active play time.
    #[must_use]
    pub fn integrate(
        &self,
        health: f64,
        decay_rate: f64,
        incidents: &[ActiveIncident],
        now: Timestamp,
        regeneration_active: bool,
        elapsed: Duration,
    ) -> HealthUpdate {
        let incident_penalty: f64 = incidents
            .iter()
            .map(|incident| self.incident_penalty(incident, now))
            .sum();
        let minutes = elapsed.as_secs_f64() / 60.0;

        let mut delta = -(incident_penalty + decay_rate) * minutes;
        if regeneration_active {
            delta += self.tuning.regeneration_per_minute * minutes;
        }

        HealthUpdate {
            health: clamp_health(health + delta),
            incident_penalty,
            delta,
        }
    }

    /// Applies the bonus earned by resolving an incident of `severity`.
    #[must_use]
    pub fn resolution_bonus(&self, health: f64, severity: Severity) -> ResolutionBonus {
        let granted = (severity.as_factor() * self.tuning.bonus_per_severity)
            .min(self.tuning.max_resolution_bonus)
            .max(0.0);
        ResolutionBonus {
            granted,
            health: clamp_health(health + granted),
        }
    }
}

/// Clamps a health value into the valid `[0, 100]` range.
#[must_use]
pub fn clamp_health(value: f64) -> f64 {
    if value.is_nan() {
        return CLUSTER_HEALTH_MIN;
    }
    value.clamp(CLUSTER_HEALTH_MIN, CLUSTER_HEALTH_MAX)
}

#[cfg(test)]
mod tests {
    use super::{clamp_health, HealthModel};
    use incident_rush_core::{ActiveIncident, IncidentId, Severity, Timestamp};
    use proptest::prelude::*;
    use std::time::Duration;

    const SECOND: Duration = Duration::from_secs(1);

    fn incident(severity: u32, created_secs: u64) -> ActiveIncident {
        ActiveIncident {
            id: IncidentId::new(severity),
            title: "latency spike".to_owned(),
            severity: Severity::new(severity),
            created_at: Timestamp::from_secs(created_secs),
        }
    }

    #[test]
    fn fresh_incident_penalty_scales_with_severity() {
        let model = HealthModel::default();
        let penalty = model.incident_penalty(&incident(3, 0), Timestamp::ZERO);
        assert!((penalty - 6.0).abs() < 1e-9);
    }

    #[test]
    fn penalty_grows_with_age() {
        let model = HealthModel::default();
        let penalty = model.incident_penalty(&incident(2, 0), Timestamp::from_secs(120));
        assert!((penalty - 8.0).abs() < 1e-9);
    }

    #[test]
    fn idle_cluster_only_decays() {
        let update = HealthModel::default().integrate(100.0, 0.6, &[], Timestamp::ZERO, false, SECOND);
        assert!((update.health - (100.0 - 0.01)).abs() < 1e-9);
        assert!((update.incident_penalty).abs() < 1e-12);
    }

    #[test]
    fn regeneration_offsets_decay() {
        let model = HealthModel::default();
        let update = model.integrate(50.0, 0.5, &[], Timestamp::ZERO, true, SECOND);
        assert!((update.health - 50.0).abs() < 1e-9);
    }

    #[test]
    fn health_never_exceeds_maximum() {
        let update = HealthModel::default().integrate(100.0, 0.0, &[], Timestamp::ZERO, true, SECOND);
        assert!((update.health - 100.0).abs() < 1e-12);
        assert!(update.delta > 0.0);
    }

    #[test]
    fn collapse_is_reported_at_zero() {
        let incidents = vec![incident(5, 0); 20];
        let update = HealthModel::default().integrate(
            1.0,
            1.0,
            &incidents,
            Timestamp::from_secs(60),
            false,
            SECOND,
        );
        assert!(update.collapsed());
        assert!(update.health.abs() < 1e-12);
    }

    #[test]
    fn loss_scales_with_elapsed_time() {
        let model = HealthModel::default();
        let incidents = vec![incident(3, 0)];
        let now = Timestamp::from_secs(30);

        let whole = model.integrate(80.0, 0.4, &incidents, now, false, SECOND);
        let half = Duration::from_millis(500);
        let first = model.integrate(80.0, 0.4, &incidents, now, false, half);
        let second = model.integrate(first.health, 0.4, &incidents, now, false, half);
        assert!((whole.health - second.health).abs() < 1e-9);

        let frozen = model.integrate(80.0, 0.4, &incidents, now, false, Duration::ZERO);
        assert!((frozen.health - 80.0).abs() < 1e-12);
    }

    #[test]
    fn resolution_bonus_is_capped() {
        let model = HealthModel::default();
        let small = model.resolution_bonus(50.0, Severity::new(4));
        assert!((small.granted - 8.0).abs() < 1e-9);
        assert!((small.health - 58.0).abs() < 1e-9);

        let large = model.resolution_bonus(95.0, Severity::new(9));
        assert!((large.granted - 10.0).abs() < 1e-9);
        assert!((large.health - 100.0).abs() < 1e-9);
    }

    #[test]
    fn nan_clamps_to_zero() {
        assert!(clamp_health(f64::NAN).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn integration_stays_clamped(
            health in 0.0f64..=100.0,
            decay in 0.0f64..5.0,
            severities in proptest::collection::vec(0u32..10, 0..12),
            age in 0u64..7_200,
            regen in any::<bool>(),
        ) {
            let incidents: Vec<_> = severities.iter().map(|severity| incident(*severity, 0)).collect();
            let update = HealthModel::default().integrate(
                health,
                decay,
                &incidents,
                Timestamp::from_secs(age),
                regen,
                SECOND,
            );
            prop_assert!((0.0..=100.0).contains(&update.health));
        }
    }
}
