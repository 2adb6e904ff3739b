//! Contracts of the external systems a session drives.

use std::fmt;

use incident_rush_core::{
    ActiveIncident, IncidentMode, IncidentResolution, IncidentStats, ResourceRecord,
};

/// Incident engine that opens, tracks, and resolves incidents.
pub trait IncidentEngine {
    /// Discards every incident and statistic.
    fn reset(&mut self);
    /// Begins producing incidents for `mode`.
    fn start(&mut self, mode: IncidentMode);
    /// Stops producing incidents.
    fn stop(&mut self);
    /// Suspends incident timers.
    fn pause(&mut self);
    /// Resumes incident timers.
    fn resume(&mut self);
    /// Incidents that are currently unresolved.
    fn active_incidents(&self) -> Vec<ActiveIncident>;
    /// Aggregate statistics since the last reset.
    fn stats(&self) -> IncidentStats;
    /// Streak currently held by the responder.
    fn current_combo(&self) -> u32;
    /// Moves queued "incident resolved" notifications into `out`.
    fn drain_resolutions(&mut self, out: &mut Vec<IncidentResolution>);
}

/// Scoring engine that records session outcomes.
pub trait ScoringEngine {
    /// Records the final survival time of a session, in seconds.
    fn record_survival(&mut self, survival_secs: f64);
}

/// Store holding the mock cluster's resources.
pub trait WorldStateStore {
    /// Removes every resource.
    fn clear(&mut self);
    /// Inserts or replaces a resource.
    fn add_resource(&mut self, record: ResourceRecord);
    /// Enumerates the stored resources.
    fn resources(&self) -> Vec<ResourceRecord>;
}

/// Collaborators injected into a session. Absent collaborators turn the
/// corresponding setup steps into no-ops.
#[derive(Default)]
pub struct Collaborators {
    /// Incident engine, if any.
    pub incidents: Option<Box<dyn IncidentEngine>>,
    /// Scoring engine, if any.
    pub scoring: Option<Box<dyn ScoringEngine>>,
    /// World-state store, if any.
    pub world: Option<Box<dyn WorldStateStore>>,
}

impl Collaborators {
    /// Creates an empty collaborator set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches an incident engine.
    #[must_use]
    pub fn with_incidents(mut self, engine: impl IncidentEngine + 'static) -> Self {
        self.incidents = Some(Box::new(engine));
        self
    }

    /// Attaches a scoring engine.
    #[must_use]
    pub fn with_scoring(mut self, engine: impl ScoringEngine + 'static) -> Self {
        self.scoring = Some(Box::new(engine));
        self
    }

    /// Attaches a world-state store.
    #[must_use]
    pub fn with_world(mut self, store: impl WorldStateStore + 'static) -> Self {
        self.world = Some(Box::new(store));
        self
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("incidents", &self.incidents.is_some())
            .field("scoring", &self.scoring.is_some())
            .field("world", &self.world.is_some())
            .finish()
    }
}
