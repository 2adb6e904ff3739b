#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Incident Rush engine.
//!
//! This crate defines the vocabulary that connects the session state machine,
//! its external collaborators, and presentation adapters. The session mutates
//! its own state in response to ticks and resolution notifications, then
//! broadcasts [`SessionEvent`] values describing what changed. Adapters never
//! mutate the session directly; they read events and query [`SessionStatus`]
//! snapshots.

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};

/// Upper bound of the aggregate cluster health.
pub const CLUSTER_HEALTH_MAX: f64 = 100.0;

/// Lower bound of the aggregate cluster health; reaching it ends the session.
pub const CLUSTER_HEALTH_MIN: f64 = 0.0;

/// Lifecycle states of a survival session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// No session is running.
    #[default]
    Idle,
    /// The session is live and accepting ticks.
    Playing,
    /// The session is suspended; survival time is frozen.
    Paused,
    /// Cluster health collapsed; only the terminal report remains.
    GameOver,
}

/// Mode requested from the incident collaborator when a session starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentMode {
    /// Timed survival against escalating waves.
    Survival,
}

/// Monotonic instant measured from an arbitrary clock origin.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Timestamp(Duration);

impl Timestamp {
    /// Origin of the clock.
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Creates a timestamp located `offset` after the clock origin.
    #[must_use]
    pub const fn from_offset(offset: Duration) -> Self {
        Self(offset)
    }

    /// Creates a timestamp located the provided number of whole seconds after the origin.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// Offset of the timestamp from the clock origin.
    #[must_use]
    pub const fn offset(&self) -> Duration {
        self.0
    }

    /// Time elapsed since `earlier`, or zero when `earlier` lies in the future.
    #[must_use]
    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }

    /// Returns the timestamp advanced by `delta`.
    #[must_use]
    pub fn saturating_add(self, delta: Duration) -> Self {
        Self(self.0.saturating_add(delta))
    }
}

/// Unique identifier assigned to an incident by the incident collaborator.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct IncidentId(u32);

impl IncidentId {
    /// Creates a new incident identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Impact rating of an incident; higher values hurt the cluster faster.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Severity(u32);

impl Severity {
    /// Creates a severity rating.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the raw severity rating.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Severity expressed as a floating point factor for health arithmetic.
    #[must_use]
    pub fn as_factor(&self) -> f64 {
        f64::from(self.0)
    }
}

/// Read-only view of an unresolved incident reported by the incident collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveIncident {
    /// Identifier allocated by the incident collaborator.
    pub id: IncidentId,
    /// Short human readable summary of the problem.
    pub title: String,
    /// Impact rating of the incident.
    pub severity: Severity,
    /// Instant the incident was opened.
    pub created_at: Timestamp,
}

impl ActiveIncident {
    /// Time the incident has remained unresolved at `now`.
    #[must_use]
    pub fn age(&self, now: Timestamp) -> Duration {
        now.saturating_since(self.created_at)
    }
}

/// Payload carried by an "incident resolved" notification.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IncidentResolution {
    /// Experience awarded for the resolution.
    pub xp_earned: u64,
    /// Streak counter reported by the incident collaborator.
    pub combo: u32,
    /// Severity of the incident that was resolved.
    pub severity: Severity,
}

/// Aggregate statistics reported by the incident collaborator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentStats {
    /// Number of incidents opened since the collaborator was last reset.
    pub spawned: u32,
    /// Number of incidents resolved since the collaborator was last reset.
    pub resolved: u32,
    /// Number of incidents still open.
    pub open: u32,
    /// Resolution counts keyed by incident category.
    pub resolved_by_category: BTreeMap<String, u32>,
}

/// Kinds of resources present in the mock cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Worker machine hosting pods.
    Node,
    /// Controller that keeps a set of pods running.
    Deployment,
    /// Single scheduled workload.
    Pod,
    /// Stable network endpoint in front of pods.
    Service,
    /// Key/value configuration object.
    ConfigMap,
}

/// Resource record stored by the world-state collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Kind of the resource.
    pub kind: ResourceKind,
    /// Namespace the resource lives in.
    pub namespace: String,
    /// Name unique within the kind and namespace.
    pub name: String,
}

impl ResourceRecord {
    /// Creates a new resource record.
    #[must_use]
    pub fn new(kind: ResourceKind, namespace: &str, name: &str) -> Self {
        Self {
            kind,
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        }
    }

    /// Identity of the resource in `kind/namespace/name` form.
    #[must_use]
    pub fn identity(&self) -> String {
        format!("{:?}/{}/{}", self.kind, self.namespace, self.name)
    }
}

const BASELINE_NODES: [&str; 3] = ["node-a", "node-b", "node-c"];
const BASELINE_APPS: [(&str, u32); 3] = [("frontend", 3), ("api", 2), ("worker", 2)];

/// Fixed cluster topology seeded into the world-state store at session start.
///
/// Every application contributes a deployment, its replica pods, and a
/// service. Ordering is deterministic so presentation layers can diff it.
#[must_use]
pub fn baseline_topology() -> Vec<ResourceRecord> {
    let mut records = Vec::new();
    for node in BASELINE_NODES {
        records.push(ResourceRecord::new(ResourceKind::Node, "", node));
    }

    for (app, replicas) in BASELINE_APPS {
        records.push(ResourceRecord::new(ResourceKind::Deployment, "default", app));
        for replica in 0..replicas {
            let pod = format!("{app}-{replica}");
            records.push(ResourceRecord::new(ResourceKind::Pod, "default", &pod));
        }
        records.push(ResourceRecord::new(ResourceKind::Service, "default", app));
    }

    records.push(ResourceRecord::new(
        ResourceKind::ConfigMap,
        "default",
        "cluster-settings",
    ));
    records
}

/// Display values broadcast after every tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TickSummary {
    /// Whole seconds of active play.
    pub survival_time: u64,
    /// Current difficulty level.
    pub difficulty_level: u32,
    /// Chaos budget rounded to two decimals.
    pub chaos_budget: f64,
    /// Cluster health rounded to one decimal.
    pub cluster_health: f64,
    /// Number of incidents currently open.
    pub active_incident_count: usize,
    /// Incidents resolved during the session.
    pub incidents_resolved: u32,
    /// Streak currently reported by the incident collaborator.
    pub current_combo: u32,
    /// Longest streak observed during the session.
    pub highest_combo: u32,
    /// Experience accumulated during the session.
    pub total_xp: u64,
    /// Number of waves announced so far.
    pub wave_number: u32,
}

/// Terminal report assembled when the cluster collapses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Whole seconds of active play.
    pub survival_time: u64,
    /// Difficulty level reached.
    pub difficulty_reached: u32,
    /// Incidents resolved during the session.
    pub incidents_resolved: u32,
    /// Longest streak observed during the session.
    pub highest_combo: u32,
    /// Experience accumulated during the session.
    pub total_xp: u64,
    /// Number of waves announced before the collapse.
    pub waves_reached: u32,
    /// Statistics reported by the incident collaborator.
    pub incident_breakdown: IncidentStats,
}

/// Notifications broadcast by the session after processing an operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A fresh session began.
    Started {
        /// Topology seeded into the world-state store.
        topology: Vec<ResourceRecord>,
        /// Difficulty level at the start of play.
        difficulty_level: u32,
    },
    /// A tick completed.
    Tick(TickSummary),
    /// A new wave boundary was announced.
    Wave {
        /// Sequence number of the wave, starting at one.
        wave_number: u32,
        /// Number of incidents the incident collaborator should open.
        incident_count: u32,
        /// Difficulty level when the wave started.
        difficulty_level: u32,
    },
    /// An incident resolution was applied to the session.
    IncidentResolved {
        /// Experience awarded for the resolution.
        xp_earned: u64,
        /// Streak reported with the resolution.
        combo: u32,
        /// Health bonus granted for the resolution.
        health_recovered: f64,
        /// Cluster health after applying the bonus.
        cluster_health: f64,
    },
    /// The cluster collapsed and the session ended.
    GameOver(SessionReport),
    /// The session was paused.
    Paused {
        /// Whole seconds of active play when the pause began.
        survival_time: u64,
    },
    /// The session resumed from a pause.
    Resumed,
    /// The session was abandoned and returned to idle.
    Exited,
}

impl SessionEvent {
    /// Stable notification name consumed by presentation layers.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "session:started",
            Self::Tick(_) => "session:tick",
            Self::Wave { .. } => "session:wave",
            Self::IncidentResolved { .. } => "session:incident-resolved",
            Self::GameOver(_) => "session:game-over",
            Self::Paused { .. } => "session:paused",
            Self::Resumed => "session:resumed",
            Self::Exited => "session:exited",
        }
    }
}

/// Point-in-time snapshot of every session field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Current lifecycle state.
    pub state: LifecycleState,
    /// Seconds of active play, unrounded.
    pub survival_time: f64,
    /// Total time spent paused.
    pub accumulated_pause: Duration,
    /// Current difficulty level.
    pub difficulty_level: u32,
    /// Current chaos budget.
    pub chaos_budget: f64,
    /// Health lost per minute independent of incidents.
    pub health_decay_rate: f64,
    /// Aggregate cluster health in `[0, 100]`.
    pub cluster_health: f64,
    /// Number of waves announced so far.
    pub wave_number: u32,
    /// Incident count of the latest wave.
    pub wave_incident_count: u32,
    /// Whether the wave cooldown is armed.
    pub wave_cooldown: bool,
    /// Whole seconds of active play left on the wave cooldown, rounded up.
    pub wave_cooldown_timer: i64,
    /// Incidents resolved during the session.
    pub incidents_resolved: u32,
    /// Experience accumulated during the session.
    pub total_xp: u64,
    /// Longest streak observed during the session.
    pub highest_combo: u32,
    /// Incidents currently open.
    pub active_incidents: Vec<ActiveIncident>,
}

#[cfg(test)]
mod tests {
    use super::{
        baseline_topology, ActiveIncident, IncidentId, ResourceKind, SessionEvent, Severity,
        Timestamp,
    };
    use std::{collections::HashSet, time::Duration};

    #[test]
    fn timestamp_difference_saturates() {
        let early = Timestamp::from_secs(5);
        let late = Timestamp::from_secs(8);
        assert_eq!(late.saturating_since(early), Duration::from_secs(3));
        assert_eq!(early.saturating_since(late), Duration::ZERO);
    }

    #[test]
    fn incident_age_is_measured_from_creation() {
        let incident = ActiveIncident {
            id: IncidentId::new(1),
            title: "disk pressure".to_owned(),
            severity: Severity::new(3),
            created_at: Timestamp::from_secs(30),
        };
        assert_eq!(incident.age(Timestamp::from_secs(90)), Duration::from_secs(60));
        assert_eq!(incident.age(Timestamp::from_secs(10)), Duration::ZERO);
    }

    #[test]
    fn baseline_topology_has_unique_identities() {
        let topology = baseline_topology();
        let identities: HashSet<String> = topology.iter().map(|record| record.identity()).collect();
        assert_eq!(identities.len(), topology.len());
        assert_eq!(
            topology
                .iter()
                .filter(|record| record.kind == ResourceKind::Node)
                .count(),
            3
        );
    }

    #[test]
    fn event_names_follow_session_namespace() {
        assert_eq!(SessionEvent::Resumed.name(), "session:resumed");
        assert_eq!(SessionEvent::Exited.name(), "session:exited");
        assert!(SessionEvent::Paused { survival_time: 3 }
            .name()
            .starts_with("session:"));
    }

    #[test]
    fn events_survive_bincode_transport() {
        let event = SessionEvent::Wave {
            wave_number: 4,
            incident_count: 2,
            difficulty_level: 3,
        };
        let bytes = bincode::serialize(&event).expect("serialize");
        let restored: SessionEvent = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, event);
    }
}
