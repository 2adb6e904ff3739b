//! In-process collaborators that let the CLI play a session without a UI.

use std::{cell::RefCell, collections::BTreeMap, rc::Rc, time::Duration};

use incident_rush_core::{
    ActiveIncident, IncidentId, IncidentMode, IncidentResolution, IncidentStats, ResourceRecord,
    Severity, Timestamp,
};
use incident_rush_session::{IncidentEngine, ScoringEngine, WorldStateStore};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const CATALOG: [(&str, &str); 6] = [
    ("CrashLoopBackOff in frontend", "pods"),
    ("Node reports NotReady", "nodes"),
    ("Service has no ready endpoints", "networking"),
    ("ConfigMap drifted from source", "config"),
    ("Container OOMKilled", "pods"),
    ("Certificate about to expire", "security"),
];

/// Unresolved incidents older than this break the responder's streak.
const COMBO_BREAK_AGE: Duration = Duration::from_secs(90);
const XP_PER_SEVERITY: u64 = 25;
const XP_PER_COMBO: u64 = 5;

#[derive(Debug)]
struct OpenIncident {
    incident: ActiveIncident,
    category: &'static str,
}

#[derive(Debug)]
struct IncidentFloor {
    rng: ChaCha8Rng,
    resolve_chance: f64,
    running: bool,
    paused: bool,
    next_id: u32,
    combo: u32,
    open: Vec<OpenIncident>,
    queued: Vec<IncidentResolution>,
    stats: IncidentStats,
}

/// Seeded incident engine with a simulated responder.
///
/// Cloned handles share state; the session owns one while the driver keeps
/// another to spawn waves and let the responder work.
#[derive(Clone, Debug)]
pub(crate) struct SimulatedIncidents {
    floor: Rc<RefCell<IncidentFloor>>,
}

impl SimulatedIncidents {
    pub(crate) fn new(seed: u64, resolve_chance: f64) -> Self {
        Self {
            floor: Rc::new(RefCell::new(IncidentFloor {
                rng: ChaCha8Rng::seed_from_u64(seed),
                resolve_chance: resolve_chance.clamp(0.0, 1.0),
                running: false,
                paused: false,
                next_id: 0,
                combo: 0,
                open: Vec::new(),
                queued: Vec::new(),
                stats: IncidentStats::default(),
            })),
        }
    }

    /// Opens `count` incidents whose severity scales with `difficulty_level`.
    pub(crate) fn spawn_wave(&self, count: u32, difficulty_level: u32, now: Timestamp) {
        let mut floor = self.floor.borrow_mut();
        if !floor.running || floor.paused {
            return;
        }

        let max_severity = (1 + difficulty_level / 2).min(5);
        for _ in 0..count {
            let (title, category) = CATALOG[floor.rng.gen_range(0..CATALOG.len())];
            let severity = Severity::new(floor.rng.gen_range(1..=max_severity));
            floor.next_id += 1;
            let incident = ActiveIncident {
                id: IncidentId::new(floor.next_id),
                title: title.to_owned(),
                severity,
                created_at: now,
            };
            floor.open.push(OpenIncident { incident, category });
            floor.stats.spawned += 1;
        }
        floor.stats.open = floor.open.len() as u32;
    }

    /// Gives the responder one chance to resolve the oldest incident.
    pub(crate) fn respond(&self, now: Timestamp) {
        let mut floor = self.floor.borrow_mut();
        if !floor.running || floor.paused || floor.open.is_empty() {
            return;
        }

        if floor
            .open
            .iter()
            .any(|open| open.incident.age(now) > COMBO_BREAK_AGE)
        {
            floor.combo = 0;
        }

        let chance = floor.resolve_chance;
        if !floor.rng.gen_bool(chance) {
            return;
        }

        let resolved = floor.open.remove(0);
        floor.combo += 1;
        let severity = resolved.incident.severity;
        let xp_earned =
            u64::from(severity.get()) * XP_PER_SEVERITY + u64::from(floor.combo) * XP_PER_COMBO;
        let combo = floor.combo;
        floor.queued.push(IncidentResolution {
            xp_earned,
            combo,
            severity,
        });

        floor.stats.resolved += 1;
        floor.stats.open = floor.open.len() as u32;
        *floor
            .stats
            .resolved_by_category
            .entry(resolved.category.to_owned())
            .or_insert(0) += 1;
    }
}

impl IncidentEngine for SimulatedIncidents {
    fn reset(&mut self) {
        let mut floor = self.floor.borrow_mut();
        floor.running = false;
        floor.paused = false;
        floor.next_id = 0;
        floor.combo = 0;
        floor.open.clear();
        floor.queued.clear();
        floor.stats = IncidentStats::default();
    }

    fn start(&mut self, _mode: IncidentMode) {
        let mut floor = self.floor.borrow_mut();
        floor.running = true;
        floor.paused = false;
    }

    fn stop(&mut self) {
        self.floor.borrow_mut().running = false;
    }

    fn pause(&mut self) {
        self.floor.borrow_mut().paused = true;
    }

    fn resume(&mut self) {
        self.floor.borrow_mut().paused = false;
    }

    fn active_incidents(&self) -> Vec<ActiveIncident> {
        self.floor
            .borrow()
            .open
            .iter()
            .map(|open| open.incident.clone())
            .collect()
    }

    fn stats(&self) -> IncidentStats {
        self.floor.borrow().stats.clone()
    }

    fn current_combo(&self) -> u32 {
        self.floor.borrow().combo
    }

    fn drain_resolutions(&mut self, out: &mut Vec<IncidentResolution>) {
        out.append(&mut self.floor.borrow_mut().queued);
    }
}

/// Scoring engine remembering the best survival time across runs.
#[derive(Clone, Debug, Default)]
pub(crate) struct Leaderboard {
    runs: Rc<RefCell<Vec<f64>>>,
}

impl Leaderboard {
    pub(crate) fn best(&self) -> Option<f64> {
        self.runs.borrow().iter().copied().reduce(f64::max)
    }
}

impl ScoringEngine for Leaderboard {
    fn record_survival(&mut self, survival_secs: f64) {
        self.runs.borrow_mut().push(survival_secs);
    }
}

/// World-state store keyed by resource identity.
#[derive(Clone, Debug, Default)]
pub(crate) struct InMemoryWorld {
    resources: Rc<RefCell<BTreeMap<String, ResourceRecord>>>,
}

impl WorldStateStore for InMemoryWorld {
    fn clear(&mut self) {
        self.resources.borrow_mut().clear();
    }

    fn add_resource(&mut self, record: ResourceRecord) {
        let _ = self
            .resources
            .borrow_mut()
            .insert(record.identity(), record);
    }

    fn resources(&self) -> Vec<ResourceRecord> {
        self.resources.borrow().values().cloned().collect()
    }
}
