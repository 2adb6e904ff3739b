#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc, time::Duration};

use incident_rush_core::{
    ActiveIncident, IncidentId, IncidentMode, IncidentResolution, IncidentStats, ResourceRecord,
    SessionEvent, SessionReport, Severity, Timestamp,
};
use incident_rush_session::{
    Clock, Collaborators, IncidentEngine, ManualClock, ScoringEngine, Session, SessionConfig,
    WorldStateStore,
};

#[derive(Debug, Default)]
pub struct IncidentLog {
    pub calls: Vec<&'static str>,
    pub active: Vec<ActiveIncident>,
    pub queued: Vec<IncidentResolution>,
    pub combo: u32,
    pub next_id: u32,
}

#[derive(Clone, Debug, Default)]
pub struct FakeIncidents(pub Rc<RefCell<IncidentLog>>);

impl IncidentEngine for FakeIncidents {
    fn reset(&mut self) {
        let mut log = self.0.borrow_mut();
        log.calls.push("reset");
        log.active.clear();
        log.queued.clear();
        log.combo = 0;
    }

    fn start(&mut self, mode: IncidentMode) {
        assert_eq!(mode, IncidentMode::Survival);
        self.0.borrow_mut().calls.push("start");
    }

    fn stop(&mut self) {
        self.0.borrow_mut().calls.push("stop");
    }

    fn pause(&mut self) {
        self.0.borrow_mut().calls.push("pause");
    }

    fn resume(&mut self) {
        self.0.borrow_mut().calls.push("resume");
    }

    fn active_incidents(&self) -> Vec<ActiveIncident> {
        self.0.borrow().active.clone()
    }

    fn stats(&self) -> IncidentStats {
        let log = self.0.borrow();
        IncidentStats {
            spawned: log.next_id,
            resolved: 0,
            open: log.active.len() as u32,
            resolved_by_category: Default::default(),
        }
    }

    fn current_combo(&self) -> u32 {
        self.0.borrow().combo
    }

    fn drain_resolutions(&mut self, out: &mut Vec<IncidentResolution>) {
        out.append(&mut self.0.borrow_mut().queued);
    }
}

#[derive(Clone, Debug, Default)]
pub struct FakeScoring(pub Rc<RefCell<Vec<f64>>>);

impl ScoringEngine for FakeScoring {
    fn record_survival(&mut self, survival_secs: f64) {
        self.0.borrow_mut().push(survival_secs);
    }
}

#[derive(Debug, Default)]
pub struct WorldLog {
    pub clears: u32,
    pub resources: Vec<ResourceRecord>,
}

#[derive(Clone, Debug, Default)]
pub struct FakeWorld(pub Rc<RefCell<WorldLog>>);

impl WorldStateStore for FakeWorld {
    fn clear(&mut self) {
        let mut log = self.0.borrow_mut();
        log.clears += 1;
        log.resources.clear();
    }

    fn add_resource(&mut self, record: ResourceRecord) {
        self.0.borrow_mut().resources.push(record);
    }

    fn resources(&self) -> Vec<ResourceRecord> {
        self.0.borrow().resources.clone()
    }
}

/// Session wired to fakes and a manual clock.
pub struct Harness {
    pub session: Session<ManualClock>,
    pub clock: ManualClock,
    pub incidents: FakeIncidents,
    pub scores: FakeScoring,
    pub world: FakeWorld,
    pub events: Vec<SessionEvent>,
    pub reports: Vec<SessionReport>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let clock = ManualClock::new();
        let incidents = FakeIncidents::default();
        let scores = FakeScoring::default();
        let world = FakeWorld::default();
        let collaborators = Collaborators::new()
            .with_incidents(incidents.clone())
            .with_scoring(scores.clone())
            .with_world(world.clone());
        let session =
            Session::new(config, collaborators, clock.clone()).expect("config is valid");
        Self {
            session,
            clock,
            incidents,
            scores,
            world,
            events: Vec::new(),
            reports: Vec::new(),
        }
    }

    pub fn started() -> Self {
        let mut harness = Self::new();
        harness.session.start(&mut harness.events);
        harness
    }

    /// Advances the clock one second at a time, polling after every step.
    pub fn advance_secs(&mut self, seconds: u64) {
        self.advance_by(Duration::from_secs(1), seconds);
    }

    /// Advances the clock by `step` `steps` times, polling after every step.
    pub fn advance_by(&mut self, step: Duration, steps: u64) {
        for _ in 0..steps {
            self.clock.advance(step);
            self.poll();
        }
    }

    pub fn poll(&mut self) {
        if let Some(report) = self.session.poll(&mut self.events) {
            self.reports.push(report);
        }
    }

    pub fn spawn(&mut self, severity: u32) {
        let now = self.clock.now();
        let mut log = self.incidents.0.borrow_mut();
        log.next_id += 1;
        let id = IncidentId::new(log.next_id);
        log.active.push(ActiveIncident {
            id,
            title: format!("incident-{}", id.get()),
            severity: Severity::new(severity),
            created_at: now,
        });
    }

    pub fn clear_incidents(&mut self) {
        self.incidents.0.borrow_mut().active.clear();
    }

    pub fn queue_resolution(&mut self, xp_earned: u64, combo: u32, severity: u32) {
        let mut log = self.incidents.0.borrow_mut();
        log.combo = combo;
        log.queued.push(IncidentResolution {
            xp_earned,
            combo,
            severity: Severity::new(severity),
        });
    }

    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn count(&self, name: &str) -> usize {
        self.events.iter().filter(|event| event.name() == name).count()
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}
