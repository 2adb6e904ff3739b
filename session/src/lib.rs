#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative survival session state machine for Incident Rush.
//!
//! A [`Session`] owns difficulty progression, cluster health, wave cadence,
//! and the `Idle -> Playing <-> Paused -> GameOver` lifecycle. A driver calls
//! [`Session::poll`] (or [`Session::tick`] directly) once per period, and
//! every operation appends the [`SessionEvent`] values it produced to a
//! caller supplied buffer. All mutation happens through `&mut self`, so ticks
//! and resolution notifications are serialised by construction.

mod clock;
mod collaborators;
mod config;
mod ticker;

use std::{mem, time::Duration};

use incident_rush_core::{
    baseline_topology, ActiveIncident, IncidentMode, IncidentResolution, LifecycleState,
    SessionEvent, SessionReport, SessionStatus, TickSummary, Timestamp, CLUSTER_HEALTH_MAX,
};
use incident_rush_system_difficulty::{Difficulty, DifficultySnapshot};
use incident_rush_system_health::{HealthModel, HealthUpdate};
use incident_rush_system_waves::{WaveScheduler, WaveTuning};
use tracing::{debug, info, trace};

pub use clock::{Clock, ManualClock, SystemClock};
pub use collaborators::{Collaborators, IncidentEngine, ScoringEngine, WorldStateStore};
pub use config::{ConfigError, SessionConfig};
pub use ticker::Ticker;

/// Every mutable session field. Replaced wholesale on start so that no
/// field can survive a restart by accident.
#[derive(Clone, Debug)]
struct Progress {
    lifecycle: LifecycleState,
    started_at: Timestamp,
    pause_started_at: Option<Timestamp>,
    accumulated_pause: Duration,
    active_time: Duration,
    survival_time: f64,
    difficulty_level: u32,
    chaos_budget: f64,
    health_decay_rate: f64,
    cluster_health: f64,
    waves: WaveScheduler,
    incidents_resolved: u32,
    total_xp: u64,
    highest_combo: u32,
}

impl Progress {
    fn fresh(started_at: Timestamp, difficulty: &Difficulty, waves: &WaveTuning) -> Self {
        let initial = difficulty.derive(0.0);
        Self {
            lifecycle: LifecycleState::Idle,
            started_at,
            pause_started_at: None,
            accumulated_pause: Duration::ZERO,
            active_time: Duration::ZERO,
            survival_time: 0.0,
            difficulty_level: initial.level,
            chaos_budget: initial.chaos_budget,
            health_decay_rate: initial.health_decay_rate,
            cluster_health: CLUSTER_HEALTH_MAX,
            waves: WaveScheduler::new(waves.clone()),
            incidents_resolved: 0,
            total_xp: 0,
            highest_combo: 0,
        }
    }
}

/// Real-time survival session.
#[derive(Debug)]
pub struct Session<C> {
    config: SessionConfig,
    difficulty: Difficulty,
    health: HealthModel,
    clock: C,
    ticker: Ticker,
    collaborators: Collaborators,
    subscribed: bool,
    pending_resolutions: Vec<IncidentResolution>,
    progress: Progress,
}

impl<C: Clock> Session<C> {
    /// Creates an idle session after validating `config`.
    pub fn new(
        config: SessionConfig,
        collaborators: Collaborators,
        clock: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let difficulty = Difficulty::new(config.difficulty.clone());
        let health = HealthModel::new(config.health.clone());
        let progress = Progress::fresh(clock.now(), &difficulty, &config.waves);
        Ok(Self {
            ticker: Ticker::new(config.tick_period()),
            config,
            difficulty,
            health,
            clock,
            collaborators,
            subscribed: false,
            pending_resolutions: Vec::new(),
            progress,
        })
    }

    /// Configuration the session was built with.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.progress.lifecycle
    }

    /// Periodic timer gating [`Session::poll`].
    #[must_use]
    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Clock the session reads.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Resets every field, seeds the baseline topology, and begins play.
    pub fn start(&mut self, out: &mut Vec<SessionEvent>) {
        self.ticker.cancel();
        let now = self.clock.now();
        self.progress = Progress::fresh(now, &self.difficulty, &self.config.waves);
        self.pending_resolutions.clear();

        let topology = baseline_topology();
        if let Some(world) = self.collaborators.world.as_mut() {
            world.clear();
            for record in &topology {
                world.add_resource(record.clone());
            }
        }

        if let Some(incidents) = self.collaborators.incidents.as_mut() {
            incidents.reset();
            incidents.start(IncidentMode::Survival);
        }

        self.progress.lifecycle = LifecycleState::Playing;
        self.ticker.arm(now);
        self.subscribed = true;

        info!(
            resources = topology.len(),
            difficulty = self.progress.difficulty_level,
            "session started"
        );
        out.push(SessionEvent::Started {
            topology,
            difficulty_level: self.progress.difficulty_level,
        });
    }

    /// Processes queued resolution notifications, then runs a tick if one is due.
    ///
    /// At most one tick runs per call, and resolutions are never applied in
    /// the middle of a tick.
    pub fn poll(&mut self, out: &mut Vec<SessionEvent>) -> Option<SessionReport> {
        self.pump_resolutions(out);
        let now = self.clock.now();
        if !self.ticker.fire_if_due(now) {
            return None;
        }
        self.tick(out)
    }

    /// Advances the session by one tick. Does nothing unless playing.
    ///
    /// Returns the terminal report when the cluster collapsed during this tick.
    pub fn tick(&mut self, out: &mut Vec<SessionEvent>) -> Option<SessionReport> {
        if self.progress.lifecycle != LifecycleState::Playing {
            return None;
        }

        let now = self.clock.now();
        let active = now
            .saturating_since(self.progress.started_at)
            .saturating_sub(self.progress.accumulated_pause);
        let elapsed = active.saturating_sub(self.progress.active_time);
        self.progress.active_time = self.progress.active_time.max(active);
        self.progress.survival_time = self.progress.active_time.as_secs_f64();

        let incidents = self.active_incidents();
        let difficulty = self.derive_difficulty();
        let health = self.derive_health(&incidents, now, elapsed);
        self.derive_wave(&difficulty, elapsed, out);
        let report = health.collapsed().then(|| self.game_over(out));

        let summary = self.tick_summary(incidents.len());
        trace!(
            survival = summary.survival_time,
            health = summary.cluster_health,
            penalty = health.incident_penalty,
            delta = health.delta,
            difficulty = summary.difficulty_level,
            "tick"
        );
        out.push(SessionEvent::Tick(summary));
        report
    }

    /// Applies an "incident resolved" notification. Ignored unless playing.
    pub fn on_incident_resolved(
        &mut self,
        resolution: IncidentResolution,
        out: &mut Vec<SessionEvent>,
    ) {
        if self.progress.lifecycle != LifecycleState::Playing {
            return;
        }

        let progress = &mut self.progress;
        progress.incidents_resolved = progress.incidents_resolved.saturating_add(1);
        progress.total_xp = progress.total_xp.saturating_add(resolution.xp_earned);
        progress.highest_combo = progress.highest_combo.max(resolution.combo);

        let bonus = self
            .health
            .resolution_bonus(progress.cluster_health, resolution.severity);
        progress.cluster_health = bonus.health;

        debug!(
            xp = resolution.xp_earned,
            combo = resolution.combo,
            bonus = bonus.granted,
            health = bonus.health,
            "incident resolved"
        );
        out.push(SessionEvent::IncidentResolved {
            xp_earned: resolution.xp_earned,
            combo: resolution.combo,
            health_recovered: bonus.granted,
            cluster_health: bonus.health,
        });
    }

    /// Suspends play. Does nothing unless playing.
    pub fn pause(&mut self, out: &mut Vec<SessionEvent>) {
        if self.progress.lifecycle != LifecycleState::Playing {
            return;
        }

        self.progress.pause_started_at = Some(self.clock.now());
        self.progress.lifecycle = LifecycleState::Paused;
        self.ticker.cancel();
        if let Some(incidents) = self.collaborators.incidents.as_mut() {
            incidents.pause();
        }

        let survival_time = round_secs(self.progress.survival_time);
        info!(survival = survival_time, "session paused");
        out.push(SessionEvent::Paused { survival_time });
    }

    /// Resumes play. Does nothing unless paused.
    pub fn resume(&mut self, out: &mut Vec<SessionEvent>) {
        if self.progress.lifecycle != LifecycleState::Paused {
            return;
        }

        let now = self.clock.now();
        if let Some(paused_at) = self.progress.pause_started_at.take() {
            let paused_for = now.saturating_since(paused_at);
            self.progress.accumulated_pause =
                self.progress.accumulated_pause.saturating_add(paused_for);
        }
        self.progress.lifecycle = LifecycleState::Playing;
        if let Some(incidents) = self.collaborators.incidents.as_mut() {
            incidents.resume();
        }
        self.ticker.arm(now);

        info!(
            paused_total_ms = self.progress.accumulated_pause.as_millis() as u64,
            "session resumed"
        );
        out.push(SessionEvent::Resumed);
    }

    /// Tears the current run down and starts a fresh one.
    pub fn restart(&mut self, out: &mut Vec<SessionEvent>) {
        self.ticker.cancel();
        if let Some(incidents) = self.collaborators.incidents.as_mut() {
            incidents.reset();
        }
        info!("session restarting");
        self.start(out);
    }

    /// Abandons the run and returns to idle without clearing its counters.
    pub fn exit(&mut self, out: &mut Vec<SessionEvent>) {
        self.ticker.cancel();
        if let Some(incidents) = self.collaborators.incidents.as_mut() {
            incidents.stop();
        }
        self.progress.lifecycle = LifecycleState::Idle;
        self.progress.pause_started_at = None;
        self.subscribed = false;
        self.pending_resolutions.clear();

        info!(
            survival = round_secs(self.progress.survival_time),
            "session exited"
        );
        out.push(SessionEvent::Exited);
    }

    /// Snapshot of every session field and the open incidents.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        let progress = &self.progress;
        SessionStatus {
            state: progress.lifecycle,
            survival_time: progress.survival_time,
            accumulated_pause: progress.accumulated_pause,
            difficulty_level: progress.difficulty_level,
            chaos_budget: progress.chaos_budget,
            health_decay_rate: progress.health_decay_rate,
            cluster_health: progress.cluster_health,
            wave_number: progress.waves.wave_number(),
            wave_incident_count: progress.waves.incident_count(),
            wave_cooldown: progress.waves.cooldown_active(),
            wave_cooldown_timer: whole_secs_ceil(progress.waves.cooldown_remaining()),
            incidents_resolved: progress.incidents_resolved,
            total_xp: progress.total_xp,
            highest_combo: progress.highest_combo,
            active_incidents: self.active_incidents(),
        }
    }

    /// Stops the ticker and hands the collaborators back to the caller.
    pub fn destroy(mut self) -> Collaborators {
        self.ticker.cancel();
        self.subscribed = false;
        info!(state = ?self.progress.lifecycle, "session destroyed");
        mem::take(&mut self.collaborators)
    }

    fn pump_resolutions(&mut self, out: &mut Vec<SessionEvent>) {
        if !self.subscribed {
            return;
        }
        let Some(incidents) = self.collaborators.incidents.as_mut() else {
            return;
        };

        let mut pending = mem::take(&mut self.pending_resolutions);
        incidents.drain_resolutions(&mut pending);
        for resolution in pending.drain(..) {
            self.on_incident_resolved(resolution, out);
        }
        self.pending_resolutions = pending;
    }

    fn active_incidents(&self) -> Vec<ActiveIncident> {
        self.collaborators
            .incidents
            .as_ref()
            .map(|incidents| incidents.active_incidents())
            .unwrap_or_default()
    }

    fn derive_difficulty(&mut self) -> DifficultySnapshot {
        let snapshot = self.difficulty.derive(self.progress.survival_time);
        self.progress.difficulty_level = snapshot.level;
        self.progress.chaos_budget = snapshot.chaos_budget;
        self.progress.health_decay_rate = snapshot.health_decay_rate;
        snapshot
    }

    fn derive_health(
        &mut self,
        incidents: &[ActiveIncident],
        now: Timestamp,
        elapsed: Duration,
    ) -> HealthUpdate {
        let update = self.health.integrate(
            self.progress.cluster_health,
            self.progress.health_decay_rate,
            incidents,
            now,
            self.progress.incidents_resolved > 0,
            elapsed,
        );
        self.progress.cluster_health = update.health;
        update
    }

    fn derive_wave(
        &mut self,
        difficulty: &DifficultySnapshot,
        elapsed: Duration,
        out: &mut Vec<SessionEvent>,
    ) {
        let Some(start) =
            self.progress
                .waves
                .advance(difficulty.minutes, self.progress.difficulty_level, elapsed)
        else {
            return;
        };

        debug!(
            wave = start.wave_number,
            incidents = start.incident_count,
            difficulty = start.difficulty_level,
            "wave started"
        );
        out.push(SessionEvent::Wave {
            wave_number: start.wave_number,
            incident_count: start.incident_count,
            difficulty_level: start.difficulty_level,
        });
    }

    fn game_over(&mut self, out: &mut Vec<SessionEvent>) -> SessionReport {
        self.progress.lifecycle = LifecycleState::GameOver;
        self.ticker.cancel();
        self.subscribed = false;
        if let Some(incidents) = self.collaborators.incidents.as_mut() {
            incidents.stop();
        }
        if let Some(scoring) = self.collaborators.scoring.as_mut() {
            scoring.record_survival(self.progress.survival_time);
        }

        let report = self.report();
        info!(
            survival = report.survival_time,
            difficulty = report.difficulty_reached,
            resolved = report.incidents_resolved,
            waves = report.waves_reached,
            "cluster collapsed"
        );
        out.push(SessionEvent::GameOver(report.clone()));
        report
    }

    fn report(&self) -> SessionReport {
        let progress = &self.progress;
        SessionReport {
            survival_time: round_secs(progress.survival_time),
            difficulty_reached: progress.difficulty_level,
            incidents_resolved: progress.incidents_resolved,
            highest_combo: progress.highest_combo,
            total_xp: progress.total_xp,
            waves_reached: progress.waves.wave_number(),
            incident_breakdown: self
                .collaborators
                .incidents
                .as_ref()
                .map(|incidents| incidents.stats())
                .unwrap_or_default(),
        }
    }

    fn tick_summary(&self, active_incident_count: usize) -> TickSummary {
        let progress = &self.progress;
        TickSummary {
            survival_time: round_secs(progress.survival_time),
            difficulty_level: progress.difficulty_level,
            chaos_budget: round_to(progress.chaos_budget, 100.0),
            cluster_health: round_to(progress.cluster_health, 10.0),
            active_incident_count,
            incidents_resolved: progress.incidents_resolved,
            current_combo: self
                .collaborators
                .incidents
                .as_ref()
                .map_or(0, |incidents| incidents.current_combo()),
            highest_combo: progress.highest_combo,
            total_xp: progress.total_xp,
            wave_number: progress.waves.wave_number(),
        }
    }
}

fn round_secs(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    }
}

fn round_to(value: f64, scale: f64) -> f64 {
    (value * scale).round() / scale
}

fn whole_secs_ceil(duration: Duration) -> i64 {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    i64::try_from(secs).unwrap_or(i64::MAX)
}
