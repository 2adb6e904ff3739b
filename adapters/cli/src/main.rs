#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays an Incident Rush survival session headlessly.

mod simulated;

use std::{fs, path::PathBuf, thread, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use incident_rush_core::{SessionEvent, SessionReport, SessionStatus};
use incident_rush_session::{
    Clock, Collaborators, ManualClock, Session, SessionConfig, SystemClock,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::simulated::{InMemoryWorld, Leaderboard, SimulatedIncidents};

const DEFAULT_LOG_FILTER: &str = "incident_rush=info";

/// Command-line arguments accepted by the Incident Rush driver.
#[derive(Debug, Parser)]
#[command(name = "incident-rush", about = "Survive escalating cluster incidents.")]
struct Args {
    /// Optional TOML file overriding the session tuning.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Longest simulated play time in seconds before the driver exits.
    #[arg(long, default_value_t = 1_800)]
    duration: u64,

    /// Seed of the simulated incident engine.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,

    /// Chance per tick that the simulated responder resolves an incident.
    #[arg(long, default_value_t = 0.35)]
    resolve_chance: f64,

    /// Pause the session after this many ticks.
    #[arg(long, requires = "pause_for")]
    pause_at: Option<u64>,

    /// Length of the pause in seconds.
    #[arg(long, requires = "pause_at")]
    pause_for: Option<u64>,

    /// Sleep for real between ticks instead of fast-forwarding.
    #[arg(long)]
    realtime: bool,

    /// Print the outcome as JSON.
    #[arg(long)]
    json: bool,
}

/// Result of a driven session.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum Outcome {
    /// The cluster collapsed.
    Collapsed {
        report: SessionReport,
        best_survival: Option<f64>,
    },
    /// The driver ran out of time first.
    Survived { status: SessionStatus },
}

/// Entry point for the Incident Rush command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    if !(0.0..=1.0).contains(&args.resolve_chance) {
        bail!(
            "--resolve-chance must lie within 0.0..=1.0, got {}",
            args.resolve_chance
        );
    }
    let config = load_config(args.config.as_ref())?;

    let outcome = if args.realtime {
        run(SystemClock::new(), thread::sleep, config, &args)?
    } else {
        let clock = ManualClock::new();
        let driver = clock.clone();
        run(clock, move |period| driver.advance(period), config, &args)?
    };

    print_outcome(&outcome, args.json)
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read session config at {}", path.display()))?;
    SessionConfig::from_toml_str(&contents)
        .with_context(|| format!("invalid session config in {}", path.display()))
}

fn run<C: Clock>(
    clock: C,
    mut wait: impl FnMut(Duration),
    config: SessionConfig,
    args: &Args,
) -> Result<Outcome> {
    let incidents = SimulatedIncidents::new(args.seed, args.resolve_chance);
    let leaderboard = Leaderboard::default();
    let collaborators = Collaborators::new()
        .with_incidents(incidents.clone())
        .with_scoring(leaderboard.clone())
        .with_world(InMemoryWorld::default());

    let mut session =
        Session::new(config, collaborators, clock).context("invalid session configuration")?;
    let period = session.config().tick_period();
    let mut events = Vec::new();
    session.start(&mut events);
    present(&incidents, &session, &mut events);

    let deadline = Duration::from_secs(args.duration);
    let mut played = Duration::ZERO;
    let mut ticks = 0_u64;
    while played < deadline {
        wait(period);
        played += period;

        incidents.respond(session.clock().now());
        let report = session.poll(&mut events);
        ticks += 1;
        present(&incidents, &session, &mut events);

        if let Some(report) = report {
            return Ok(Outcome::Collapsed {
                report,
                best_survival: leaderboard.best(),
            });
        }

        if args.pause_at == Some(ticks) {
            let pause_for = Duration::from_secs(args.pause_for.unwrap_or_default());
            session.pause(&mut events);
            wait(pause_for);
            session.resume(&mut events);
            present(&incidents, &session, &mut events);
        }
    }

    warn!(seconds = args.duration, "time limit reached before collapse");
    let status = session.status();
    session.exit(&mut events);
    present(&incidents, &session, &mut events);
    Ok(Outcome::Survived { status })
}

/// Logs drained session events and forwards wave boundaries to the incident engine.
fn present<C: Clock>(
    incidents: &SimulatedIncidents,
    session: &Session<C>,
    events: &mut Vec<SessionEvent>,
) {
    for event in events.drain(..) {
        match &event {
            SessionEvent::Wave {
                wave_number,
                incident_count,
                difficulty_level,
            } => {
                info!(
                    wave = wave_number,
                    incidents = incident_count,
                    difficulty = difficulty_level,
                    "{}",
                    event.name()
                );
                incidents.spawn_wave(*incident_count, *difficulty_level, session.clock().now());
            }
            SessionEvent::Tick(summary) => debug!(
                survival = summary.survival_time,
                health = summary.cluster_health,
                chaos = summary.chaos_budget,
                open = summary.active_incident_count,
                "{}",
                event.name()
            ),
            SessionEvent::IncidentResolved {
                xp_earned,
                combo,
                cluster_health,
                ..
            } => info!(
                xp = xp_earned,
                combo = combo,
                health = cluster_health,
                "{}",
                event.name()
            ),
            other => info!("{}", other.name()),
        }
    }
}

fn print_outcome(outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        let rendered =
            serde_json::to_string_pretty(outcome).context("failed to encode outcome as json")?;
        println!("{rendered}");
        return Ok(());
    }

    match outcome {
        Outcome::Collapsed {
            report,
            best_survival,
        } => {
            println!("Cluster collapsed after {}s.", report.survival_time);
            println!("  difficulty reached: {}", report.difficulty_reached);
            println!("  waves reached:      {}", report.waves_reached);
            println!("  incidents resolved: {}", report.incidents_resolved);
            println!("  highest combo:      {}", report.highest_combo);
            println!("  total xp:           {}", report.total_xp);
            println!(
                "  incidents spawned:  {}",
                report.incident_breakdown.spawned
            );
            for (category, count) in &report.incident_breakdown.resolved_by_category {
                println!("    {category}: {count}");
            }
            if let Some(best) = best_survival {
                println!("  best survival:      {best:.0}s");
            }
        }
        Outcome::Survived { status } => {
            println!(
                "Cluster survived {:.0}s at {:.1} health.",
                status.survival_time, status.cluster_health
            );
            println!("  difficulty level:   {}", status.difficulty_level);
            println!("  waves reached:      {}", status.wave_number);
            println!("  incidents resolved: {}", status.incidents_resolved);
            println!("  open incidents:     {}", status.active_incidents.len());
        }
    }
    Ok(())
}
