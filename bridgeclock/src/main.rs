/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::time::Duration as StdDuration;

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

use bridgeclock::clock::driver::{self, ClockHandle};
use bridgeclock::clock::{AdjustStep, ClockEngine, ClockState};
use bridgeclock::config::TournamentConfig;
use bridgeclock::schedule::ScheduleBuilder;
use bridgeclock::timeline::Timeline;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Bridge tournament clock.
///
/// Example:
///   bridgeclock --config demos/tournament.yaml
///
/// While running, type a command and press Enter:
///   +10s +1m +5m -10s -1m -5m   adjust the current segment
///   stop | resume               freeze / continue the countdown
///   reset                       undo all adjustments
///   quit                        exit
#[derive(Debug, Parser)]
#[command(name = "bridgeclock", about = "Bridge tournament clock", long_about = None)]
struct Cli {
    /// Path to the YAML tournament configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Print the schedule and exit.
    #[arg(short = 'l', long = "list", default_value_t = false)]
    list: bool,

    /// Tick period in milliseconds.
    #[arg(short = 't', long = "tick-ms", default_value_t = 1000)]
    tick_ms: u64,
}

fn wall_clock() -> NaiveDateTime {
    Local::now().naive_local()
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    debug!(config = ?cli.config, list = cli.list, tick_ms = cli.tick_ms, "Configuration");

    // ── Load tournament configuration ─────────────────────────────────────────
    let config = match &cli.config {
        Some(path) => match TournamentConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load tournament configuration: {:#}", e);
                process::exit(1);
            }
        },
        None => {
            warn!("No configuration file provided, using default tournament settings");
            TournamentConfig::default()
        }
    };

    // ── Build the timeline ────────────────────────────────────────────────────
    let now = wall_clock();
    let timeline = match ScheduleBuilder::build(&config.to_params(now)) {
        Ok(timeline) => timeline,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    if cli.list {
        print_schedule(&timeline);
        return;
    }

    if let Err(e) = run(timeline, now, StdDuration::from_millis(cli.tick_ms.max(1))).await {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn print_schedule(timeline: &Timeline) {
    println!(
        "{:<20} {:>8} {:>8} {:>8}  {}",
        "Segment", "Begin", "End", "Length", "Previous"
    );
    for (i, seg) in timeline.segments().iter().enumerate() {
        let len = seg.length();
        let previous = timeline
            .previous_label(i)
            .map(|n| n.to_string())
            .unwrap_or_else(|| "Begin".to_string());
        println!(
            "{:<20} {:>8} {:>8} {:>5}:{:02}  {}",
            seg.name().to_string(),
            seg.begin.format("%H:%M:%S").to_string(),
            seg.end.format("%H:%M:%S").to_string(),
            len.num_minutes(),
            len.num_seconds() % 60,
            previous,
        );
    }
    println!("Tournament will end: {}", timeline.end().format("%H:%M:%S"));
}

// ── Running clock ─────────────────────────────────────────────────────────────

async fn run(timeline: Timeline, now: NaiveDateTime, tick: StdDuration) -> Result<()> {
    let (handle, task) = driver::spawn(ClockEngine::new(timeline, now), tick, wall_clock);
    let mut states = handle.subscribe();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    log_state(&handle.state());
    let mut shown = handle.state().active.name;
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                if state.active.name != shown {
                    shown = state.active.name.clone();
                    log_state(&state);
                }
            }
            line = stdin.next_line(), if stdin_open => {
                match line? {
                    None => {
                        debug!("stdin closed, commands disabled");
                        stdin_open = false;
                    }
                    Some(line) => {
                        if !handle_command(&handle, line.trim()).await? {
                            break;
                        }
                    }
                }
            }
        }
    }

    handle.shutdown().await.ok();
    task.await?;
    Ok(())
}

/// Returns `false` when the operator asked to quit.
async fn handle_command(handle: &ClockHandle, line: &str) -> Result<bool> {
    match line {
        "" => {}
        "quit" | "exit" => return Ok(false),
        "stop" => handle.stop().await?,
        "resume" => handle.resume().await?,
        "reset" => handle.reset().await?,
        "status" => log_state(&handle.state()),
        other => match other.parse::<AdjustStep>() {
            Ok(step) => handle.adjust(step).await?,
            Err(e) => warn!("{}", e),
        },
    }
    Ok(true)
}

fn log_state(state: &ClockState) {
    let remaining = state.active.remaining;
    info!(
        happening = %state.active.name,
        remaining = %format!("{}:{:02}", remaining.num_minutes(), remaining.num_seconds() % 60),
        previous = %state.previous.as_ref().map(|n| n.to_string()).unwrap_or_default(),
        next = %state.next.as_ref().map(|n| n.to_string()).unwrap_or_default(),
        next_break = ?state.next_break.as_ref().map(|b| format!("{} {}", b.name, b.begin.format("%H:%M"))),
        ends = %state.tournament_end.format("%H:%M:%S"),
        run_state = ?state.run_state,
        "clock"
    );
}
