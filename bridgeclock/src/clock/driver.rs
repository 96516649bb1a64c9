/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Tick driver: a tokio task that owns a [`ClockEngine`] exclusively.
//!
//! ```text
//!   UI / stdin ──(Command, mpsc)──►┌──────────────┐──(ClockState, watch)──► presentation
//!                                  │ driver task  │
//!   tokio interval ──(tick)───────►│ ClockEngine  │
//!                                  └──────────────┘
//! ```
//!
//! Commands and ticks are handled one at a time on the same task, so the
//! engine never sees concurrent access and needs no locking.  Commands are
//! polled before ticks when both are ready.

use std::time::Duration as StdDuration;

use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDateTime};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use super::{AdjustStep, ClockEngine, ClockState};
use crate::timeline::Timeline;

const COMMAND_CAPACITY: usize = 32;

/// Nominal tick period.
pub const DEFAULT_TICK: StdDuration = StdDuration::from_secs(1);

// ── Commands ──────────────────────────────────────────────────────────────────

/// Everything a host can ask of a running clock.
#[derive(Debug)]
pub enum Command {
    Adjust(Duration),
    Stop,
    Resume,
    /// Replace the timeline.  Build it first so a bad edit is rejected before
    /// it gets here.
    Reconfigure(Timeline),
    /// Undo all live adjustments.
    Reset,
    /// Stop the driver task; its `JoinHandle` yields the engine.
    Shutdown,
}

// ── ClockHandle ───────────────────────────────────────────────────────────────

/// Cloneable handle to a running driver.
#[derive(Clone)]
pub struct ClockHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<ClockState>,
}

impl ClockHandle {
    pub async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow!("clock driver has stopped"))
    }

    pub async fn adjust(&self, step: AdjustStep) -> Result<()> {
        self.send(Command::Adjust(step.delta())).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.send(Command::Stop).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.send(Command::Resume).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.send(Command::Reset).await
    }

    pub async fn reconfigure(&self, timeline: Timeline) -> Result<()> {
        self.send(Command::Reconfigure(timeline)).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    /// Latest published state.
    pub fn state(&self) -> ClockState {
        self.state.borrow().clone()
    }

    /// A receiver that wakes whenever the published state changes.
    pub fn subscribe(&self) -> watch::Receiver<ClockState> {
        self.state.clone()
    }
}

// ── Driver task ───────────────────────────────────────────────────────────────

/// Move `engine` into a new task ticking every `tick`, sampling time from
/// `clock`.
///
/// The task ends on [`Command::Shutdown`] or when every [`ClockHandle`] has
/// been dropped, and hands the engine back through its `JoinHandle`.
pub fn spawn<F>(
    mut engine: ClockEngine,
    tick: StdDuration,
    mut clock: F,
) -> (ClockHandle, JoinHandle<ClockEngine>)
where
    F: FnMut() -> NaiveDateTime + Send + 'static,
{
    let (command_tx, mut command_rx) = mpsc::channel(COMMAND_CAPACITY);
    let (state_tx, state_rx) = watch::channel(engine.state());

    let handle = tokio::spawn(async move {
        let mut interval = time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(tick_ms = tick.as_millis() as u64, "clock driver started");

        loop {
            tokio::select! {
                biased;
                command = command_rx.recv() => {
                    let Some(command) = command else { break };
                    if !apply(&mut engine, command) {
                        break;
                    }
                }
                _ = interval.tick() => {
                    engine.advance(clock());
                }
            }

            let next = engine.state();
            state_tx.send_if_modified(|current| {
                if *current == next {
                    return false;
                }
                *current = next;
                true
            });
        }

        info!("clock driver stopped");
        engine
    });

    (
        ClockHandle {
            commands: command_tx,
            state: state_rx,
        },
        handle,
    )
}

/// Returns `false` once the driver should stop.
fn apply(engine: &mut ClockEngine, command: Command) -> bool {
    debug!(?command, "command");
    match command {
        Command::Adjust(delta) => {
            engine.adjust(delta);
        }
        Command::Stop => engine.stop(),
        Command::Resume => engine.resume(),
        Command::Reconfigure(timeline) => engine.reconfigure(timeline),
        Command::Reset => engine.reset_adjustments(),
        Command::Shutdown => return false,
    }
    true
}

// ── Tests ─────────────────────────────────────────────────────────────────────
