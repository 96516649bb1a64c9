/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Countdown state machine over a [`Timeline`].
//!
//! [`ClockEngine`] owns exactly one timeline plus the last sampled "now".
//! Everything the presentation layer shows is derived from those two on
//! demand by [`ClockEngine::state`]; the active segment is never cached, so
//! an adjustment is visible immediately without another tick.
//!
//! ```text
//!            stop()
//!   ┌──────────────┐ ──────────► ┌─────────┐
//!   │ CountingDown │             │ Stopped │   advance(now) ignored
//!   └──────────────┘ ◄────────── └─────────┘
//!            resume()
//! ```
//!
//! There is no terminal state: after the last segment the engine keeps
//! reporting `End` with zero remaining.
//!
//! # Threading
//! The engine has no interior mutability and no locks.  It expects a single
//! owner that serialises `advance` and every command; see [`driver`] for the
//! tokio task that plays that role.

pub mod driver;

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{info, trace, warn};

use crate::schedule::{ScheduleBuilder, ScheduleError, TournamentParams};
use crate::segment::{SegmentKind, SegmentName};
use crate::timeline::{Position, Timeline};

// ── RunState ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    CountingDown,
    /// `advance` calls are ignored; the displayed remaining time is frozen.
    Stopped,
}

// ── AdjustStep ────────────────────────────────────────────────────────────────

/// The six conventional live-adjustment buttons.
///
/// [`ClockEngine::adjust`] accepts any delta; these are just the ones the
/// operator normally reaches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustStep {
    PlusTenSeconds,
    PlusOneMinute,
    PlusFiveMinutes,
    MinusTenSeconds,
    MinusOneMinute,
    MinusFiveMinutes,
}

impl AdjustStep {
    pub const ALL: [AdjustStep; 6] = [
        AdjustStep::PlusTenSeconds,
        AdjustStep::PlusOneMinute,
        AdjustStep::PlusFiveMinutes,
        AdjustStep::MinusTenSeconds,
        AdjustStep::MinusOneMinute,
        AdjustStep::MinusFiveMinutes,
    ];

    /// Signed size of the step in seconds.
    pub fn seconds(self) -> i64 {
        match self {
            AdjustStep::PlusTenSeconds => 10,
            AdjustStep::PlusOneMinute => 60,
            AdjustStep::PlusFiveMinutes => 300,
            AdjustStep::MinusTenSeconds => -10,
            AdjustStep::MinusOneMinute => -60,
            AdjustStep::MinusFiveMinutes => -300,
        }
    }

    pub fn delta(self) -> Duration {
        Duration::seconds(self.seconds())
    }

    /// Button caption, e.g. `"+10s"` or `"-5m"`.
    pub fn as_str(self) -> &'static str {
        match self {
            AdjustStep::PlusTenSeconds => "+10s",
            AdjustStep::PlusOneMinute => "+1m",
            AdjustStep::PlusFiveMinutes => "+5m",
            AdjustStep::MinusTenSeconds => "-10s",
            AdjustStep::MinusOneMinute => "-1m",
            AdjustStep::MinusFiveMinutes => "-5m",
        }
    }
}

impl fmt::Display for AdjustStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an [`AdjustStep`] from anything but the six captions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown adjustment '{0}' (valid: +10s, +1m, +5m, -10s, -1m, -5m)")]
pub struct UnknownAdjustStep(pub String);

impl FromStr for AdjustStep {
    type Err = UnknownAdjustStep;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        AdjustStep::ALL
            .into_iter()
            .find(|step| step.as_str() == trimmed)
            .ok_or_else(|| UnknownAdjustStep(trimmed.to_string()))
    }
}

// ── Adjustment history ────────────────────────────────────────────────────────

/// One applied live adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjustment {
    /// Index of the segment that was active when the adjustment was made.
    pub index: usize,
    pub requested: Duration,
    /// Differs from `requested` when the minimum segment length clamped it.
    pub applied: Duration,
}

// ── Published state ───────────────────────────────────────────────────────────

fn as_seconds<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(d.num_seconds())
}

/// The segment currently shown as "happening", possibly synthetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveSegment {
    pub name: SegmentName,
    /// `None` for the synthetic "Tournament begins" / "End" segments.
    pub kind: Option<SegmentKind>,
    pub round: Option<u32>,
    pub begin: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    #[serde(rename = "remaining_secs", serialize_with = "as_seconds")]
    pub remaining: Duration,
}

/// The next lunch/dinner/coffee/custom break and when it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingBreak {
    pub name: SegmentName,
    pub begin: NaiveDateTime,
}

/// Read-only snapshot handed to the presentation layer once per tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockState {
    pub run_state: RunState,
    pub now: NaiveDateTime,
    pub position: Position,
    pub active: ActiveSegment,
    pub previous: Option<SegmentName>,
    pub next: Option<SegmentName>,
    pub next_break: Option<UpcomingBreak>,
    pub tournament_end: NaiveDateTime,
    /// Number of live adjustments applied since the timeline was built.
    pub adjustments: usize,
}

// ── ClockEngine ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ClockEngine {
    timeline: Timeline,
    /// The timeline exactly as built, for [`ClockEngine::reset_adjustments`].
    baseline: Timeline,
    now: NaiveDateTime,
    run_state: RunState,
    adjustments: Vec<Adjustment>,
}

impl ClockEngine {
    /// Seed an engine with a freshly built timeline.  Starts counting down.
    pub fn new(timeline: Timeline, now: NaiveDateTime) -> Self {
        Self {
            baseline: timeline.clone(),
            timeline,
            now,
            run_state: RunState::CountingDown,
            adjustments: Vec::new(),
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_stopped(&self) -> bool {
        self.run_state == RunState::Stopped
    }

    pub fn adjustments(&self) -> &[Adjustment] {
        &self.adjustments
    }

    /// Where `now` falls in the current timeline.
    pub fn position(&self) -> Position {
        self.timeline.segment_at(self.now)
    }

    /// Time left in the active segment (or until the start), never negative.
    pub fn remaining(&self) -> Duration {
        let until = match self.position() {
            Position::BeforeStart => self.timeline.start(),
            Position::At(i) => self.timeline.segments()[i].end,
            Position::AfterEnd => return Duration::zero(),
        };
        (until - self.now).max(Duration::zero())
    }

    // ── Operations ────────────────────────────────────────────────────────────

    /// Record a new clock sample.  Returns `false` (and changes nothing) while
    /// stopped.
    pub fn advance(&mut self, now: NaiveDateTime) -> bool {
        if self.is_stopped() {
            trace!(%now, "advance ignored while stopped");
            return false;
        }
        self.now = now;
        trace!(%now, position = ?self.position(), "advance");
        true
    }

    /// Lengthen (positive) or shorten (negative) the active segment, shifting
    /// every later segment by the same amount.
    ///
    /// No-op before the start and after the end.  Shortening is clamped at the
    /// minimum segment length rather than rejected.  Returns the delta that
    /// was actually applied.
    pub fn adjust(&mut self, delta: Duration) -> Duration {
        let Position::At(index) = self.position() else {
            info!(
                delta_s = delta.num_seconds(),
                position = ?self.position(),
                "adjustment ignored outside the tournament"
            );
            return Duration::zero();
        };

        let applied = self.timeline.shift_from(index, delta);
        if applied != delta {
            warn!(
                index,
                requested_s = delta.num_seconds(),
                applied_s = applied.num_seconds(),
                "adjustment clamped"
            );
        }
        if applied != Duration::zero() {
            self.adjustments.push(Adjustment {
                index,
                requested: delta,
                applied,
            });
        }

        info!(
            index,
            applied_s = applied.num_seconds(),
            end = %self.timeline.end(),
            "timeline adjusted"
        );
        applied
    }

    /// [`adjust`](Self::adjust) by one of the conventional steps.
    pub fn adjust_step(&mut self, step: AdjustStep) -> Duration {
        self.adjust(step.delta())
    }

    pub fn stop(&mut self) {
        if self.run_state != RunState::Stopped {
            info!(now = %self.now, "clock stopped");
        }
        self.run_state = RunState::Stopped;
    }

    pub fn resume(&mut self) {
        if self.run_state != RunState::CountingDown {
            info!(now = %self.now, "clock resumed");
        }
        self.run_state = RunState::CountingDown;
    }

    /// Swap in a new timeline.  Adjustments made to the old one are
    /// discarded; run state and `now` are kept.
    pub fn reconfigure(&mut self, timeline: Timeline) {
        info!(
            discarded_adjustments = self.adjustments.len(),
            segments = timeline.len(),
            end = %timeline.end(),
            "timeline replaced"
        );
        self.baseline = timeline.clone();
        self.timeline = timeline;
        self.adjustments.clear();
    }

    /// Build a timeline from `params` and swap it in.
    ///
    /// # Errors
    /// Propagates the builder's [`ScheduleError`]; the running timeline is
    /// left untouched in that case.
    pub fn reconfigure_from(&mut self, params: &TournamentParams) -> Result<(), ScheduleError> {
        let timeline = ScheduleBuilder::build(params)?;
        self.reconfigure(timeline);
        Ok(())
    }

    /// Undo every live adjustment, restoring the timeline as built.
    pub fn reset_adjustments(&mut self) {
        info!(discarded = self.adjustments.len(), "adjustments reset");
        self.timeline = self.baseline.clone();
        self.adjustments.clear();
    }

    // ── Published state ───────────────────────────────────────────────────────

    /// Snapshot of everything the presentation layer shows.
    pub fn state(&self) -> ClockState {
        let position = self.position();
        let remaining = self.remaining();
        let tl = &self.timeline;

        let (active, previous, next) = match position {
            Position::BeforeStart => (
                ActiveSegment {
                    name: SegmentName::TournamentBegins,
                    kind: None,
                    round: None,
                    begin: None,
                    end: Some(tl.start()),
                    remaining,
                },
                None,
                tl.get(0).map(|s| s.name()),
            ),
            Position::At(i) => {
                let seg = &tl.segments()[i];
                (
                    ActiveSegment {
                        name: seg.name(),
                        kind: Some(seg.kind),
                        round: seg.round,
                        begin: Some(seg.begin),
                        end: Some(seg.end),
                        remaining,
                    },
                    tl.previous_label(i),
                    tl.next_label(i),
                )
            }
            Position::AfterEnd => (
                ActiveSegment {
                    name: SegmentName::End,
                    kind: None,
                    round: None,
                    begin: Some(tl.end()),
                    end: None,
                    remaining,
                },
                tl.segments().last().map(|s| s.name()),
                None,
            ),
        };

        ClockState {
            run_state: self.run_state,
            now: self.now,
            position,
            active,
            previous,
            next,
            next_break: tl.next_break_after(position).map(|s| UpcomingBreak {
                name: s.name(),
                begin: s.begin,
            }),
            tournament_end: tl.end(),
            adjustments: self.adjustments.len(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
