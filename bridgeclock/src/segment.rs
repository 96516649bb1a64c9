/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core segment data structures for the tournament timeline.
//!
//! A tournament is a contiguous run of [`Segment`]s:
//!
//! ```text
//! start ──► Round 1 ──► Lunch ──► Change ──► Round 2 ──► Change ──► Round 3 ──► end
//!           └ play ┘    └──────── breaks ───────┘
//! ```
//!
//! # Ownership model
//! Segments are produced by the
//! [`ScheduleBuilder`](crate::schedule::ScheduleBuilder) and **moved** into a
//! [`Timeline`](crate::timeline::Timeline).  After that only the timeline's
//! cascading shift touches their boundaries; kind, label and round number
//! never change once built.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ── SegmentKind ───────────────────────────────────────────────────────────────

/// Closed vocabulary of segment types.
///
/// Only [`SegmentKind::Round`] is play time; every other kind is a break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Round,
    /// Short transition automatically inserted between rounds.
    Change,
    Lunch,
    Dinner,
    Coffee,
    /// Break with a user-supplied display name.
    Custom,
}

impl SegmentKind {
    /// Returns `true` for every kind except [`SegmentKind::Round`].
    pub fn is_break(self) -> bool {
        !matches!(self, SegmentKind::Round)
    }

    /// Returns `true` for the scheduled meal/coffee/custom breaks.
    ///
    /// Change segments are breaks too, but they are not what a player means
    /// by "the next break".
    pub fn is_scheduled_break(self) -> bool {
        matches!(
            self,
            SegmentKind::Lunch | SegmentKind::Dinner | SegmentKind::Coffee | SegmentKind::Custom
        )
    }
}

// ── SegmentName ───────────────────────────────────────────────────────────────

/// What the presentation layer should call a segment (or a sentinel state).
///
/// `Display` renders the English fallback text; localisation is left to the
/// presentation layer, which can match on the variant instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name", content = "value", rename_all = "snake_case")]
pub enum SegmentName {
    Round(u32),
    Change,
    Lunch,
    Dinner,
    Coffee,
    Custom(String),
    /// Synthetic segment shown before the first round starts.
    TournamentBegins,
    /// Synthetic segment shown after the last round ends.
    End,
}

impl fmt::Display for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentName::Round(n) => write!(f, "Round {}", n),
            SegmentName::Change => f.write_str("Change"),
            SegmentName::Lunch => f.write_str("Lunch"),
            SegmentName::Dinner => f.write_str("Dinner"),
            SegmentName::Coffee => f.write_str("Coffee"),
            SegmentName::Custom(label) => f.write_str(label),
            SegmentName::TournamentBegins => f.write_str("Tournament begins"),
            SegmentName::End => f.write_str("End"),
        }
    }
}

// ── Segment ───────────────────────────────────────────────────────────────────

/// One slot in the tournament timeline.
///
/// Invariant: `end > begin`.  Inside a timeline, `segments[i].end ==
/// segments[i + 1].begin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub kind: SegmentKind,

    /// Display label, only set when `kind == Custom`.
    pub label: Option<String>,

    /// 1-based round number, only set when `kind == Round`.
    pub round: Option<u32>,

    pub begin: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Segment {
    /// A play segment for round `number`.
    pub fn round(number: u32, begin: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            kind: SegmentKind::Round,
            label: None,
            round: Some(number),
            begin,
            end,
        }
    }

    /// A break segment.  `label` is kept only for [`SegmentKind::Custom`].
    pub fn break_of(
        kind: SegmentKind,
        label: Option<String>,
        begin: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        debug_assert!(kind.is_break(), "break_of called with a Round kind");
        Self {
            kind,
            label: if kind == SegmentKind::Custom { label } else { None },
            round: None,
            begin,
            end,
        }
    }

    pub fn length(&self) -> Duration {
        self.end - self.begin
    }

    /// Returns `true` if `t` falls inside `[begin, end)`.
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.begin <= t && t < self.end
    }

    /// Resolves the display name of this segment.
    ///
    /// A Custom segment without a label falls back to an empty name; the
    /// builder never produces one.
    pub fn name(&self) -> SegmentName {
        match self.kind {
            SegmentKind::Round => SegmentName::Round(self.round.unwrap_or(0)),
            SegmentKind::Change => SegmentName::Change,
            SegmentKind::Lunch => SegmentName::Lunch,
            SegmentKind::Dinner => SegmentName::Dinner,
            SegmentKind::Coffee => SegmentName::Coffee,
            SegmentKind::Custom => SegmentName::Custom(self.label.clone().unwrap_or_default()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
