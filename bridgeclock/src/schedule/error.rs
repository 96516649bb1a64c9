/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the schedule builder.
//!
//! Two types model the two layers:
//!
//! * [`ParameterIssue`]: exactly which tournament parameter is malformed
//!   (carries the offending values).
//! * [`ScheduleError`]: top-level failure returned from
//!   [`ScheduleBuilder::build()`](super::ScheduleBuilder::build).
//!
//! Validation happens before any timeline is produced, so a rejected edit
//! never reaches a running clock.

use chrono::Duration;
use thiserror::Error;

use crate::segment::SegmentKind;
use crate::timeline::MIN_SEGMENT_SECS;

// ── Parameter validation ──────────────────────────────────────────────────────

/// Detailed reason why a set of tournament parameters was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterIssue {
    /// `round_count` was zero.
    NoRounds,

    /// Round length must be strictly positive.
    NonPositiveRoundLength { length: Duration },

    /// Change length may be zero but never negative.
    NegativeChangeLength { length: Duration },

    /// A break request had a zero or negative length.
    NonPositiveBreakLength { after_round: u32, length: Duration },

    /// A positive length below the minimum segment length.  A zero change
    /// length is still allowed and means "no changes".
    SegmentTooShort { kind: SegmentKind, length: Duration },

    /// A break was requested after a round that does not exist.
    BreakOutOfRange { after_round: u32, round_count: u32 },

    /// A custom break arrived without a (non-blank) label.
    MissingCustomLabel { after_round: u32 },

    /// More than one break was requested for the same round boundary.
    DuplicateBreak { after_round: u32 },

    /// Laying out the segments ran past the representable date range.
    TimeOverflow,
}

impl std::fmt::Display for ParameterIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterIssue::NoRounds => write!(f, "tournament must have at least one round"),

            ParameterIssue::NonPositiveRoundLength { length } => write!(
                f,
                "round length must be positive (got {}s)",
                length.num_seconds()
            ),

            ParameterIssue::NegativeChangeLength { length } => write!(
                f,
                "change length must not be negative (got {}s)",
                length.num_seconds()
            ),

            ParameterIssue::NonPositiveBreakLength {
                after_round,
                length,
            } => write!(
                f,
                "break after round {} must have a positive length (got {}s)",
                after_round,
                length.num_seconds()
            ),

            ParameterIssue::SegmentTooShort { kind, length } => write!(
                f,
                "{:?} must last at least {}s (got {}ms)",
                kind,
                MIN_SEGMENT_SECS,
                length.num_milliseconds()
            ),

            ParameterIssue::BreakOutOfRange {
                after_round,
                round_count,
            } => write!(
                f,
                "break after round {} is outside rounds 1..={}",
                after_round, round_count
            ),

            ParameterIssue::MissingCustomLabel { after_round } => write!(
                f,
                "custom break after round {} needs a label",
                after_round
            ),

            ParameterIssue::DuplicateBreak { after_round } => write!(
                f,
                "more than one break requested after round {}",
                after_round
            ),

            ParameterIssue::TimeOverflow => {
                write!(f, "tournament runs past the representable time range")
            }
        }
    }
}

// ── Top-level schedule errors ─────────────────────────────────────────────────

/// Top-level error type returned by
/// [`ScheduleBuilder::build()`](super::ScheduleBuilder::build).
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The tournament configuration is malformed; `0` says exactly how.
    #[error("invalid tournament parameters: {0}")]
    InvalidParameters(ParameterIssue),
}

impl From<ParameterIssue> for ScheduleError {
    fn from(issue: ParameterIssue) -> Self {
        ScheduleError::InvalidParameters(issue)
    }
}

impl ScheduleError {
    /// The underlying parameter issue.
    pub fn issue(&self) -> &ParameterIssue {
        match self {
            ScheduleError::InvalidParameters(issue) => issue,
        }
    }
}
