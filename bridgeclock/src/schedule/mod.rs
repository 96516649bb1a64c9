//! Tournament schedule builder.
//!
//! [`ScheduleBuilder`] turns a set of [`TournamentParams`] into a
//! [`Timeline`]: rounds in order, an optional break after a round, then a
//! change before the next round.
//!
//! # Layout rules
//!
//! | Boundary | Segments inserted |
//! |---|---|
//! | before round 1 | none (round 1 starts at `start`) |
//! | after round *r* < last, break requested | break, then change (if `change_length > 0`) |
//! | after round *r* < last, no break | change (if `change_length > 0`) |
//! | after the last round | none |
//!
//! Every boundary is computed by running one cursor forward from `start`,
//! so consecutive segments are contiguous by construction.
//!
//! # Example
//! ```rust
//! use bridgeclock::schedule::{BreakKind, BreakRequest, ScheduleBuilder, TournamentParams};
//! use chrono::{Duration, NaiveDate};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 5, 4).unwrap().and_hms_opt(10, 0, 0).unwrap();
//! let params = TournamentParams {
//!     start,
//!     round_count: 3,
//!     round_length: Duration::minutes(30),
//!     change_length: Duration::minutes(5),
//!     breaks: vec![BreakRequest::new(1, BreakKind::Lunch, Duration::minutes(60))],
//! };
//!
//! let timeline = ScheduleBuilder::build(&params).unwrap();
//! assert_eq!(timeline.len(), 6);
//! assert_eq!(timeline.end(), start + Duration::minutes(160));
//! ```

pub mod error;

pub use error::{ParameterIssue, ScheduleError};

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::segment::{Segment, SegmentKind};
use crate::timeline::{min_segment_length, Timeline};

// ── Break requests ────────────────────────────────────────────────────────────

/// Kinds of break a user may request.
///
/// Changes are inserted automatically and rounds are not breaks, so neither
/// can be requested; the enum makes that unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakKind {
    Lunch,
    Dinner,
    Coffee,
    Custom,
}

impl From<BreakKind> for SegmentKind {
    fn from(kind: BreakKind) -> Self {
        match kind {
            BreakKind::Lunch => SegmentKind::Lunch,
            BreakKind::Dinner => SegmentKind::Dinner,
            BreakKind::Coffee => SegmentKind::Coffee,
            BreakKind::Custom => SegmentKind::Custom,
        }
    }
}

/// A break to insert after round `after_round` (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakRequest {
    pub after_round: u32,
    pub kind: BreakKind,
    pub length: Duration,
    /// Required for [`BreakKind::Custom`], ignored otherwise.
    pub label: Option<String>,
}

impl BreakRequest {
    pub fn new(after_round: u32, kind: BreakKind, length: Duration) -> Self {
        Self {
            after_round,
            kind,
            length,
            label: None,
        }
    }

    /// A [`BreakKind::Custom`] break with a display label.
    pub fn custom(after_round: u32, label: impl Into<String>, length: Duration) -> Self {
        Self {
            after_round,
            kind: BreakKind::Custom,
            length,
            label: Some(label.into()),
        }
    }
}

// ── TournamentParams ──────────────────────────────────────────────────────────

/// Everything needed to lay out a tournament.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentParams {
    pub start: NaiveDateTime,
    pub round_count: u32,
    pub round_length: Duration,
    /// May be zero, in which case no change segments are inserted.
    pub change_length: Duration,
    pub breaks: Vec<BreakRequest>,
}

// ── ScheduleBuilder ───────────────────────────────────────────────────────────

/// Builds a fresh [`Timeline`] from [`TournamentParams`].
///
/// Stateless: every call validates and lays out from scratch, and nothing
/// is shared between calls.
pub struct ScheduleBuilder;

impl ScheduleBuilder {
    /// Validate `params` and lay out the tournament.
    ///
    /// # Errors
    /// [`ScheduleError::InvalidParameters`] when the round count is zero,
    /// a length is negative or shorter than [`min_segment_length`], a break
    /// sits outside rounds `1..round_count`, a custom break has no label, two
    /// breaks share a boundary, or the tournament would end past the
    /// representable date range.
    pub fn build(params: &TournamentParams) -> Result<Timeline, ScheduleError> {
        let breaks = Self::validate(params)?;

        // Reject a span past the calendar before allocating anything.
        let span = total_span(params, &breaks).ok_or(ParameterIssue::TimeOverflow)?;
        params
            .start
            .checked_add_signed(span)
            .ok_or(ParameterIssue::TimeOverflow)?;

        let mut segments: Vec<Segment> = Vec::new();
        let mut cursor = params.start;

        for round in 1..=params.round_count {
            let (begin, end) = step(&mut cursor, params.round_length)?;
            segments.push(Segment::round(round, begin, end));

            if round == params.round_count {
                break;
            }

            if let Some(request) = breaks.get(&round) {
                let (begin, end) = step(&mut cursor, request.length)?;
                segments.push(Segment::break_of(
                    request.kind.into(),
                    request.label.clone(),
                    begin,
                    end,
                ));
            }

            if params.change_length > Duration::zero() {
                let (begin, end) = step(&mut cursor, params.change_length)?;
                segments.push(Segment::break_of(SegmentKind::Change, None, begin, end));
            }
        }

        for (i, s) in segments.iter().enumerate() {
            debug!(
                index = i,
                kind = ?s.kind,
                name = %s.name(),
                begin = %s.begin,
                end = %s.end,
                "segment"
            );
        }

        let timeline = Timeline::from_segments(segments);

        info!(
            rounds = params.round_count,
            breaks = breaks.len(),
            segments = timeline.len(),
            start = %timeline.start(),
            end = %timeline.end(),
            "timeline built"
        );

        Ok(timeline)
    }

    /// Check every parameter and index the usable break requests by round.
    ///
    /// A break after the last round is valid input but has nowhere to go; it
    /// is dropped with a warning rather than rejected.
    fn validate(
        params: &TournamentParams,
    ) -> Result<BTreeMap<u32, &BreakRequest>, ParameterIssue> {
        if params.round_count < 1 {
            return Err(ParameterIssue::NoRounds);
        }
        if params.round_length <= Duration::zero() {
            return Err(ParameterIssue::NonPositiveRoundLength {
                length: params.round_length,
            });
        }
        if params.change_length < Duration::zero() {
            return Err(ParameterIssue::NegativeChangeLength {
                length: params.change_length,
            });
        }
        if params.round_length < min_segment_length() {
            return Err(ParameterIssue::SegmentTooShort {
                kind: SegmentKind::Round,
                length: params.round_length,
            });
        }
        if params.change_length > Duration::zero()
            && params.change_length < min_segment_length()
        {
            return Err(ParameterIssue::SegmentTooShort {
                kind: SegmentKind::Change,
                length: params.change_length,
            });
        }

        let mut by_round = BTreeMap::new();
        for request in &params.breaks {
            let after_round = request.after_round;

            if request.length <= Duration::zero() {
                return Err(ParameterIssue::NonPositiveBreakLength {
                    after_round,
                    length: request.length,
                });
            }
            if request.length < min_segment_length() {
                return Err(ParameterIssue::SegmentTooShort {
                    kind: request.kind.into(),
                    length: request.length,
                });
            }
            if after_round == 0 || after_round > params.round_count {
                return Err(ParameterIssue::BreakOutOfRange {
                    after_round,
                    round_count: params.round_count,
                });
            }
            if request.kind == BreakKind::Custom
                && request
                    .label
                    .as_deref()
                    .map_or(true, |l| l.trim().is_empty())
            {
                return Err(ParameterIssue::MissingCustomLabel { after_round });
            }
            if by_round.contains_key(&after_round) {
                return Err(ParameterIssue::DuplicateBreak { after_round });
            }

            if after_round == params.round_count {
                warn!(
                    after_round,
                    kind = ?request.kind,
                    "break requested after the final round, ignored"
                );
                continue;
            }
            by_round.insert(after_round, request);
        }

        Ok(by_round)
    }
}

/// Sum of every segment length the layout will produce, in milliseconds
/// with checked arithmetic.  `None` when it does not fit a `Duration`.
fn total_span(
    params: &TournamentParams,
    breaks: &BTreeMap<u32, &BreakRequest>,
) -> Option<Duration> {
    let rounds = i64::from(params.round_count);
    let mut total = params.round_length.num_milliseconds().checked_mul(rounds)?;
    total = params
        .change_length
        .num_milliseconds()
        .checked_mul(rounds - 1)
        .and_then(|changes| total.checked_add(changes))?;
    for request in breaks.values() {
        total = total.checked_add(request.length.num_milliseconds())?;
    }
    Some(Duration::milliseconds(total))
}

/// Advance `cursor` by `length`, returning the `[begin, end)` it covered.
fn step(
    cursor: &mut NaiveDateTime,
    length: Duration,
) -> Result<(NaiveDateTime, NaiveDateTime), ParameterIssue> {
    let begin = *cursor;
    let end = begin
        .checked_add_signed(length)
        .ok_or(ParameterIssue::TimeOverflow)?;
    *cursor = end;
    Ok((begin, end))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentName;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    // ── Test helpers ──────────────────────────────────────────────────────────

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 4)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn mins(m: i64) -> Duration {
        Duration::minutes(m)
    }

    fn params(rounds: u32, round: i64, change: i64, breaks: Vec<BreakRequest>) -> TournamentParams {
        TournamentParams {
            start: t0(),
            round_count: rounds,
            round_length: mins(round),
            change_length: mins(change),
            breaks,
        }
    }

    fn issue(p: &TournamentParams) -> ParameterIssue {
        ScheduleBuilder::build(p).unwrap_err().issue().clone()
    }

    // ── Layout ────────────────────────────────────────────────────────────────

    #[test]
    fn lunch_after_round_one_layout() {
        let p = params(
            3,
            30,
            5,
            vec![BreakRequest::new(1, BreakKind::Lunch, mins(60))],
        );
        let tl = ScheduleBuilder::build(&p).unwrap();

        let expected = [
            (SegmentName::Round(1), 0, 30),
            (SegmentName::Lunch, 30, 90),
            (SegmentName::Change, 90, 95),
            (SegmentName::Round(2), 95, 125),
            (SegmentName::Change, 125, 130),
            (SegmentName::Round(3), 130, 160),
        ];
        assert_eq!(tl.len(), expected.len());
        for (seg, (name, b, e)) in tl.segments().iter().zip(expected) {
            assert_eq!(seg.name(), name);
            assert_eq!(seg.begin, t0() + mins(b), "begin of {name}");
            assert_eq!(seg.end, t0() + mins(e), "end of {name}");
        }
        assert_eq!(tl.end(), t0() + mins(160));
    }

    #[test]
    fn single_round_ignores_break_request() {
        let p = params(
            1,
            30,
            5,
            vec![BreakRequest::new(1, BreakKind::Coffee, mins(15))],
        );
        let tl = ScheduleBuilder::build(&p).unwrap();
        assert_eq!(tl.len(), 1);
        assert_eq!(tl.segments()[0].name(), SegmentName::Round(1));
        assert_eq!(tl.end(), t0() + mins(30));
    }

    #[test]
    fn break_after_last_round_is_ignored() {
        let p = params(
            2,
            20,
            2,
            vec![BreakRequest::new(2, BreakKind::Dinner, mins(45))],
        );
        let tl = ScheduleBuilder::build(&p).unwrap();
        let kinds: Vec<_> = tl.segments().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SegmentKind::Round, SegmentKind::Change, SegmentKind::Round]
        );
    }

    #[test]
    fn zero_change_length_skips_changes() {
        let p = params(
            3,
            10,
            0,
            vec![BreakRequest::new(2, BreakKind::Coffee, mins(15))],
        );
        let tl = ScheduleBuilder::build(&p).unwrap();
        let kinds: Vec<_> = tl.segments().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::Round,
                SegmentKind::Round,
                SegmentKind::Coffee,
                SegmentKind::Round
            ]
        );
        assert_eq!(tl.end(), t0() + mins(45));
    }

    #[test]
    fn custom_break_keeps_its_label() {
        let p = params(
            2,
            30,
            5,
            vec![BreakRequest::custom(1, "Prize giving", mins(20))],
        );
        let tl = ScheduleBuilder::build(&p).unwrap();
        assert_eq!(
            tl.segments()[1].name(),
            SegmentName::Custom("Prize giving".into())
        );
    }

    #[test]
    fn breaks_are_placed_by_round_not_request_order() {
        let p = params(
            4,
            30,
            5,
            vec![
                BreakRequest::new(3, BreakKind::Dinner, mins(60)),
                BreakRequest::new(1, BreakKind::Coffee, mins(10)),
            ],
        );
        let tl = ScheduleBuilder::build(&p).unwrap();
        let kinds: Vec<_> = tl.segments().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::Round,
                SegmentKind::Coffee,
                SegmentKind::Change,
                SegmentKind::Round,
                SegmentKind::Change,
                SegmentKind::Round,
                SegmentKind::Dinner,
                SegmentKind::Change,
                SegmentKind::Round,
            ]
        );
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn zero_rounds_is_rejected() {
        assert_eq!(issue(&params(0, 30, 5, vec![])), ParameterIssue::NoRounds);
    }

    #[test]
    fn non_positive_round_length_is_rejected() {
        assert!(matches!(
            issue(&params(3, 0, 5, vec![])),
            ParameterIssue::NonPositiveRoundLength { .. }
        ));
        assert!(matches!(
            issue(&params(3, -10, 5, vec![])),
            ParameterIssue::NonPositiveRoundLength { .. }
        ));
    }

    #[test]
    fn negative_change_length_is_rejected() {
        assert!(matches!(
            issue(&params(3, 30, -1, vec![])),
            ParameterIssue::NegativeChangeLength { .. }
        ));
    }

    #[test]
    fn non_positive_break_length_is_rejected() {
        let p = params(3, 30, 5, vec![BreakRequest::new(1, BreakKind::Lunch, mins(0))]);
        assert!(matches!(
            issue(&p),
            ParameterIssue::NonPositiveBreakLength { after_round: 1, .. }
        ));
    }

    #[test]
    fn lengths_below_one_second_are_rejected() {
        let short = Duration::milliseconds(500);

        let mut p = params(2, 30, 5, vec![]);
        p.round_length = short;
        assert_eq!(
            issue(&p),
            ParameterIssue::SegmentTooShort {
                kind: SegmentKind::Round,
                length: short
            }
        );

        let mut p = params(2, 30, 5, vec![]);
        p.change_length = short;
        assert_eq!(
            issue(&p),
            ParameterIssue::SegmentTooShort {
                kind: SegmentKind::Change,
                length: short
            }
        );

        let p = params(3, 30, 5, vec![BreakRequest::new(1, BreakKind::Coffee, short)]);
        assert_eq!(
            issue(&p),
            ParameterIssue::SegmentTooShort {
                kind: SegmentKind::Coffee,
                length: short
            }
        );
    }

    #[test]
    fn exactly_one_second_segments_are_accepted() {
        let one = Duration::seconds(1);
        let mut p = params(3, 30, 5, vec![BreakRequest::new(1, BreakKind::Lunch, one)]);
        p.round_length = one;
        p.change_length = one;
        let tl = ScheduleBuilder::build(&p).unwrap();
        assert!(tl.is_consistent());
        assert_eq!(tl.end(), t0() + Duration::seconds(6));
    }

    #[test]
    fn huge_round_count_overflows_without_allocating() {
        let mut p = params(u32::MAX, 30, 5, vec![]);
        p.round_length = Duration::days(50_000_000);
        assert_eq!(issue(&p), ParameterIssue::TimeOverflow);
    }

    #[test]
    fn span_past_the_calendar_is_rejected() {
        let mut p = params(2, 30, 0, vec![]);
        p.round_length = Duration::days(50_000_000);
        assert_eq!(issue(&p), ParameterIssue::TimeOverflow);
    }

    #[test]
    fn break_outside_round_range_is_rejected() {
        let p = params(3, 30, 5, vec![BreakRequest::new(0, BreakKind::Lunch, mins(60))]);
        assert_eq!(
            issue(&p),
            ParameterIssue::BreakOutOfRange {
                after_round: 0,
                round_count: 3
            }
        );

        let p = params(3, 30, 5, vec![BreakRequest::new(4, BreakKind::Lunch, mins(60))]);
        assert!(matches!(issue(&p), ParameterIssue::BreakOutOfRange { .. }));
    }

    #[test]
    fn custom_break_without_label_is_rejected() {
        let p = params(3, 30, 5, vec![BreakRequest::new(1, BreakKind::Custom, mins(10))]);
        assert_eq!(issue(&p), ParameterIssue::MissingCustomLabel { after_round: 1 });

        let p = params(3, 30, 5, vec![BreakRequest::custom(1, "   ", mins(10))]);
        assert_eq!(issue(&p), ParameterIssue::MissingCustomLabel { after_round: 1 });
    }

    #[test]
    fn two_breaks_on_one_boundary_are_rejected() {
        let p = params(
            3,
            30,
            5,
            vec![
                BreakRequest::new(2, BreakKind::Lunch, mins(60)),
                BreakRequest::new(2, BreakKind::Coffee, mins(10)),
            ],
        );
        assert_eq!(issue(&p), ParameterIssue::DuplicateBreak { after_round: 2 });
    }

    #[test]
    fn error_message_names_the_problem() {
        let err = ScheduleBuilder::build(&params(0, 30, 5, vec![])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid tournament parameters: tournament must have at least one round"
        );
    }

    // ── Properties ────────────────────────────────────────────────────────────

    fn valid_params() -> impl Strategy<Value = TournamentParams> {
        (
            1u32..16,
            1i64..120,
            0i64..15,
            prop::collection::vec((any::<u32>(), 0usize..4, 1i64..90), 0..6),
        )
            .prop_map(|(rounds, round_len, change_len, raw_breaks)| {
                let mut seen = BTreeMap::new();
                for (slot, kind, len) in raw_breaks {
                    let after_round = 1 + slot % rounds;
                    let request = match kind {
                        0 => BreakRequest::new(after_round, BreakKind::Lunch, mins(len)),
                        1 => BreakRequest::new(after_round, BreakKind::Dinner, mins(len)),
                        2 => BreakRequest::new(after_round, BreakKind::Coffee, mins(len)),
                        _ => BreakRequest::custom(after_round, "Custom", mins(len)),
                    };
                    seen.entry(after_round).or_insert(request);
                }
                params(rounds, round_len, change_len, seen.into_values().collect())
            })
    }

    proptest! {
        #[test]
        fn built_timelines_are_contiguous_and_ordered(p in valid_params()) {
            let tl = ScheduleBuilder::build(&p).unwrap();

            prop_assert!(tl.is_consistent());
            prop_assert_eq!(tl.start(), p.start);
            prop_assert_eq!(tl.round_count(), p.round_count as usize);

            let rounds: Vec<u32> = tl.segments().iter().filter_map(|s| s.round).collect();
            let expected: Vec<u32> = (1..=p.round_count).collect();
            prop_assert_eq!(rounds, expected);

            prop_assert_eq!(tl.segments().last().unwrap().kind, SegmentKind::Round);
        }
    }
}
