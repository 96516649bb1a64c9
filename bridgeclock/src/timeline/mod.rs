//! The ordered, contiguous sequence of segments for one tournament.
//!
//! A [`Timeline`] is only ever created by the
//! [`ScheduleBuilder`](crate::schedule::ScheduleBuilder).  Once built it is
//! changed in exactly one way: [`Timeline::shift_from`], the cascading shift
//! behind live adjustments.  Any other change means building a new timeline.
//!
//! # Invariants
//!
//! | Invariant | Held by |
//! |---|---|
//! | at least one segment, at least one round | builder (`round_count >= 1`) |
//! | `segments[i].end == segments[i + 1].begin` | builder cursor, `shift_from` moves every later boundary by the same delta |
//! | every segment at least [`MIN_SEGMENT_SECS`] long | builder validation, `shift_from` clamping |
//! | round numbers non-decreasing | builder; `shift_from` never reorders |

pub mod lookup;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, warn};

use crate::segment::{Segment, SegmentName};

/// Shortest duration, in seconds, a live adjustment may shrink a segment to.
pub const MIN_SEGMENT_SECS: i64 = 1;

/// [`MIN_SEGMENT_SECS`] as a duration.
pub fn min_segment_length() -> Duration {
    Duration::seconds(MIN_SEGMENT_SECS)
}

// ── Position ──────────────────────────────────────────────────────────────────

/// Result of looking up a timestamp in a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "at", content = "index", rename_all = "snake_case")]
pub enum Position {
    /// Earlier than the first segment's `begin`.
    BeforeStart,
    /// Inside the segment with this index.
    At(usize),
    /// At or after the last segment's `end`.
    AfterEnd,
}

impl Position {
    /// The segment index, or `None` for the two sentinels.
    pub fn index(self) -> Option<usize> {
        match self {
            Position::At(i) => Some(i),
            _ => None,
        }
    }
}

// ── Timeline ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    segments: Vec<Segment>,
}

impl Timeline {
    /// Wrap segments produced by the builder.
    pub(crate) fn from_segments(segments: Vec<Segment>) -> Self {
        let timeline = Self { segments };
        debug_assert!(
            timeline.is_consistent(),
            "builder produced an inconsistent timeline"
        );
        timeline
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false` for a built timeline; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Tournament start (first segment's `begin`).
    pub fn start(&self) -> NaiveDateTime {
        self.segments[0].begin
    }

    /// Tournament end (last segment's `end`).
    pub fn end(&self) -> NaiveDateTime {
        self.segments[self.segments.len() - 1].end
    }

    /// Number of round segments.
    pub fn round_count(&self) -> usize {
        self.segments.iter().filter(|s| s.round.is_some()).count()
    }

    // ── Lookup ────────────────────────────────────────────────────────────────

    /// Which segment is active at `t`.  O(log N).
    pub fn segment_at(&self, t: NaiveDateTime) -> Position {
        lookup::locate(&self.segments, t)
    }

    pub fn previous(&self, index: usize) -> Option<&Segment> {
        index.checked_sub(1).and_then(|i| self.segments.get(i))
    }

    pub fn next(&self, index: usize) -> Option<&Segment> {
        index.checked_add(1).and_then(|i| self.segments.get(i))
    }

    /// Name of the segment before `index`, `None` at the first segment.
    pub fn previous_label(&self, index: usize) -> Option<SegmentName> {
        self.previous(index).map(Segment::name)
    }

    /// Name of the segment after `index`, `None` at the last segment.
    pub fn next_label(&self, index: usize) -> Option<SegmentName> {
        self.next(index).map(Segment::name)
    }

    /// First lunch/dinner/coffee/custom break strictly after `position`.
    ///
    /// Before the start the whole timeline is searched; after the end there
    /// is nothing left.
    pub fn next_break_after(&self, position: Position) -> Option<&Segment> {
        let from = match position {
            Position::BeforeStart => 0,
            Position::At(i) => i + 1,
            Position::AfterEnd => return None,
        };
        self.segments
            .iter()
            .skip(from)
            .find(|s| s.kind.is_scheduled_break())
    }

    // ── Mutation ──────────────────────────────────────────────────────────────

    /// Cascading shift: move the end of `segments[index]` by `delta` and both
    /// boundaries of every later segment by the same amount.
    ///
    /// A negative `delta` is clamped so the segment keeps at least
    /// [`MIN_SEGMENT_SECS`], including one so large the new end would fall
    /// before the representable date range.  Returns the delta actually
    /// applied; zero when `index` is out of range or a positive `delta` would
    /// push the end past the representable range.
    pub fn shift_from(&mut self, index: usize, delta: Duration) -> Duration {
        let Some(target) = self.segments.get(index) else {
            warn!(index, len = self.segments.len(), "shift_from: index out of range");
            return Duration::zero();
        };

        let floor = target.begin + min_segment_length();
        let applied = match target.end.checked_add_signed(delta) {
            Some(end) if end >= floor => delta,
            // Only a negative delta can land below the floor.
            Some(_) => floor - target.end,
            // Underflowing the calendar is shrinking past the floor too.
            None if delta < Duration::zero() => floor - target.end,
            None => {
                warn!(index, delta_s = delta.num_seconds(), "shift_from: delta overflows");
                return Duration::zero();
            }
        };

        if self.end().checked_add_signed(applied).is_none() {
            warn!(index, delta_s = delta.num_seconds(), "shift_from: delta overflows");
            return Duration::zero();
        }

        if applied != delta {
            debug!(
                index,
                requested_s = delta.num_seconds(),
                applied_s = applied.num_seconds(),
                "shift clamped at minimum segment length"
            );
        }
        if applied == Duration::zero() {
            return applied;
        }

        self.segments[index].end += applied;
        for s in &mut self.segments[index + 1..] {
            s.begin += applied;
            s.end += applied;
        }
        applied
    }

    /// Checks every structural invariant listed in the module docs.
    pub fn is_consistent(&self) -> bool {
        !self.segments.is_empty()
            && self.round_count() > 0
            && lookup::is_contiguous(&self.segments, min_segment_length())
            && lookup::rounds_non_decreasing(&self.segments)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
