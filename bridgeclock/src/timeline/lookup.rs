//! Search and invariant helpers over a sorted, contiguous segment slice.
//!
//! These operate on plain `&[Segment]` so they can be checked without
//! building a [`Timeline`](super::Timeline).

use chrono::{Duration, NaiveDateTime};

use super::Position;
use crate::segment::Segment;

/// Locate the segment active at `t`.
///
/// Binary search over segment ends: the first segment whose `end` is after
/// `t` is the one containing it, because the slice is sorted and gap-free.
/// An empty slice has no span at all and reports [`Position::AfterEnd`].
pub fn locate(segments: &[Segment], t: NaiveDateTime) -> Position {
    let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
        return Position::AfterEnd;
    };
    if t < first.begin {
        return Position::BeforeStart;
    }
    if t >= last.end {
        return Position::AfterEnd;
    }
    Position::At(segments.partition_point(|s| s.end <= t))
}

/// `true` if every segment is at least `min_length` long and each one begins
/// exactly where the previous one ended.
pub fn is_contiguous(segments: &[Segment], min_length: Duration) -> bool {
    segments.iter().all(|s| s.length() >= min_length)
        && segments.windows(2).all(|w| w[0].end == w[1].begin)
}

/// `true` if round numbers appear in non-decreasing order.
pub fn rounds_non_decreasing(segments: &[Segment]) -> bool {
    let rounds: Vec<u32> = segments.iter().filter_map(|s| s.round).collect();
    rounds.windows(2).all(|w| w[0] <= w[1])
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentKind;
    use chrono::NaiveDate;

    fn at(m: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 4)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            + Duration::minutes(m)
    }

    /// Round 1 [0,30) – Change [30,35) – Round 2 [35,65)
    fn three_segments() -> Vec<Segment> {
        vec![
            Segment::round(1, at(0), at(30)),
            Segment::break_of(SegmentKind::Change, None, at(30), at(35)),
            Segment::round(2, at(35), at(65)),
        ]
    }

    #[test]
    fn locate_resolves_boundaries_to_the_later_segment() {
        let segs = three_segments();
        assert_eq!(locate(&segs, at(0)), Position::At(0));
        assert_eq!(locate(&segs, at(29)), Position::At(0));
        assert_eq!(locate(&segs, at(30)), Position::At(1));
        assert_eq!(locate(&segs, at(35)), Position::At(2));
        assert_eq!(locate(&segs, at(64)), Position::At(2));
    }

    #[test]
    fn locate_reports_sentinels_outside_the_span() {
        let segs = three_segments();
        assert_eq!(locate(&segs, at(-1)), Position::BeforeStart);
        assert_eq!(locate(&segs, at(65)), Position::AfterEnd);
        assert_eq!(locate(&segs, at(600)), Position::AfterEnd);
    }

    #[test]
    fn locate_on_empty_slice_is_after_end() {
        assert_eq!(locate(&[], at(0)), Position::AfterEnd);
    }

    #[test]
    fn contiguity_detects_gaps_and_short_segments() {
        let mut segs = three_segments();
        assert!(is_contiguous(&segs, Duration::seconds(1)));

        segs[1].end = at(34);
        assert!(!is_contiguous(&segs, Duration::seconds(1)), "gap not detected");

        let zero = vec![Segment::round(1, at(0), at(0))];
        assert!(!is_contiguous(&zero, Duration::seconds(1)));
    }

    #[test]
    fn round_order_is_checked() {
        let mut segs = three_segments();
        assert!(rounds_non_decreasing(&segs));
        segs[0].round = Some(5);
        assert!(!rounds_non_decreasing(&segs));
    }
}
