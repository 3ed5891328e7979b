//! Lane packing.
//!
//! Each lane is laid out independently: segments are assigned to the lowest
//! row where they do not overlap anything already placed. Rows are filled in
//! start order, so the number of rows equals the largest set of segments
//! that all overlap each other.

use super::calendar::DayNumber;
use super::segment::{Segment, SegmentKind};

/// A sub-track of a lane holding segments that never overlap in time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    segments: Vec<Segment>,
}

impl Row {
    /// Last occupied day of this row.
    pub fn end_day(&self) -> Option<DayNumber> {
        self.segments.last().map(Segment::end_day)
    }

    /// Place `segment` if it starts strictly after this row's last end day.
    ///
    /// Touching endpoints count as overlapping. On rejection the segment is
    /// handed back unchanged.
    fn try_place(&mut self, segment: Segment) -> Result<(), Segment> {
        match self.end_day() {
            Some(end) if segment.start_day() <= end => Err(segment),
            _ => {
                self.segments.push(segment);
                Ok(())
            }
        }
    }

    /// Segments in this row, in start order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// A named category of segments, packed into rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Lane {
    pub name: String,
    pub kind: SegmentKind,
    rows: Vec<Row>,
}

impl Lane {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows (highest assigned row index plus one).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Total number of segments across all rows.
    pub fn segment_count(&self) -> usize {
        self.rows.iter().map(Row::len).sum()
    }

    /// Every segment with the index of the row it was placed in.
    pub fn placements(&self) -> impl Iterator<Item = (usize, &Segment)> {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(row, r)| r.segments.iter().map(move |s| (row, s)))
    }

    pub fn all_segments(&self) -> impl Iterator<Item = &Segment> {
        self.placements().map(|(_, s)| s)
    }
}

/// Pack a lane's segments into the fewest non-overlapping rows.
///
/// Segments are sorted by start day, then end day; the sort is stable so
/// identical input always yields identical rows.
pub fn pack_lane(name: impl Into<String>, kind: SegmentKind, mut segments: Vec<Segment>) -> Lane {
    segments.sort_by_key(|s| (s.start_day(), s.end_day()));

    let mut rows: Vec<Row> = Vec::new();
    'segments: for segment in segments {
        let mut pending = segment;
        for row in rows.iter_mut() {
            match row.try_place(pending) {
                Ok(()) => continue 'segments,
                Err(rejected) => pending = rejected,
            }
        }
        rows.push(Row {
            segments: vec![pending],
        });
    }

    Lane {
        name: name.into(),
        kind,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{Record, STORY_EVENTS};
    use crate::core::segment::{SegmentMeta, SegmentRole};

    fn seg(label: &str, start: i64, end: i64) -> Segment {
        Segment::new(
            SegmentKind::Story,
            label,
            DayNumber(start),
            DayNumber(end),
            SegmentMeta {
                collection: STORY_EVENTS,
                id: Some(label.to_string()),
                role: SegmentRole::Span,
                record: Record::new(),
            },
        )
    }

    fn row_of(lane: &Lane, label: &str) -> usize {
        lane.placements()
            .find(|(_, s)| s.label == label)
            .map(|(row, _)| row)
            .unwrap()
    }

    /// Largest number of intervals sharing a single day.
    fn max_clique(intervals: &[(i64, i64)]) -> usize {
        let lo = intervals.iter().map(|i| i.0).min().unwrap_or(0);
        let hi = intervals.iter().map(|i| i.1).max().unwrap_or(0);
        (lo..=hi)
            .map(|t| intervals.iter().filter(|(s, e)| *s <= t && t <= *e).count())
            .max()
            .unwrap_or(0)
    }

    /// Small deterministic generator so the property tests need no extra crates.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: i64) -> i64 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((self.0 >> 33) % bound as u64) as i64
        }
    }

    #[test]
    fn test_scenario_nested_and_following() {
        let lane = pack_lane(
            "Story",
            SegmentKind::Story,
            vec![seg("a", 10, 40), seg("b", 20, 30), seg("c", 35, 50)],
        );
        assert_eq!(row_of(&lane, "a"), 0);
        assert_eq!(row_of(&lane, "b"), 1);
        assert_eq!(row_of(&lane, "c"), 1);
        assert_eq!(lane.row_count(), 2);
    }

    #[test]
    fn test_touching_endpoints_need_new_row() {
        let lane = pack_lane(
            "Story",
            SegmentKind::Story,
            vec![seg("a", 0, 10), seg("b", 10, 20), seg("c", 11, 20)],
        );
        assert_eq!(row_of(&lane, "a"), 0);
        assert_eq!(row_of(&lane, "b"), 1);
        assert_eq!(row_of(&lane, "c"), 0);
    }

    #[test]
    fn test_zero_length_segments_on_same_day_stack() {
        let lane = pack_lane(
            "Story",
            SegmentKind::Story,
            vec![seg("a", 5, 5), seg("b", 5, 5), seg("c", 6, 6)],
        );
        assert_eq!(lane.row_count(), 2);
        assert_eq!(row_of(&lane, "c"), 0);
    }

    #[test]
    fn test_unsorted_input_is_sorted_first() {
        let lane = pack_lane(
            "Story",
            SegmentKind::Story,
            vec![seg("late", 100, 110), seg("early", 0, 10), seg("mid", 50, 60)],
        );
        assert_eq!(lane.row_count(), 1);
        let labels: Vec<&str> = lane.rows()[0]
            .segments()
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, vec!["early", "mid", "late"]);
    }

    #[test]
    fn test_empty_lane_has_no_rows() {
        let lane = pack_lane("Objects", SegmentKind::ObjectLifetime, Vec::new());
        assert_eq!(lane.row_count(), 0);
        assert_eq!(lane.segment_count(), 0);
    }

    #[test]
    fn test_rows_never_overlap_and_are_minimal() {
        let mut rng = Lcg(42);
        for _ in 0..200 {
            let count = 1 + rng.next(12) as usize;
            let intervals: Vec<(i64, i64)> = (0..count)
                .map(|_| {
                    let start = rng.next(60);
                    (start, start + rng.next(20))
                })
                .collect();
            let segments = intervals
                .iter()
                .enumerate()
                .map(|(i, (s, e))| seg(&i.to_string(), *s, *e))
                .collect();

            let lane = pack_lane("Story", SegmentKind::Story, segments);

            assert_eq!(lane.segment_count(), count);
            for row in lane.rows() {
                for (i, a) in row.segments().iter().enumerate() {
                    for b in &row.segments()[i + 1..] {
                        assert!(!a.overlaps(b), "{:?} overlaps {:?}", a.label, b.label);
                    }
                }
            }
            assert_eq!(lane.row_count(), max_clique(&intervals));
        }
    }

    #[test]
    fn test_packing_is_deterministic() {
        let input = vec![
            seg("a", 0, 10),
            seg("b", 0, 10),
            seg("c", 5, 15),
            seg("d", 0, 10),
            seg("e", 12, 12),
        ];
        let first = pack_lane("Story", SegmentKind::Story, input.clone());
        let second = pack_lane("Story", SegmentKind::Story, input);
        assert_eq!(first, second);

        // Equal keys keep input order
        assert_eq!(row_of(&first, "a"), 0);
        assert_eq!(row_of(&first, "b"), 1);
        assert_eq!(row_of(&first, "d"), 2);
    }
}
