//! Segment building.
//!
//! Normalizes the three record shapes (story events, NSC lifetimes and
//! object lifetimes) into a uniform `Segment` that the lane packer and the
//! coordinate mapper work on. Segments are rebuilt on every render.

use log::debug;

use super::calendar::{CalendarDate, DayNumber};
use super::record::{self, NSCS, OBJECTS, Record, STORY_EVENTS};

/// Field names read from story event records.
pub mod event_fields {
    pub const TITLE: &str = "title";
    pub const START: &str = "start_date";
    pub const END: &str = "end_date";
    /// Id of the event this record closes
    pub const ENDS_EVENT: &str = "ends_event";
}

/// Field names read from NSC and object records.
pub mod lifetime_fields {
    pub const NAME: &str = "name";
    pub const FIRST_SEEN: &str = "first_seen";
    pub const LAST_SEEN: &str = "last_seen";
    pub const IS_ACTIVE: &str = "is_active";
}

/// What a segment represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SegmentKind {
    /// A story event (point or range)
    Story,
    /// The time an NSC has been known to the party
    NscLifetime,
    /// The time an object has been known to the party
    ObjectLifetime,
}

impl SegmentKind {
    /// All kinds, in lane display order.
    pub const ALL: [SegmentKind; 3] = [
        SegmentKind::Story,
        SegmentKind::NscLifetime,
        SegmentKind::ObjectLifetime,
    ];

    /// Name of the lane holding segments of this kind.
    pub fn lane_name(self) -> &'static str {
        match self {
            SegmentKind::Story => "Story",
            SegmentKind::NscLifetime => "NSCs",
            SegmentKind::ObjectLifetime => "Objects",
        }
    }

    /// Store collection the source records come from.
    pub fn collection(self) -> &'static str {
        match self {
            SegmentKind::Story => STORY_EVENTS,
            SegmentKind::NscLifetime => NSCS,
            SegmentKind::ObjectLifetime => OBJECTS,
        }
    }
}

/// How a segment relates to its source record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentRole {
    /// A story event from its start to its end (or a point if no end)
    Span,
    /// A separate record marking the end of another event
    EndMarker,
    /// An entity lifetime; `active` lifetimes end at the reference date
    Lifetime { active: bool },
}

/// Source information carried by a segment for detail views.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentMeta {
    /// Collection the record came from
    pub collection: &'static str,
    /// Record id, if the record has one
    pub id: Option<String>,
    pub role: SegmentRole,
    /// The untouched source record
    pub record: Record,
}

/// A time-spanning unit on the timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub label: String,
    start_day: DayNumber,
    end_day: DayNumber,
    pub meta: SegmentMeta,
}

impl Segment {
    /// Create a segment. An end before the start is clamped to the start.
    pub fn new(
        kind: SegmentKind,
        label: impl Into<String>,
        start_day: DayNumber,
        end_day: DayNumber,
        meta: SegmentMeta,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            start_day,
            end_day: end_day.max(start_day),
            meta,
        }
    }

    pub fn start_day(&self) -> DayNumber {
        self.start_day
    }

    pub fn end_day(&self) -> DayNumber {
        self.end_day
    }

    /// Length in days; zero for point segments.
    #[allow(dead_code)]
    pub fn duration_days(&self) -> i64 {
        self.end_day.0 - self.start_day.0
    }

    /// Check if two segments share at least one day (touching counts).
    #[allow(dead_code)] // Row placement compares against row ends directly
    pub fn overlaps(&self, other: &Segment) -> bool {
        self.start_day <= other.end_day && other.start_day <= self.end_day
    }
}

/// Build story event segments.
///
/// Each record becomes exactly one segment. A record that ends another event
/// stays its own marker and is never merged into the event it ends.
pub fn build_story_segments(records: &[Record]) -> Vec<Segment> {
    records
        .iter()
        .filter_map(|r| {
            let Some(start) = record::read_date(r, event_fields::START) else {
                debug!("dropping story event without start date: {:?}", record::read_id(r));
                return None;
            };
            let end = record::read_date(r, event_fields::END).unwrap_or(start);

            let role = if r.get(event_fields::ENDS_EVENT).is_some_and(|v| !v.is_null()) {
                SegmentRole::EndMarker
            } else {
                SegmentRole::Span
            };

            let label = record::read_str(r, event_fields::TITLE).unwrap_or("Untitled event");
            Some(Segment::new(
                SegmentKind::Story,
                label,
                start.day_number(),
                end.day_number(),
                SegmentMeta {
                    collection: STORY_EVENTS,
                    id: record::read_id(r),
                    role,
                    record: r.clone(),
                },
            ))
        })
        .collect()
}

/// Build lifetime segments for NSCs or objects.
///
/// An active entity's segment runs to `reference_date`, so it grows as the
/// campaign date advances. An inactive one runs to its last-seen date, or is
/// a point at first sight when that is unknown.
pub fn build_lifetime_segments(
    kind: SegmentKind,
    records: &[Record],
    reference_date: Option<CalendarDate>,
) -> Vec<Segment> {
    records
        .iter()
        .filter_map(|r| {
            let Some(first_seen) = record::read_date(r, lifetime_fields::FIRST_SEEN) else {
                debug!(
                    "dropping {} record without first sighting: {:?}",
                    kind.collection(),
                    record::read_id(r)
                );
                return None;
            };

            let active = record::read_flag(r, lifetime_fields::IS_ACTIVE);
            let last_seen = record::read_date(r, lifetime_fields::LAST_SEEN);
            let end = match (active, reference_date) {
                (true, Some(today)) => today,
                _ => last_seen.unwrap_or(first_seen),
            };

            let label = record::read_str(r, lifetime_fields::NAME).unwrap_or("Unnamed");
            Some(Segment::new(
                kind,
                label,
                first_seen.day_number(),
                end.day_number(),
                SegmentMeta {
                    collection: kind.collection(),
                    id: record::read_id(r),
                    role: SegmentRole::Lifetime { active },
                    record: r.clone(),
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calendar::to_day_number;
    use serde_json::{Value, json};

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn date(year: i64, month: u8, day: u8) -> CalendarDate {
        CalendarDate::new(year, month, day).unwrap()
    }

    #[test]
    fn test_point_and_range_events() {
        let segments = build_story_segments(&records(vec![
            json!({ "id": "a", "title": "Arrival", "start_date": "1027-01-05" }),
            json!({ "id": "b", "title": "Siege", "start_date": "1027-03-01", "end_date": "1027-03-20" }),
        ]));

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].duration_days(), 0);
        assert_eq!(segments[0].label, "Arrival");
        assert_eq!(segments[1].start_day(), to_day_number(date(1027, 3, 1)));
        assert_eq!(segments[1].end_day(), to_day_number(date(1027, 3, 20)));
        assert_eq!(segments[1].meta.role, SegmentRole::Span);
        assert_eq!(segments[1].meta.id.as_deref(), Some("b"));
    }

    #[test]
    fn test_end_record_is_independent_marker() {
        let segments = build_story_segments(&records(vec![
            json!({ "id": "war", "title": "War begins", "start_date": "1027-02-01" }),
            json!({ "id": "peace", "title": "War ends", "start_date": "1027-09-10", "ends_event": "war" }),
        ]));

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].meta.role, SegmentRole::Span);
        assert_eq!(segments[0].duration_days(), 0);
        assert_eq!(segments[1].meta.role, SegmentRole::EndMarker);
        assert_eq!(segments[1].start_day(), to_day_number(date(1027, 9, 10)));
    }

    #[test]
    fn test_missing_start_is_dropped() {
        let segments = build_story_segments(&records(vec![
            json!({ "id": "a", "title": "No date" }),
            json!({ "id": "b", "title": "Bad date", "start_date": "someday" }),
            json!({ "id": "c", "title": "Ok", "start_date": "1027-01-01" }),
        ]));
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].meta.id.as_deref(), Some("c"));
    }

    #[test]
    fn test_out_of_bound_year_is_dropped() {
        let segments = build_story_segments(&records(vec![
            json!({ "id": "typo", "title": "Typo", "start_date": { "year": 100_000_000_000_000_000i64, "month": 1, "day": 1 } }),
            json!({ "id": "ok", "title": "Ok", "start_date": "1027-01-01", "end_date": "100000000000000000-01-01" }),
        ]));
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].meta.id.as_deref(), Some("ok"));
        assert_eq!(segments[0].duration_days(), 0);
    }

    #[test]
    fn test_end_before_start_is_clamped() {
        let segments = build_story_segments(&records(vec![json!({
            "title": "Backwards",
            "start_date": "1027-05-10",
            "end_date": "1027-05-01"
        })]));
        assert_eq!(segments[0].start_day(), segments[0].end_day());
    }

    #[test]
    fn test_missing_title_gets_placeholder() {
        let segments =
            build_story_segments(&records(vec![json!({ "start_date": "1027-01-01" })]));
        assert_eq!(segments[0].label, "Untitled event");
    }

    #[test]
    fn test_active_lifetime_grows_with_reference_date() {
        let source = records(vec![json!({
            "id": 1,
            "name": "Alrik",
            "first_seen": { "year": 1027, "month": 1, "day": 1 },
            "is_active": true
        })]);
        let snapshot = source.clone();

        let before =
            build_lifetime_segments(SegmentKind::NscLifetime, &source, Some(date(1027, 6, 15)));
        assert_eq!(before[0].start_day(), to_day_number(date(1027, 1, 1)));
        assert_eq!(before[0].end_day(), to_day_number(date(1027, 6, 15)));
        assert_eq!(before[0].meta.role, SegmentRole::Lifetime { active: true });

        let after =
            build_lifetime_segments(SegmentKind::NscLifetime, &source, Some(date(1027, 7, 1)));
        assert_eq!(after[0].end_day(), to_day_number(date(1027, 7, 1)));
        assert!(after[0].duration_days() > before[0].duration_days());
        assert_eq!(source, snapshot);
    }

    #[test]
    fn test_inactive_lifetime_uses_last_seen() {
        let segments = build_lifetime_segments(
            SegmentKind::ObjectLifetime,
            &records(vec![
                json!({ "name": "Sword", "first_seen": "1027-02-01", "last_seen": "1027-04-01" }),
                json!({ "name": "Ring", "first_seen": "1027-02-01" }),
            ]),
            Some(date(1027, 12, 1)),
        );
        assert_eq!(segments[0].end_day(), to_day_number(date(1027, 4, 1)));
        assert_eq!(segments[0].meta.collection, OBJECTS);
        assert_eq!(segments[1].duration_days(), 0);
    }

    #[test]
    fn test_active_without_reference_date_falls_back_to_last_seen() {
        let segments = build_lifetime_segments(
            SegmentKind::NscLifetime,
            &records(vec![json!({
                "name": "Alrik",
                "first_seen": "1027-02-01",
                "last_seen": "1027-03-01",
                "is_active": true
            })]),
            None,
        );
        assert_eq!(segments[0].end_day(), to_day_number(date(1027, 3, 1)));
    }

    #[test]
    fn test_active_reference_before_first_seen_is_clamped() {
        let segments = build_lifetime_segments(
            SegmentKind::NscLifetime,
            &records(vec![json!({ "name": "Future", "first_seen": "1030-01-01", "is_active": true })]),
            Some(date(1027, 1, 1)),
        );
        assert_eq!(segments[0].duration_days(), 0);
        assert_eq!(segments[0].start_day(), to_day_number(date(1030, 1, 1)));
    }

    #[test]
    fn test_overlap_counts_touching_endpoints() {
        let meta = SegmentMeta {
            collection: STORY_EVENTS,
            id: None,
            role: SegmentRole::Span,
            record: Record::new(),
        };
        let a = Segment::new(SegmentKind::Story, "a", DayNumber(10), DayNumber(20), meta.clone());
        let b = Segment::new(SegmentKind::Story, "b", DayNumber(20), DayNumber(30), meta.clone());
        let c = Segment::new(SegmentKind::Story, "c", DayNumber(21), DayNumber(30), meta);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
