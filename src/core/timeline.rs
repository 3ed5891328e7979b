//! Timeline composition and geometry.
//!
//! `build_timeline` turns a fetched record set into a range and packed lanes.
//! `TimelineLayout` projects that timeline at one zoom level into rectangles
//! used for both drawing and hit testing, so the two can never disagree.

use log::debug;

use super::calendar::CalendarDate;
use super::filter::LaneFilter;
use super::lane::{Lane, pack_lane};
use super::mapper::CoordinateMapper;
use super::range::{DEFAULT_FALLBACK_YEAR, Range, resolve_range};
use super::record::RecordSet;
use super::segment::{self, Segment, SegmentKind};

/// Height of one row inside a lane.
pub const ROW_HEIGHT: f32 = 24.0;

/// Vertical gap between a segment bar and its row boundaries.
pub const ROW_PADDING: f32 = 3.0;

/// Vertical gap between lanes.
pub const LANE_GAP: f32 = 8.0;

/// Per-render parameters. Passed explicitly so renders never share state.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineOptions {
    /// Campaign date used when the store does not provide one
    pub reference_date: Option<CalendarDate>,
    /// Year shown for an empty timeline when no reference date is known
    pub fallback_year: i64,
    /// Which lanes to build
    pub filter: LaneFilter,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            reference_date: None,
            fallback_year: DEFAULT_FALLBACK_YEAR,
            filter: LaneFilter::default(),
        }
    }
}

/// Range plus packed lanes, ready for layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub range: Range,
    pub lanes: Vec<Lane>,
    /// The "present day" active lifetimes were extended to
    pub reference_date: Option<CalendarDate>,
}

impl Timeline {
    /// Total number of segments across all lanes.
    pub fn segment_count(&self) -> usize {
        self.lanes.iter().map(Lane::segment_count).sum()
    }

    /// Look up a segment by its layout key.
    pub fn segment(&self, key: SegmentKey) -> Option<&Segment> {
        self.lanes
            .get(key.lane)?
            .rows()
            .get(key.row)?
            .segments()
            .get(key.index)
    }
}

/// Build the timeline for one render pass.
///
/// Lanes appear in story, NSC, object order. Lanes hidden by the filter or
/// without any segments are omitted.
pub fn build_timeline(records: &RecordSet, options: &TimelineOptions) -> Timeline {
    let reference_date = records.reference_date.or(options.reference_date);
    let fallback_year = reference_date
        .map(|d| d.year)
        .unwrap_or(options.fallback_year);

    let mut segments_by_kind: Vec<(SegmentKind, Vec<Segment>)> = Vec::new();
    for kind in SegmentKind::ALL {
        if !options.filter.is_visible(kind) {
            continue;
        }
        let segments = match kind {
            SegmentKind::Story => segment::build_story_segments(&records.story_events),
            SegmentKind::NscLifetime => {
                segment::build_lifetime_segments(kind, &records.nscs, reference_date)
            }
            SegmentKind::ObjectLifetime => {
                segment::build_lifetime_segments(kind, &records.objects, reference_date)
            }
        };
        if !segments.is_empty() {
            segments_by_kind.push((kind, segments));
        }
    }

    let all_segments: Vec<Segment> = segments_by_kind
        .iter()
        .flat_map(|(_, segments)| segments.iter().cloned())
        .collect();
    let range = resolve_range(&all_segments, fallback_year);

    let lanes: Vec<Lane> = segments_by_kind
        .into_iter()
        .map(|(kind, segments)| pack_lane(kind.lane_name(), kind, segments))
        .collect();

    debug!(
        "built timeline: {} lanes, {} segments, {} months",
        lanes.len(),
        all_segments.len(),
        range.month_count()
    );

    Timeline {
        range,
        lanes,
        reference_date,
    }
}

/// Identifies a segment inside a timeline: lane, row, position in row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SegmentKey {
    pub lane: usize,
    pub row: usize,
    pub index: usize,
}

/// A segment's rectangle, relative to the top-left of the timeline body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedSegment {
    pub key: SegmentKey,
    pub kind: SegmentKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PlacedSegment {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Vertical band occupied by a lane.
#[derive(Clone, Debug, PartialEq)]
pub struct LaneBand {
    pub name: String,
    pub kind: SegmentKind,
    pub top: f32,
    pub height: f32,
    pub row_count: usize,
}

/// Geometry of a timeline at one zoom level.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineLayout {
    mapper: CoordinateMapper,
    bands: Vec<LaneBand>,
    placed: Vec<PlacedSegment>,
    total_height: f32,
}

impl TimelineLayout {
    /// Project every segment of `timeline` at `zoom`.
    pub fn compute(timeline: &Timeline, zoom: f32) -> Self {
        let mapper = CoordinateMapper::new(timeline.range, zoom);
        let mut bands = Vec::with_capacity(timeline.lanes.len());
        let mut placed = Vec::with_capacity(timeline.segment_count());
        let mut top = 0.0;

        for (lane_index, lane) in timeline.lanes.iter().enumerate() {
            let height = lane.row_count().max(1) as f32 * ROW_HEIGHT;
            bands.push(LaneBand {
                name: lane.name.clone(),
                kind: lane.kind,
                top,
                height,
                row_count: lane.row_count(),
            });

            for (row_index, row) in lane.rows().iter().enumerate() {
                let row_top = top + row_index as f32 * ROW_HEIGHT;
                for (index, segment) in row.segments().iter().enumerate() {
                    placed.push(PlacedSegment {
                        key: SegmentKey {
                            lane: lane_index,
                            row: row_index,
                            index,
                        },
                        kind: segment.kind,
                        x: mapper.day_to_x(segment.start_day()),
                        y: row_top + ROW_PADDING,
                        width: mapper.span_to_width(segment.start_day(), segment.end_day()),
                        height: ROW_HEIGHT - ROW_PADDING * 2.0,
                    });
                }
            }

            top += height + LANE_GAP;
        }

        let total_height = if bands.is_empty() { 0.0 } else { top - LANE_GAP };

        Self {
            mapper,
            bands,
            placed,
            total_height,
        }
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn zoom(&self) -> f32 {
        self.mapper.zoom()
    }

    pub fn bands(&self) -> &[LaneBand] {
        &self.bands
    }

    pub fn placed(&self) -> &[PlacedSegment] {
        &self.placed
    }

    pub fn total_width(&self) -> f32 {
        self.mapper.total_width()
    }

    pub fn total_height(&self) -> f32 {
        self.total_height
    }

    /// Segment under a point, preferring the one drawn last.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<SegmentKey> {
        self.placed
            .iter()
            .rev()
            .find(|p| p.contains(x, y))
            .map(|p| p.key)
    }
}
