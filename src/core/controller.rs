//! Render/interaction controller.
//!
//! Drives one timeline view through its render cycle:
//! `Idle -> Loading -> Built -> Rendered -> Idle`. Zoom, fit and filter
//! changes re-enter `Built` from the cached records without refetching;
//! data changes require a new load. Every load is stamped with a generation
//! so a slow fetch that resolves after a newer one is discarded.

use log::{debug, info};

use super::calendar::CalendarDate;
use super::mapper::{self, DEFAULT_ZOOM, ZOOM_STEP};
use super::record::RecordSet;
use super::segment::{Segment, SegmentKind, SegmentMeta};
use super::timeline::{SegmentKey, Timeline, TimelineLayout, TimelineOptions, build_timeline};

/// Where the controller is in its render cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderPhase {
    /// Nothing pending
    #[default]
    Idle,
    /// Waiting for records from the data service
    Loading,
    /// Segments and geometry computed, not yet drawn
    Built,
    /// Geometry drawn
    Rendered,
}

/// Handle for one in-flight load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Read-only details of an activated segment.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub kind: SegmentKind,
    pub label: String,
    pub start: CalendarDate,
    pub end: CalendarDate,
    pub meta: SegmentMeta,
}

type ActivationHook = Box<dyn FnMut(SegmentKind, &SegmentMeta)>;

/// Owns the timeline state for one view.
pub struct TimelineController {
    phase: RenderPhase,
    generation: u64,
    zoom: f32,
    options: TimelineOptions,
    records: Option<RecordSet>,
    timeline: Option<Timeline>,
    layout: Option<TimelineLayout>,
    detail: Option<DetailView>,
    needs_reload: bool,
    on_activated: Option<ActivationHook>,
}

impl Default for TimelineController {
    fn default() -> Self {
        Self::new(TimelineOptions::default(), DEFAULT_ZOOM)
    }
}

impl std::fmt::Debug for TimelineController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineController")
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .field("zoom", &self.zoom)
            .field("needs_reload", &self.needs_reload)
            .finish_non_exhaustive()
    }
}

impl TimelineController {
    /// Create a controller. The first load is requested immediately.
    pub fn new(options: TimelineOptions, zoom: f32) -> Self {
        Self {
            phase: RenderPhase::Idle,
            generation: 0,
            zoom: mapper::clamp_zoom(zoom),
            options,
            records: None,
            timeline: None,
            layout: None,
            detail: None,
            needs_reload: true,
            on_activated: None,
        }
    }

    /// Register the hook called whenever a segment is activated.
    pub fn set_activation_hook(&mut self, hook: impl FnMut(SegmentKind, &SegmentMeta) + 'static) {
        self.on_activated = Some(Box::new(hook));
    }

    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn options(&self) -> &TimelineOptions {
        &self.options
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    pub fn layout(&self) -> Option<&TimelineLayout> {
        self.layout.as_ref()
    }

    pub fn detail(&self) -> Option<&DetailView> {
        self.detail.as_ref()
    }

    /// Check if the underlying records changed and a load should start.
    pub fn needs_reload(&self) -> bool {
        self.needs_reload
    }

    /// Mark the source records as changed.
    pub fn invalidate(&mut self) {
        self.needs_reload = true;
    }

    /// Start a load. Any load still in flight becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.needs_reload = false;
        self.phase = RenderPhase::Loading;
        debug!("load generation {} started", self.generation);
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Accept the records of a finished load.
    ///
    /// Returns false (and changes nothing) if a newer load has started since
    /// `ticket` was issued.
    pub fn complete_load(&mut self, ticket: LoadTicket, records: RecordSet) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "discarding stale load generation {} (current {})",
                ticket.generation, self.generation
            );
            return false;
        }

        info!(
            "loaded {} records (generation {})",
            records.len(),
            ticket.generation
        );
        self.records = Some(records);
        self.detail = None;
        self.rebuild();
        true
    }

    /// Replace the per-render options and rebuild from the cached records.
    pub fn set_options(&mut self, options: TimelineOptions) {
        if options == self.options {
            return;
        }
        self.options = options;
        if self.records.is_some() {
            self.rebuild();
        }
    }

    fn rebuild(&mut self) {
        let timeline = match &self.records {
            Some(records) => build_timeline(records, &self.options),
            None => build_timeline(&RecordSet::default(), &self.options),
        };
        self.layout = Some(TimelineLayout::compute(&timeline, self.zoom));
        self.timeline = Some(timeline);
        self.phase = RenderPhase::Built;
    }

    /// Recompute geometry only. No-op before the first build.
    fn relayout(&mut self) {
        if let Some(timeline) = &self.timeline {
            self.layout = Some(TimelineLayout::compute(timeline, self.zoom));
            self.phase = RenderPhase::Built;
        }
    }

    /// Set the zoom factor, clamped to the valid band.
    pub fn set_zoom(&mut self, zoom: f32) {
        let zoom = mapper::clamp_zoom(zoom);
        if zoom == self.zoom {
            return;
        }
        self.zoom = zoom;
        self.relayout();
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - ZOOM_STEP);
    }

    /// Zoom so the whole range spans a bit more than the viewport.
    pub fn fit(&mut self, viewport_width: f32) {
        let month_count = self
            .timeline
            .as_ref()
            .map(|t| t.range.month_count())
            .unwrap_or(0);
        self.set_zoom(mapper::fit_zoom(month_count, viewport_width));
    }

    /// Record that the current geometry has been drawn.
    pub fn mark_rendered(&mut self) {
        if self.phase == RenderPhase::Built {
            self.phase = RenderPhase::Rendered;
        }
    }

    /// Return to idle once a drawn frame needs no further work.
    pub fn settle(&mut self) {
        if self.phase == RenderPhase::Rendered {
            self.phase = RenderPhase::Idle;
        }
    }

    /// Activate the segment under a point in timeline body coordinates.
    pub fn activate_at(&mut self, x: f32, y: f32) -> bool {
        let key = self.layout.as_ref().and_then(|l| l.hit_test(x, y));
        match key {
            Some(key) => self.activate(key),
            None => false,
        }
    }

    /// Open the detail view for the segment at `key`.
    pub fn activate(&mut self, key: SegmentKey) -> bool {
        let Some(segment) = self.timeline.as_ref().and_then(|t| t.segment(key)) else {
            return false;
        };
        self.open_detail(segment.clone())
    }

    /// Open the detail view for the segment built from `meta`.
    ///
    /// Matches on the source collection, id and role, so an event and the
    /// separate record marking its end stay distinct.
    pub fn activate_segment(&mut self, kind: SegmentKind, meta: &SegmentMeta) -> bool {
        let found = self.timeline.as_ref().and_then(|t| {
            t.lanes
                .iter()
                .flat_map(|lane| lane.all_segments())
                .find(|s| {
                    s.kind == kind
                        && s.meta.collection == meta.collection
                        && s.meta.id == meta.id
                        && s.meta.role == meta.role
                })
                .cloned()
        });
        match found {
            Some(segment) => self.open_detail(segment),
            None => false,
        }
    }

    /// Notify the activation hook and show the segment's details.
    fn open_detail(&mut self, segment: Segment) -> bool {
        let detail = DetailView {
            kind: segment.kind,
            start: segment.start_day().date(),
            end: segment.end_day().date(),
            label: segment.label,
            meta: segment.meta,
        };

        if let Some(hook) = self.on_activated.as_mut() {
            hook(detail.kind, &detail.meta);
        }
        self.detail = Some(detail);
        true
    }

    /// Close the detail view without refetching.
    pub fn close_detail(&mut self) {
        if self.detail.take().is_some() && self.phase == RenderPhase::Idle {
            self.phase = RenderPhase::Rendered;
        }
    }
}
