//! Filter state for lane visibility.
//!
//! This module defines the filter used to control which lanes are built
//! and displayed on the timeline.

use super::segment::SegmentKind;

/// Filter state for controlling lane visibility on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneFilter {
    /// Whether to show the story lane
    pub show_story: bool,
    /// Whether to show NSC lifetimes
    pub show_nscs: bool,
    /// Whether to show object lifetimes
    pub show_objects: bool,
}

impl Default for LaneFilter {
    fn default() -> Self {
        Self {
            show_story: true,
            show_nscs: true,
            show_objects: true,
        }
    }
}

impl LaneFilter {
    /// Create a new filter with every lane visible.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if segments of a kind should be shown.
    pub fn is_visible(&self, kind: SegmentKind) -> bool {
        match kind {
            SegmentKind::Story => self.show_story,
            SegmentKind::NscLifetime => self.show_nscs,
            SegmentKind::ObjectLifetime => self.show_objects,
        }
    }

    /// Set visibility of a kind.
    pub fn set_visible(&mut self, kind: SegmentKind, visible: bool) {
        match kind {
            SegmentKind::Story => self.show_story = visible,
            SegmentKind::NscLifetime => self.show_nscs = visible,
            SegmentKind::ObjectLifetime => self.show_objects = visible,
        }
    }

    /// Toggle visibility of a kind.
    pub fn toggle(&mut self, kind: SegmentKind) {
        self.set_visible(kind, !self.is_visible(kind));
    }

    /// Check if every lane is visible.
    pub fn all_visible(&self) -> bool {
        SegmentKind::ALL.iter().all(|k| self.is_visible(*k))
    }

    /// Short description for the filter dropdown.
    pub fn summary(&self) -> String {
        if self.all_visible() {
            return "All Lanes".to_string();
        }
        let visible: Vec<&str> = SegmentKind::ALL
            .iter()
            .filter(|k| self.is_visible(**k))
            .map(|k| k.lane_name())
            .collect();
        if visible.is_empty() {
            "No Lanes".to_string()
        } else {
            visible.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shows_everything() {
        let filter = LaneFilter::new();
        for kind in SegmentKind::ALL {
            assert!(filter.is_visible(kind));
        }
        assert_eq!(filter.summary(), "All Lanes");
    }

    #[test]
    fn test_toggle() {
        let mut filter = LaneFilter::new();
        filter.toggle(SegmentKind::NscLifetime);
        assert!(!filter.is_visible(SegmentKind::NscLifetime));
        assert!(filter.is_visible(SegmentKind::Story));
        assert_eq!(filter.summary(), "Story, Objects");

        filter.toggle(SegmentKind::NscLifetime);
        assert!(filter.all_visible());
    }

    #[test]
    fn test_none_visible_summary() {
        let mut filter = LaneFilter::new();
        for kind in SegmentKind::ALL {
            filter.set_visible(kind, false);
        }
        assert_eq!(filter.summary(), "No Lanes");
    }
}
