//! Swipe detection — classify horizontal hand motion into directional
//! swipe events using a three-region model of the frame width.
//!
//! A swipe is armed by a center-band entry and fires on an edge-band
//! entry within a time window. Emits at most one event per armed
//! window; the hand must re-enter the center band to arm again.

use tracing::debug;

use crate::hand::{BoundingBox, FrameSize, Point2};

// ── Direction ──────────────────────────────────────────────

/// A directional swipe event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

// ── Band model ─────────────────────────────────────────────

/// Horizontal band of the frame the reference point falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// Left edge band, fraction (0, 0.1) of the frame width.
    LeftEdge,
    /// Center band, fraction (0.4, 0.6).
    Center,
    /// Right edge band, fraction (0.9, 1.0).
    RightEdge,
    /// Anywhere else (no band behavior).
    Dead,
}

/// How edge bands map to emitted directions.
///
/// The camera feed is usually mirrored for display, so a hand moving
/// toward the frame's left edge reads to the user as a rightward
/// motion. `Mirrored` emits accordingly; `Screen` emits the raw
/// frame-space direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BandMapping {
    #[default]
    Mirrored,
    Screen,
}

impl BandMapping {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mirrored => "mirrored",
            Self::Screen => "screen",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "mirrored" => Some(Self::Mirrored),
            "screen" => Some(Self::Screen),
            _ => None,
        }
    }
}

// ── Config ─────────────────────────────────────────────────

/// Configuration for band geometry and window timing.
#[derive(Debug, Clone)]
pub struct SwipeConfig {
    /// Center (arming) band as width fractions (start, end).
    pub center_band: (f32, f32),
    /// Left edge band as width fractions.
    pub left_band: (f32, f32),
    /// Right edge band as width fractions.
    pub right_band: (f32, f32),
    /// Milliseconds from arming within which an edge entry fires.
    pub window_ms: f64,
    /// Edge-band to direction mapping.
    pub mapping: BandMapping,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            center_band: (0.4, 0.6),
            left_band: (0.0, 0.1),
            right_band: (0.9, 1.0),
            window_ms: 2000.0,
            mapping: BandMapping::Mirrored,
        }
    }
}

// ── Detector ───────────────────────────────────────────────

/// Tracks the hand's horizontal position across frames and emits
/// swipe events on qualifying center-to-edge transitions.
#[derive(Debug)]
pub struct SwipeDetector {
    /// Band geometry and timing configuration.
    pub config: SwipeConfig,
    /// Frame dimensions, fixed at construction.
    size: FrameSize,
    /// Whether a swipe window is armed (hand last seen in center).
    initiated: bool,
    /// Timestamp (ms) of the most recent center-band entry.
    initial_timestamp_ms: f64,
}

impl SwipeDetector {
    pub fn new(size: FrameSize, config: SwipeConfig) -> Self {
        Self {
            config,
            size,
            initiated: false,
            initial_timestamp_ms: -1.0,
        }
    }

    /// Reference point of a bounding box.
    ///
    /// Not a true centroid: the top-left corner is counted twice.
    /// The region thresholds downstream assume exactly this
    /// projection, so the formula is part of the contract.
    pub fn reference_point(rect: &BoundingBox) -> Point2 {
        Point2::new(
            rect.top_left.x + (rect.top_left.x + rect.bottom_right.x) / 2.0,
            rect.top_left.y + (rect.top_left.y + rect.bottom_right.y) / 2.0,
        )
    }

    /// Whether x falls strictly inside a band given as width fractions.
    fn in_band(&self, band: (f32, f32), x: f32) -> bool {
        let w = self.size.width as f32;
        w * band.0 < x && w * band.1 > x
    }

    /// Classify a reference x-coordinate into a band.
    pub fn classify(&self, x: f32) -> Band {
        if self.in_band(self.config.center_band, x) {
            Band::Center
        } else if self.in_band(self.config.left_band, x) {
            Band::LeftEdge
        } else if self.in_band(self.config.right_band, x) {
            Band::RightEdge
        } else {
            Band::Dead
        }
    }

    /// Direction emitted for a left-edge hit under the configured mapping.
    fn left_edge_direction(&self) -> SwipeDirection {
        match self.config.mapping {
            BandMapping::Mirrored => SwipeDirection::Right,
            BandMapping::Screen => SwipeDirection::Left,
        }
    }

    fn right_edge_direction(&self) -> SwipeDirection {
        match self.config.mapping {
            BandMapping::Mirrored => SwipeDirection::Left,
            BandMapping::Screen => SwipeDirection::Right,
        }
    }

    /// Update with the current frame's bounding box.
    ///
    /// Call once per frame in which a hand was detected; frames
    /// without a detection skip the call entirely (state is neither
    /// updated nor reset). Returns a direction when a swipe fires.
    pub fn update(&mut self, rect: &BoundingBox, now_ms: f64) -> Option<SwipeDirection> {
        let reference = Self::reference_point(rect);

        match self.classify(reference.x) {
            Band::Center => {
                // (Re)arm the window. A stale armed window from a
                // lapsed attempt is overwritten here, not before.
                self.initial_timestamp_ms = now_ms;
                self.initiated = true;
                None
            }
            _ if !self.initiated => None,
            Band::LeftEdge if now_ms - self.initial_timestamp_ms < self.config.window_ms => {
                self.initiated = false;
                let direction = self.left_edge_direction();
                debug!("Swipe {} (left edge, x={:.0})", direction.as_str(), reference.x);
                Some(direction)
            }
            Band::RightEdge if now_ms - self.initial_timestamp_ms < self.config.window_ms => {
                self.initiated = false;
                let direction = self.right_edge_direction();
                debug!("Swipe {} (right edge, x={:.0})", direction.as_str(), reference.x);
                Some(direction)
            }
            // Edge hit after the window lapsed, or a dead-band frame:
            // no event. The armed flag is left as-is.
            _ => None,
        }
    }

    /// Whether a swipe window is currently armed.
    pub fn is_armed(&self) -> bool {
        self.initiated
    }

    /// Reset all swipe tracking state.
    pub fn reset(&mut self) {
        self.initiated = false;
        self.initial_timestamp_ms = -1.0;
    }
}

// ── Test helpers ───────────────────────────────────────────

/// A box whose reference point lands at the given x-coordinate.
#[cfg(test)]
pub fn box_with_ref_x(ref_x: f32) -> BoundingBox {
    // reference.x = 2 * top_left.x + box_width / 2, so with a fixed
    // 120px box: top_left.x = (ref_x - 60) / 2.
    let width = 120.0;
    let tl_x = (ref_x - width / 2.0) / 2.0;
    BoundingBox {
        top_left: Point2::new(tl_x, 100.0),
        bottom_right: Point2::new(tl_x + width, 220.0),
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // Frame 640 wide: center band x in (256, 384), left edge (0, 64),
    // right edge (576, 640).
    fn detector(mapping: BandMapping) -> SwipeDetector {
        let config = SwipeConfig {
            mapping,
            ..SwipeConfig::default()
        };
        SwipeDetector::new(FrameSize::new(640, 480), config)
    }

    #[test]
    fn test_reference_point_formula() {
        let rect = BoundingBox {
            top_left: Point2::new(100.0, 50.0),
            bottom_right: Point2::new(300.0, 250.0),
        };
        let p = SwipeDetector::reference_point(&rect);
        assert_eq!(p.x, 100.0 + (100.0 + 300.0) / 2.0);
        assert_eq!(p.y, 50.0 + (50.0 + 250.0) / 2.0);
    }

    #[test]
    fn test_band_thresholds() {
        let det = detector(BandMapping::Mirrored);
        assert_eq!(det.classify(300.0), Band::Center);
        assert_eq!(det.classify(258.0), Band::Center);
        assert_eq!(det.classify(383.0), Band::Center);
        // Just outside the center band on either side.
        assert_eq!(det.classify(255.0), Band::Dead);
        assert_eq!(det.classify(385.0), Band::Dead);
        assert_eq!(det.classify(30.0), Band::LeftEdge);
        assert_eq!(det.classify(63.0), Band::LeftEdge);
        assert_eq!(det.classify(66.0), Band::Dead);
        assert_eq!(det.classify(600.0), Band::RightEdge);
        assert_eq!(det.classify(578.0), Band::RightEdge);
        assert_eq!(det.classify(575.0), Band::Dead);
        assert_eq!(det.classify(250.0), Band::Dead);
    }

    #[test]
    fn test_center_only_never_swipes() {
        let mut det = detector(BandMapping::Mirrored);
        for i in 0..100 {
            let x = 260.0 + (i % 20) as f32 * 6.0; // wanders within (256, 384)
            assert_eq!(det.update(&box_with_ref_x(x), i as f64 * 33.0), None);
        }
        assert!(det.is_armed());
    }

    #[test]
    fn test_center_to_left_edge_within_window() {
        let mut det = detector(BandMapping::Mirrored);
        assert_eq!(det.update(&box_with_ref_x(300.0), 0.0), None);
        assert!(det.is_armed());
        let evt = det.update(&box_with_ref_x(30.0), 500.0);
        assert_eq!(evt, Some(SwipeDirection::Right)); // mirrored mapping
        assert!(!det.is_armed());
    }

    #[test]
    fn test_center_to_right_edge_within_window() {
        let mut det = detector(BandMapping::Mirrored);
        det.update(&box_with_ref_x(300.0), 0.0);
        let evt = det.update(&box_with_ref_x(600.0), 1999.0);
        assert_eq!(evt, Some(SwipeDirection::Left));
    }

    #[test]
    fn test_screen_mapping() {
        let mut det = detector(BandMapping::Screen);
        det.update(&box_with_ref_x(300.0), 0.0);
        assert_eq!(
            det.update(&box_with_ref_x(30.0), 100.0),
            Some(SwipeDirection::Left),
        );
        det.update(&box_with_ref_x(300.0), 200.0);
        assert_eq!(
            det.update(&box_with_ref_x(600.0), 300.0),
            Some(SwipeDirection::Right),
        );
    }

    #[test]
    fn test_edge_without_arming_is_ignored() {
        let mut det = detector(BandMapping::Mirrored);
        assert_eq!(det.update(&box_with_ref_x(30.0), 0.0), None);
        assert_eq!(det.update(&box_with_ref_x(600.0), 100.0), None);
        assert!(!det.is_armed());
    }

    #[test]
    fn test_second_edge_hit_after_emit_is_inert() {
        let mut det = detector(BandMapping::Mirrored);
        det.update(&box_with_ref_x(300.0), 0.0);
        assert!(det.update(&box_with_ref_x(30.0), 500.0).is_some());
        // Window consumed; another edge entry without a center
        // re-entry must not fire.
        assert_eq!(det.update(&box_with_ref_x(600.0), 600.0), None);
        assert_eq!(det.update(&box_with_ref_x(30.0), 700.0), None);
        // Re-arm and fire again.
        det.update(&box_with_ref_x(300.0), 800.0);
        assert!(det.update(&box_with_ref_x(30.0), 900.0).is_some());
    }

    #[test]
    fn test_lapsed_window_is_silent() {
        let mut det = detector(BandMapping::Mirrored);
        det.update(&box_with_ref_x(300.0), 0.0);
        // Exactly at the window boundary and beyond: no event.
        assert_eq!(det.update(&box_with_ref_x(30.0), 2000.0), None);
        assert_eq!(det.update(&box_with_ref_x(30.0), 5000.0), None);
        // The stale window stays armed until a center re-entry.
        assert!(det.is_armed());
        det.update(&box_with_ref_x(300.0), 6000.0);
        assert_eq!(
            det.update(&box_with_ref_x(30.0), 6500.0),
            Some(SwipeDirection::Right),
        );
    }

    #[test]
    fn test_center_reentry_refreshes_window() {
        let mut det = detector(BandMapping::Mirrored);
        det.update(&box_with_ref_x(300.0), 0.0);
        // Still in center much later: timestamp refreshed each frame.
        det.update(&box_with_ref_x(310.0), 3000.0);
        assert_eq!(
            det.update(&box_with_ref_x(600.0), 4500.0),
            Some(SwipeDirection::Left),
        );
    }

    #[test]
    fn test_dead_band_frames_do_not_disarm() {
        let mut det = detector(BandMapping::Mirrored);
        det.update(&box_with_ref_x(300.0), 0.0);
        assert_eq!(det.update(&box_with_ref_x(150.0), 200.0), None);
        assert!(det.is_armed());
        assert_eq!(
            det.update(&box_with_ref_x(30.0), 400.0),
            Some(SwipeDirection::Right),
        );
    }

    #[test]
    fn test_reset() {
        let mut det = detector(BandMapping::Mirrored);
        det.update(&box_with_ref_x(300.0), 0.0);
        assert!(det.is_armed());
        det.reset();
        assert!(!det.is_armed());
        assert_eq!(det.update(&box_with_ref_x(30.0), 100.0), None);
    }

    #[test]
    fn test_mapping_from_str() {
        assert_eq!(BandMapping::from_str("mirrored"), Some(BandMapping::Mirrored));
        assert_eq!(BandMapping::from_str("screen"), Some(BandMapping::Screen));
        assert_eq!(BandMapping::from_str("other"), None);
        assert_eq!(BandMapping::Mirrored.as_str(), "mirrored");
    }
}
