//! Pose debouncing — stabilize a noisy per-frame classification into
//! one discrete gesture event per sustained pose.
//!
//! A frame's candidate list is first resolved to a single label, then
//! the label must hold unchanged past a dwell time before its mapped
//! gesture is emitted, exactly once per stable episode.

use tracing::debug;

use crate::pose::{PoseLabel, PoseMatch};

// ── Gestures ───────────────────────────────────────────────

/// A semantic gesture event delivered to the navigation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    One,
    Two,
    Ok,
}

impl Gesture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::One => "one",
            Self::Two => "two",
            Self::Ok => "ok",
        }
    }
}

impl PoseLabel {
    /// Fixed label-to-gesture lookup.
    pub fn gesture(&self) -> Gesture {
        match self {
            Self::OneFinger => Gesture::One,
            Self::TwoFinger => Gesture::Two,
            Self::ThumbsUp => Gesture::Ok,
        }
    }
}

// ── Label resolution ───────────────────────────────────────

/// Resolve a frame's candidate list to one label.
///
/// Priority: any two-finger candidate, else any thumbs-up candidate,
/// else — if the classifier returned anything at all — the one-finger
/// catch-all. The catch-all is deliberate: a recognized-but-unranked
/// hand still reads as the "one" selection downstream.
pub fn resolve_label(candidates: &[PoseMatch]) -> Option<PoseLabel> {
    if candidates.iter().any(|c| c.label == PoseLabel::TwoFinger) {
        return Some(PoseLabel::TwoFinger);
    }
    if candidates.iter().any(|c| c.label == PoseLabel::ThumbsUp) {
        return Some(PoseLabel::ThumbsUp);
    }
    if !candidates.is_empty() {
        return Some(PoseLabel::OneFinger);
    }
    None
}

// ── Config ─────────────────────────────────────────────────

/// Configuration for pose debouncing.
#[derive(Debug, Clone)]
pub struct DebounceConfig {
    /// Milliseconds a label must hold unchanged before emission.
    pub dwell_ms: f64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self { dwell_ms: 1000.0 }
    }
}

// ── Debouncer ──────────────────────────────────────────────

/// Tracks the resolved label across frames and emits each stable
/// episode's gesture exactly once.
#[derive(Debug)]
pub struct PoseDebouncer {
    /// Dwell configuration.
    pub config: DebounceConfig,
    /// Most recently observed resolved label.
    last_label: Option<PoseLabel>,
    /// Timestamp (ms) the label last changed.
    last_change_ms: f64,
    /// Whether the current episode still owes an emission.
    pending_emit: bool,
}

impl PoseDebouncer {
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            last_label: None,
            last_change_ms: -1.0,
            pending_emit: false,
        }
    }

    /// Observe one frame's classifier candidates.
    ///
    /// Call once per frame in which a hand was detected; frames
    /// without a detection skip the call (episode timing is not
    /// reset). Returns the gesture for the episode when it first
    /// crosses the dwell threshold.
    pub fn observe(&mut self, candidates: &[PoseMatch], now_ms: f64) -> Option<Gesture> {
        let resolved = resolve_label(candidates);

        if resolved != self.last_label {
            self.last_label = resolved;
            self.last_change_ms = now_ms;
            self.pending_emit = true;
            return None;
        }

        if self.pending_emit && now_ms - self.last_change_ms > self.config.dwell_ms {
            self.pending_emit = false;
            // A stable "no pose" episode emits nothing.
            let label = self.last_label?;
            let gesture = label.gesture();
            debug!(
                "Gesture {} ({} stable {:.0}ms)",
                gesture.as_str(),
                label.as_str(),
                now_ms - self.last_change_ms,
            );
            return Some(gesture);
        }
        None
    }

    /// The label currently being tracked, if any.
    pub fn current_label(&self) -> Option<PoseLabel> {
        self.last_label
    }

    /// Reset episode tracking.
    pub fn reset(&mut self) {
        self.last_label = None;
        self.last_change_ms = -1.0;
        self.pending_emit = false;
    }
}

// ── Tests ──────────────────────────────────────────────────
