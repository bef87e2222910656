//! Pose classification from hand landmarks.
//!
//! Estimates a curl bucket per finger and matches the result against
//! fixed pose templates, producing ranked candidates above a match
//! threshold. The classifier is built once at startup and queried
//! read-only every frame.

use tracing::trace;

use crate::hand::{Finger, Point2, FINGERS, KEYPOINT_COUNT};

/// Default minimum match score (0-10 scale) for a candidate.
pub const MATCH_THRESHOLD: f32 = 7.5;

/// Extension ratio at or above which a finger counts as straight.
const NO_CURL_MIN_RATIO: f32 = 0.85;

/// Extension ratio at or below which a finger counts as fully curled.
const FULL_CURL_MAX_RATIO: f32 = 0.45;

// ── Labels ─────────────────────────────────────────────────

/// A classifiable static hand pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseLabel {
    /// Index extended, everything else curled (low-confidence catch-all).
    OneFinger,
    /// Index and middle extended (victory).
    TwoFinger,
    /// Thumb extended, all fingers curled.
    ThumbsUp,
}

impl PoseLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneFinger => "one-finger",
            Self::TwoFinger => "two-finger",
            Self::ThumbsUp => "thumbs-up",
        }
    }
}

/// A scored pose candidate returned by a classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseMatch {
    pub label: PoseLabel,
    /// Match score on a 0-10 scale.
    pub score: f32,
}

// ── Classifier seam ────────────────────────────────────────

/// External pose-classification capability queried once per frame.
///
/// Returns candidates with `score >= threshold`, best first. An empty
/// result is the normal "nothing recognizable" outcome, not an error.
pub trait PoseClassifier {
    fn classify(&self, landmarks: &[Point2; KEYPOINT_COUNT], threshold: f32) -> Vec<PoseMatch>;
}

// ── Curl estimation ────────────────────────────────────────

/// Curl bucket for a single finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerCurl {
    NoCurl,
    HalfCurl,
    FullCurl,
}

impl FingerCurl {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCurl => "no-curl",
            Self::HalfCurl => "half-curl",
            Self::FullCurl => "full-curl",
        }
    }
}

fn distance(a: &Point2, b: &Point2) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Estimate the curl of one finger from the landmark set.
///
/// Ratio of the straight-line base-to-tip distance to the summed
/// segment lengths: ~1.0 for a straight finger, small when the tip
/// folds back toward the base.
pub fn finger_curl(landmarks: &[Point2; KEYPOINT_COUNT], finger: Finger) -> FingerCurl {
    let joints = finger.joints();
    let base = &landmarks[joints[0].index()];
    let tip = &landmarks[joints[3].index()];

    let mut segment_len = 0.0;
    for pair in joints.windows(2) {
        segment_len += distance(
            &landmarks[pair[0].index()],
            &landmarks[pair[1].index()],
        );
    }
    if segment_len < f32::EPSILON {
        return FingerCurl::FullCurl;
    }

    let ratio = distance(base, tip) / segment_len;
    if ratio >= NO_CURL_MIN_RATIO {
        FingerCurl::NoCurl
    } else if ratio <= FULL_CURL_MAX_RATIO {
        FingerCurl::FullCurl
    } else {
        FingerCurl::HalfCurl
    }
}

// ── Templates ──────────────────────────────────────────────

/// One expected finger curl within a template, with a match weight.
#[derive(Debug, Clone)]
struct CurlConstraint {
    finger: Finger,
    curl: FingerCurl,
    weight: f32,
}

/// A pose described as a set of per-finger curl constraints.
#[derive(Debug, Clone)]
pub struct PoseTemplate {
    pub label: PoseLabel,
    constraints: Vec<CurlConstraint>,
}

impl PoseTemplate {
    fn new(label: PoseLabel, constraints: Vec<(Finger, FingerCurl)>) -> Self {
        Self {
            label,
            constraints: constraints
                .into_iter()
                .map(|(finger, curl)| CurlConstraint {
                    finger,
                    curl,
                    weight: 1.0,
                })
                .collect(),
        }
    }

    /// Score against estimated curls, scaled to 0-10.
    fn score(&self, curls: &[FingerCurl; 5]) -> f32 {
        let total: f32 = self.constraints.iter().map(|c| c.weight).sum();
        if total <= 0.0 {
            return 0.0;
        }
        let matched: f32 = self
            .constraints
            .iter()
            .filter(|c| curls[c.finger as usize] == c.curl)
            .map(|c| c.weight)
            .sum();
        10.0 * matched / total
    }
}

// ── Template classifier ────────────────────────────────────

/// Template matcher over the three poses the navigation layer uses.
pub struct TemplateClassifier {
    templates: Vec<PoseTemplate>,
}

impl TemplateClassifier {
    pub fn new() -> Self {
        use FingerCurl::*;
        let templates = vec![
            PoseTemplate::new(
                PoseLabel::TwoFinger,
                vec![
                    (Finger::Thumb, HalfCurl),
                    (Finger::Index, NoCurl),
                    (Finger::Middle, NoCurl),
                    (Finger::Ring, FullCurl),
                    (Finger::Pinky, FullCurl),
                ],
            ),
            PoseTemplate::new(
                PoseLabel::ThumbsUp,
                vec![
                    (Finger::Thumb, NoCurl),
                    (Finger::Index, FullCurl),
                    (Finger::Middle, FullCurl),
                    (Finger::Ring, FullCurl),
                    (Finger::Pinky, FullCurl),
                ],
            ),
            PoseTemplate::new(
                PoseLabel::OneFinger,
                vec![
                    (Finger::Index, NoCurl),
                    (Finger::Thumb, FullCurl),
                    (Finger::Middle, FullCurl),
                    (Finger::Ring, FullCurl),
                    (Finger::Pinky, FullCurl),
                ],
            ),
        ];
        Self { templates }
    }
}

impl Default for TemplateClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseClassifier for TemplateClassifier {
    fn classify(&self, landmarks: &[Point2; KEYPOINT_COUNT], threshold: f32) -> Vec<PoseMatch> {
        let mut curls = [FingerCurl::NoCurl; 5];
        for (i, finger) in FINGERS.iter().enumerate() {
            curls[i] = finger_curl(landmarks, *finger);
        }
        trace!(
            "Finger curls: {:?}",
            curls.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
        );

        let mut matches: Vec<PoseMatch> = self
            .templates
            .iter()
            .map(|t| PoseMatch {
                label: t.label,
                score: t.score(&curls),
            })
            .filter(|m| m.score >= threshold)
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches
    }
}

// ── Test helpers ───────────────────────────────────────────

/// Build a synthetic landmark set at an origin with per-finger
/// extension flags (thumb, index, middle, ring, pinky).
#[cfg(test)]
pub fn synth_landmarks(origin: Point2, extended: [bool; 5]) -> [Point2; KEYPOINT_COUNT] {
    let mut landmarks = [origin; KEYPOINT_COUNT];
    for (i, finger) in FINGERS.iter().enumerate() {
        let joints = finger.joints();
        let base = Point2::new(origin.x + i as f32 * 18.0, origin.y);
        if extended[i] {
            // Joints spaced straight along +y: ratio 1.0.
            for (j, joint) in joints.iter().enumerate() {
                landmarks[joint.index()] = Point2::new(base.x, base.y + j as f32 * 20.0);
            }
        } else {
            // Tip folded back to the base: ratio well under 0.45.
            landmarks[joints[0].index()] = base;
            landmarks[joints[1].index()] = Point2::new(base.x, base.y + 20.0);
            landmarks[joints[2].index()] = Point2::new(base.x + 4.0, base.y + 10.0);
            landmarks[joints[3].index()] = Point2::new(base.x + 4.0, base.y + 2.0);
        }
    }
    landmarks
}

// ── Tests ──────────────────────────────────────────────────
