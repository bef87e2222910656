//! Hand observation data model — per-frame detection records.
//!
//! Models the 21-keypoint hand layout (wrist + 4 joints per finger)
//! produced by the upstream perception model, plus the bounding box
//! and frame geometry the detectors consume.

// ── Geometry ───────────────────────────────────────────────

/// A point in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box of a detected hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub top_left: Point2,
    pub bottom_right: Point2,
}

/// Fixed frame dimensions in pixels. Set once at initialization;
/// mid-session resize is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse a "WxH" resolution string. Returns None on malformed input.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split('x').collect();
        if parts.len() != 2 {
            return None;
        }
        let w = parts[0].parse::<u32>().ok()?;
        let h = parts[1].parse::<u32>().ok()?;
        if w > 0 && h > 0 {
            Some(Self::new(w, h))
        } else {
            None
        }
    }
}

// ── Keypoint layout ────────────────────────────────────────

/// The 21 hand keypoints in the perception model's fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keypoint {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of keypoints per hand.
pub const KEYPOINT_COUNT: usize = 21;

impl Keypoint {
    /// Convert keypoint enum to landmark array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// String representation for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }
}

// ── Fingers ────────────────────────────────────────────────

/// One of the five fingers, grouping its four keypoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

/// All fingers in keypoint order.
pub const FINGERS: [Finger; 5] = [
    Finger::Thumb,
    Finger::Index,
    Finger::Middle,
    Finger::Ring,
    Finger::Pinky,
];

impl Finger {
    /// The four keypoints of this finger, base to tip.
    pub fn joints(&self) -> [Keypoint; 4] {
        match self {
            Self::Thumb => [
                Keypoint::ThumbCmc,
                Keypoint::ThumbMcp,
                Keypoint::ThumbIp,
                Keypoint::ThumbTip,
            ],
            Self::Index => [
                Keypoint::IndexMcp,
                Keypoint::IndexPip,
                Keypoint::IndexDip,
                Keypoint::IndexTip,
            ],
            Self::Middle => [
                Keypoint::MiddleMcp,
                Keypoint::MiddlePip,
                Keypoint::MiddleDip,
                Keypoint::MiddleTip,
            ],
            Self::Ring => [
                Keypoint::RingMcp,
                Keypoint::RingPip,
                Keypoint::RingDip,
                Keypoint::RingTip,
            ],
            Self::Pinky => [
                Keypoint::PinkyMcp,
                Keypoint::PinkyPip,
                Keypoint::PinkyDip,
                Keypoint::PinkyTip,
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thumb => "thumb",
            Self::Index => "index",
            Self::Middle => "middle",
            Self::Ring => "ring",
            Self::Pinky => "pinky",
        }
    }
}

// ── Detection record ───────────────────────────────────────

/// One frame's hand observation from the perception source.
///
/// Absence of a detection in a frame is a normal state (the frame
/// simply carries no record), never an error.
#[derive(Debug, Clone)]
pub struct Detection {
    pub bounding_box: BoundingBox,
    pub landmarks: [Point2; KEYPOINT_COUNT],
}

// ── Tests ──────────────────────────────────────────────────
