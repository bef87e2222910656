//! Frame sources — where per-frame detection records come from.
//!
//! The perception pipeline (camera + model inference) is external;
//! this module models it behind `FrameSource` with two in-tree
//! implementations: a trace-file replay and a built-in scripted demo.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::hand::{BoundingBox, Detection, FrameSize, Point2, KEYPOINT_COUNT};

/// One frame delivered by a source.
#[derive(Debug, Clone)]
pub enum SourceFrame {
    /// A hand was detected this frame.
    Detection(Detection),
    /// No hand this frame (normal steady state).
    Empty,
    /// The source is exhausted.
    End,
}

/// A per-frame supplier of detection records.
///
/// `next_frame` is called once per tick of the frame loop; the loop
/// never requests frame N+1 before N's processing completes.
pub trait FrameSource {
    /// Frame dimensions, fixed for the source's lifetime.
    fn size(&self) -> FrameSize;
    /// Produce the next frame.
    fn next_frame(&mut self) -> Result<SourceFrame>;
}

// ── Replay source ──────────────────────────────────────────

/// Replays a recorded detection trace from a text file.
///
/// One frame per line: `none` for a frame without a detection, or
/// `tlx tly brx bry` followed by 21 `x,y` landmark pairs. Lines
/// starting with `#` and blank lines are skipped. Malformed lines
/// abort loading.
pub struct ReplaySource {
    size: FrameSize,
    frames: Vec<Option<Detection>>,
    cursor: usize,
}

impl ReplaySource {
    pub fn from_path(path: &Path, size: FrameSize) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read trace {}", path.display()))?;
        let mut frames = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let frame = parse_line(line)
                .with_context(|| format!("{}:{}", path.display(), lineno + 1))?;
            frames.push(frame);
        }
        info!("Loaded trace {}: {} frames", path.display(), frames.len());
        Ok(Self {
            size,
            frames,
            cursor: 0,
        })
    }
}

fn parse_point(token: &str) -> Result<Point2> {
    let (x, y) = token
        .split_once(',')
        .with_context(|| format!("expected x,y pair, got \"{}\"", token))?;
    Ok(Point2::new(
        x.parse::<f32>()
            .with_context(|| format!("bad x coordinate \"{}\"", x))?,
        y.parse::<f32>()
            .with_context(|| format!("bad y coordinate \"{}\"", y))?,
    ))
}

fn parse_line(line: &str) -> Result<Option<Detection>> {
    if line == "none" {
        return Ok(None);
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 4 + KEYPOINT_COUNT {
        bail!(
            "expected {} fields (box + {} landmarks) or \"none\", got {}",
            4 + KEYPOINT_COUNT,
            KEYPOINT_COUNT,
            tokens.len(),
        );
    }
    let mut corners = [0.0f32; 4];
    for (i, token) in tokens[..4].iter().enumerate() {
        corners[i] = token
            .parse::<f32>()
            .with_context(|| format!("bad box coordinate \"{}\"", token))?;
    }
    let mut landmarks = [Point2::new(0.0, 0.0); KEYPOINT_COUNT];
    for (i, token) in tokens[4..].iter().enumerate() {
        landmarks[i] = parse_point(token)?;
    }
    Ok(Some(Detection {
        bounding_box: BoundingBox {
            top_left: Point2::new(corners[0], corners[1]),
            bottom_right: Point2::new(corners[2], corners[3]),
        },
        landmarks,
    }))
}

impl FrameSource for ReplaySource {
    fn size(&self) -> FrameSize {
        self.size
    }

    fn next_frame(&mut self) -> Result<SourceFrame> {
        match self.frames.get(self.cursor) {
            Some(frame) => {
                self.cursor += 1;
                Ok(match frame {
                    Some(det) => SourceFrame::Detection(det.clone()),
                    None => SourceFrame::Empty,
                })
            }
            None => Ok(SourceFrame::End),
        }
    }
}

// ── Scripted demo source ───────────────────────────────────

/// Built-in demo: two swipes (one per direction) followed by a held
/// two-finger pose and a held thumbs-up. Used when no trace is given.
pub struct ScriptedSource {
    size: FrameSize,
    frames: Vec<Option<Detection>>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(size: FrameSize, fps: u32) -> Self {
        let fps = fps.max(1);
        let w = size.width as f32;
        let frames_for = |seconds: f32| (seconds * fps as f32).round().max(1.0) as usize;
        let mut frames: Vec<Option<Detection>> = Vec::new();

        let absent = |frames: &mut Vec<Option<Detection>>, seconds: f32| {
            for _ in 0..frames_for(seconds) {
                frames.push(None);
            }
        };
        let hold = |frames: &mut Vec<Option<Detection>>,
                    seconds: f32,
                    x_frac: f32,
                    extended: [bool; 5]| {
            for _ in 0..frames_for(seconds) {
                frames.push(Some(demo_detection(w * x_frac, extended)));
            }
        };
        let sweep = |frames: &mut Vec<Option<Detection>>,
                     seconds: f32,
                     from_frac: f32,
                     to_frac: f32| {
            let n = frames_for(seconds);
            for i in 0..n {
                let t = i as f32 / (n - 1).max(1) as f32;
                let x = w * (from_frac + (to_frac - from_frac) * t);
                frames.push(Some(demo_detection(x, [true; 5])));
            }
        };

        // Swipe toward the left edge.
        absent(&mut frames, 0.4);
        hold(&mut frames, 0.5, 0.5, [true; 5]);
        sweep(&mut frames, 0.3, 0.45, 0.05);
        // Swipe toward the right edge.
        absent(&mut frames, 0.5);
        hold(&mut frames, 0.5, 0.5, [true; 5]);
        sweep(&mut frames, 0.3, 0.55, 0.95);
        // Held poses: victory, then thumbs-up.
        absent(&mut frames, 0.5);
        hold(&mut frames, 1.5, 0.5, [false, true, true, false, false]);
        hold(&mut frames, 1.5, 0.5, [true, false, false, false, false]);
        absent(&mut frames, 0.3);

        Self {
            size,
            frames,
            cursor: 0,
        }
    }
}

impl FrameSource for ScriptedSource {
    fn size(&self) -> FrameSize {
        self.size
    }

    fn next_frame(&mut self) -> Result<SourceFrame> {
        match self.frames.get(self.cursor) {
            Some(frame) => {
                self.cursor += 1;
                Ok(match frame {
                    Some(det) => SourceFrame::Detection(det.clone()),
                    None => SourceFrame::Empty,
                })
            }
            None => Ok(SourceFrame::End),
        }
    }
}

/// A detection whose box reference point lands at `ref_x`, with
/// synthetic landmarks posed by per-finger extension flags.
fn demo_detection(ref_x: f32, extended: [bool; 5]) -> Detection {
    // reference.x = 2 * top_left.x + box_width / 2 under the
    // detector's projection, so invert for a fixed 120px box.
    let box_width = 120.0;
    let tl_x = (ref_x - box_width / 2.0) / 2.0;
    let bounding_box = BoundingBox {
        top_left: Point2::new(tl_x, 120.0),
        bottom_right: Point2::new(tl_x + box_width, 280.0),
    };

    let origin = Point2::new(tl_x + 20.0, 160.0);
    let mut landmarks = [origin; KEYPOINT_COUNT];
    for (i, finger) in crate::hand::FINGERS.iter().enumerate() {
        let joints = finger.joints();
        let base = Point2::new(origin.x + i as f32 * 18.0, origin.y);
        if extended[i] {
            for (j, joint) in joints.iter().enumerate() {
                landmarks[joint.index()] = Point2::new(base.x, base.y + j as f32 * 20.0);
            }
        } else {
            landmarks[joints[0].index()] = base;
            landmarks[joints[1].index()] = Point2::new(base.x, base.y + 20.0);
            landmarks[joints[2].index()] = Point2::new(base.x + 4.0, base.y + 10.0);
            landmarks[joints[3].index()] = Point2::new(base.x + 4.0, base.y + 2.0);
        }
    }

    Detection {
        bounding_box,
        landmarks,
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swipe::SwipeDetector;

    #[test]
    fn test_parse_none_line() {
        assert!(parse_line("none").unwrap().is_none());
    }

    #[test]
    fn test_parse_detection_line() {
        let mut line = String::from("100 50 220 210");
        for i in 0..KEYPOINT_COUNT {
            line.push_str(&format!(" {},{}", 100 + i, 60 + i));
        }
        let det = parse_line(&line).unwrap().unwrap();
        assert_eq!(det.bounding_box.top_left, Point2::new(100.0, 50.0));
        assert_eq!(det.bounding_box.bottom_right, Point2::new(220.0, 210.0));
        assert_eq!(det.landmarks[0], Point2::new(100.0, 60.0));
        assert_eq!(det.landmarks[20], Point2::new(120.0, 80.0));
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        assert!(parse_line("100 50 220").is_err());
        assert!(parse_line("100 50 220 210 1,2").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_numbers() {
        let mut line = String::from("100 50 220 abc");
        for _ in 0..KEYPOINT_COUNT {
            line.push_str(" 1,2");
        }
        assert!(parse_line(&line).is_err());

        let mut line = String::from("100 50 220 210 1;2");
        for _ in 0..KEYPOINT_COUNT - 1 {
            line.push_str(" 1,2");
        }
        assert!(parse_line(&line).is_err());
    }

    #[test]
    fn test_replay_skips_comments_and_blanks() {
        let dir = std::env::temp_dir().join("handwave-test-replay");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("trace.txt");
        std::fs::write(&path, "# header\n\nnone\nnone\n").unwrap();
        let mut source = ReplaySource::from_path(&path, FrameSize::new(640, 480)).unwrap();
        assert!(matches!(source.next_frame().unwrap(), SourceFrame::Empty));
        assert!(matches!(source.next_frame().unwrap(), SourceFrame::Empty));
        assert!(matches!(source.next_frame().unwrap(), SourceFrame::End));
        assert!(matches!(source.next_frame().unwrap(), SourceFrame::End));
    }

    #[test]
    fn test_replay_missing_file_fails() {
        let path = Path::new("/nonexistent/handwave-trace.txt");
        assert!(ReplaySource::from_path(path, FrameSize::new(640, 480)).is_err());
    }

    #[test]
    fn test_demo_detection_reference_point() {
        let det = demo_detection(320.0, [true; 5]);
        let p = SwipeDetector::reference_point(&det.bounding_box);
        assert!((p.x - 320.0).abs() < 0.01);
    }

    #[test]
    fn test_scripted_source_ends() {
        let mut source = ScriptedSource::new(FrameSize::new(640, 480), 30);
        let mut detections = 0;
        let mut empties = 0;
        loop {
            match source.next_frame().unwrap() {
                SourceFrame::Detection(_) => detections += 1,
                SourceFrame::Empty => empties += 1,
                SourceFrame::End => break,
            }
        }
        assert!(detections > 0);
        assert!(empties > 0);
    }
}
