//! Pipeline composition and the frame-driven run loop.
//!
//! One detection record per frame fans out to the swipe detector and
//! the pose debouncer (sequentially, no shared state); their events
//! are published on replay-last signals. The loop is single-threaded
//! and self-pacing: the next tick is scheduled only after the current
//! frame's processing completes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use calloop::timer::{TimeoutAction, Timer};
use calloop::EventLoop;
use tracing::{debug, error, info};

use crate::debounce::{DebounceConfig, Gesture, PoseDebouncer};
use crate::hand::{Detection, FrameSize};
use crate::pose::PoseClassifier;
use crate::signal::Signal;
use crate::source::{FrameSource, SourceFrame};
use crate::swipe::{SwipeConfig, SwipeDetector, SwipeDirection};
use crate::timing::FrameTiming;

// ── Pipeline ───────────────────────────────────────────────

/// Events produced by one frame of processing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameOutput {
    pub swipe: Option<SwipeDirection>,
    pub gesture: Option<Gesture>,
}

/// The gesture recognition core: both state machines plus the output
/// streams, driven by one `process_frame` call per frame.
pub struct Pipeline {
    swipe: SwipeDetector,
    debouncer: PoseDebouncer,
    classifier: Box<dyn PoseClassifier>,
    /// Classifier match threshold, fixed at construction.
    threshold: f32,
    /// Swipe event stream; default/quiescent value is `None`.
    pub swipe_signal: Signal<Option<SwipeDirection>>,
    /// Gesture event stream; default/quiescent value is `None`.
    pub gesture_signal: Signal<Option<Gesture>>,
}

impl Pipeline {
    pub fn new(
        size: FrameSize,
        swipe_config: SwipeConfig,
        debounce_config: DebounceConfig,
        classifier: Box<dyn PoseClassifier>,
        threshold: f32,
    ) -> Self {
        Self {
            swipe: SwipeDetector::new(size, swipe_config),
            debouncer: PoseDebouncer::new(debounce_config),
            classifier,
            threshold,
            swipe_signal: Signal::new(None),
            gesture_signal: Signal::new(None),
        }
    }

    /// Process one frame's observation.
    ///
    /// A frame without a detection leaves both machines untouched.
    /// Emitted events are published on the signals and also returned.
    pub fn process_frame(&mut self, detection: Option<&Detection>, now_ms: f64) -> FrameOutput {
        let mut output = FrameOutput::default();
        let Some(detection) = detection else {
            return output;
        };

        if let Some(direction) = self.swipe.update(&detection.bounding_box, now_ms) {
            self.swipe_signal.publish(Some(direction));
            output.swipe = Some(direction);
        }

        let candidates = self
            .classifier
            .classify(&detection.landmarks, self.threshold);
        if let Some(gesture) = self.debouncer.observe(&candidates, now_ms) {
            self.gesture_signal.publish(Some(gesture));
            output.gesture = Some(gesture);
        }

        output
    }
}

// ── Run loop ───────────────────────────────────────────────

/// Global flag set by SIGTERM/SIGINT handlers.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Install signal handlers for graceful shutdown (SIGTERM, SIGINT).
fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGINT, signal_handler as libc::sighandler_t);
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Run-loop configuration.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Target interval between frames.
    pub frame_interval: Duration,
    /// Interval between periodic status log lines.
    pub status_interval: Duration,
    /// Stop after this long, if set.
    pub exit_after: Option<Duration>,
}

struct RunState<F> {
    pipeline: Pipeline,
    source: Box<dyn FrameSource>,
    timing: FrameTiming,
    after_frame: F,
    origin: Instant,
    last_status: Instant,
    frames: u64,
}

/// Drive the pipeline from a frame source until the source ends,
/// a shutdown signal arrives, or the optional deadline passes.
///
/// `after_frame` runs on the loop thread after each processed frame;
/// the demo consumer uses it to drain its subscriptions.
pub fn run_loop<F>(
    pipeline: Pipeline,
    source: Box<dyn FrameSource>,
    config: LoopConfig,
    after_frame: F,
) -> Result<()>
where
    F: FnMut(&FrameOutput),
{
    install_signal_handlers();

    let budget_ms = config.frame_interval.as_secs_f64() * 1000.0;
    let mut event_loop: EventLoop<RunState<F>> = EventLoop::try_new()?;
    let signal = event_loop.get_signal();

    let origin = Instant::now();
    let mut state = RunState {
        pipeline,
        source,
        timing: FrameTiming::new(1000, budget_ms),
        after_frame,
        origin,
        last_status: origin,
        frames: 0,
    };

    let frame_interval = config.frame_interval;
    let status_interval = config.status_interval;
    let exit_after = config.exit_after;

    event_loop
        .handle()
        .insert_source(Timer::immediate(), move |_deadline, _, state| {
            if SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
                info!("Shutdown requested, stopping after {} frames", state.frames);
                signal.stop();
                return TimeoutAction::Drop;
            }
            if let Some(limit) = exit_after {
                if state.origin.elapsed() >= limit {
                    info!("Exit-after deadline reached ({} frames)", state.frames);
                    signal.stop();
                    return TimeoutAction::Drop;
                }
            }

            let frame = match state.source.next_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    error!("Frame source failed: {:#}", err);
                    signal.stop();
                    return TimeoutAction::Drop;
                }
            };

            let now_ms = state.origin.elapsed().as_secs_f64() * 1000.0;
            let detection = match &frame {
                SourceFrame::Detection(det) => Some(det),
                SourceFrame::Empty => None,
                SourceFrame::End => {
                    info!("Source exhausted after {} frames", state.frames);
                    signal.stop();
                    return TimeoutAction::Drop;
                }
            };

            let started = Instant::now();
            let output = state.pipeline.process_frame(detection, now_ms);
            state
                .timing
                .record(started.elapsed().as_secs_f64() * 1000.0);
            state.frames += 1;

            if output.swipe.is_some() || output.gesture.is_some() {
                debug!("Frame {}: {:?}", state.frames, output);
            }
            (state.after_frame)(&output);

            if state.last_status.elapsed() >= status_interval {
                state.last_status = Instant::now();
                info!("{}", state.timing.status_line());
            }

            TimeoutAction::ToDuration(frame_interval)
        })
        .map_err(|e| anyhow::anyhow!("failed to register frame timer: {}", e.error))?;

    event_loop.run(None::<Duration>, &mut state, |_| {})?;
    info!(
        "Pipeline stopped: {} frames, {}",
        state.frames,
        state.timing.status_line(),
    );
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{PoseMatch, TemplateClassifier, MATCH_THRESHOLD};
    use crate::source::ScriptedSource;
    use crate::swipe::BandMapping;

    fn pipeline(size: FrameSize) -> Pipeline {
        Pipeline::new(
            size,
            SwipeConfig::default(),
            DebounceConfig::default(),
            Box::new(TemplateClassifier::new()),
            MATCH_THRESHOLD,
        )
    }

    #[test]
    fn test_no_detection_is_a_no_op() {
        let mut p = pipeline(FrameSize::new(640, 480));
        for i in 0..50 {
            let out = p.process_frame(None, i as f64 * 33.0);
            assert!(out.swipe.is_none());
            assert!(out.gesture.is_none());
        }
        assert_eq!(*p.swipe_signal.latest(), None);
        assert_eq!(*p.gesture_signal.latest(), None);
    }

    #[test]
    fn test_scripted_demo_end_to_end() {
        let size = FrameSize::new(640, 480);
        let fps = 30u32;
        let mut source = ScriptedSource::new(size, fps);
        let mut p = pipeline(size);

        let swipe_rx = p.swipe_signal.subscribe();
        let gesture_rx = p.gesture_signal.subscribe();

        let frame_ms = 1000.0 / fps as f64;
        let mut i = 0u64;
        loop {
            let detection = match source.next_frame().unwrap() {
                SourceFrame::Detection(det) => Some(det),
                SourceFrame::Empty => None,
                SourceFrame::End => break,
            };
            p.process_frame(detection.as_ref(), i as f64 * frame_ms);
            i += 1;
        }

        // Mirrored mapping: left-edge sweep reads as a right swipe.
        let swipes: Vec<_> = swipe_rx.try_iter().flatten().collect();
        assert_eq!(swipes, vec![SwipeDirection::Right, SwipeDirection::Left]);

        let gestures: Vec<_> = gesture_rx.try_iter().flatten().collect();
        assert_eq!(gestures, vec![Gesture::Two, Gesture::Ok]);
    }

    #[test]
    fn test_screen_mapping_flips_demo_swipes() {
        let size = FrameSize::new(640, 480);
        let mut source = ScriptedSource::new(size, 30);
        let mut p = Pipeline::new(
            size,
            SwipeConfig {
                mapping: BandMapping::Screen,
                ..SwipeConfig::default()
            },
            DebounceConfig::default(),
            Box::new(TemplateClassifier::new()),
            MATCH_THRESHOLD,
        );

        let swipe_rx = p.swipe_signal.subscribe();
        let mut i = 0u64;
        loop {
            let detection = match source.next_frame().unwrap() {
                SourceFrame::Detection(det) => Some(det),
                SourceFrame::Empty => None,
                SourceFrame::End => break,
            };
            p.process_frame(detection.as_ref(), i as f64 * 33.3);
            i += 1;
        }
        let swipes: Vec<_> = swipe_rx.try_iter().flatten().collect();
        assert_eq!(swipes, vec![SwipeDirection::Left, SwipeDirection::Right]);
    }

    #[test]
    fn test_detectors_run_independently() {
        // A classifier that always reports victory, regardless of
        // landmarks, to decouple the two machines in this test.
        struct AlwaysVictory;
        impl PoseClassifier for AlwaysVictory {
            fn classify(&self, _: &[crate::hand::Point2; 21], _: f32) -> Vec<PoseMatch> {
                vec![PoseMatch {
                    label: crate::pose::PoseLabel::TwoFinger,
                    score: 10.0,
                }]
            }
        }

        let size = FrameSize::new(640, 480);
        let mut p = Pipeline::new(
            size,
            SwipeConfig::default(),
            DebounceConfig::default(),
            Box::new(AlwaysVictory),
            MATCH_THRESHOLD,
        );

        // Hold in center past the dwell: gesture fires, no swipe.
        let center = crate::swipe::box_with_ref_x(300.0);
        let det = Detection {
            bounding_box: center,
            landmarks: [crate::hand::Point2::new(0.0, 0.0); 21],
        };
        let mut outputs = Vec::new();
        for i in 0..40 {
            outputs.push(p.process_frame(Some(&det), i as f64 * 33.3));
        }
        assert!(outputs.iter().all(|o| o.swipe.is_none()));
        assert_eq!(
            outputs.iter().filter_map(|o| o.gesture).collect::<Vec<_>>(),
            vec![Gesture::Two],
        );

        // Then a quick edge hit: swipe fires while the gesture stream
        // stays quiet (same stable episode).
        let edge = crate::swipe::box_with_ref_x(30.0);
        let det_edge = Detection {
            bounding_box: edge,
            landmarks: det.landmarks,
        };
        let out = p.process_frame(Some(&det_edge), 40.0 * 33.3);
        assert_eq!(out.swipe, Some(SwipeDirection::Right));
        assert!(out.gesture.is_none());
    }
}
