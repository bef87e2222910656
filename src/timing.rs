//! Per-frame processing-time instrumentation.
//!
//! Keeps a rolling window of frame processing times and reports
//! percentile statistics for the periodic status log.

/// Rolling frame timing statistics over a window of samples.
#[derive(Debug)]
pub struct FrameTiming {
    /// Per-frame processing time in milliseconds.
    samples: Vec<f64>,
    /// Maximum number of samples to keep.
    window_size: usize,
    /// Total frames processed.
    pub total_frames: u64,
    /// Frames that exceeded the budget.
    pub over_budget: u64,
    /// Frame budget in milliseconds (the frame interval).
    pub budget_ms: f64,
}

/// Computed timing statistics.
#[derive(Debug, Clone)]
pub struct FrameTimingStats {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub over_budget_pct: f64,
    pub total_frames: u64,
}

impl FrameTiming {
    pub fn new(window_size: usize, budget_ms: f64) -> Self {
        Self {
            samples: Vec::with_capacity(window_size),
            window_size,
            total_frames: 0,
            over_budget: 0,
            budget_ms,
        }
    }

    /// Record one frame's processing time.
    pub fn record(&mut self, elapsed_ms: f64) {
        self.samples.push(elapsed_ms);
        if self.samples.len() > self.window_size {
            self.samples.remove(0);
        }
        self.total_frames += 1;
        if elapsed_ms > self.budget_ms {
            self.over_budget += 1;
        }
    }

    /// Compute percentile from a sorted slice.
    fn percentile(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }
        let idx = ((sorted.len() as f64 - 1.0) * p / 100.0).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    pub fn stats(&self) -> FrameTimingStats {
        let mut sorted = self.samples.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        FrameTimingStats {
            p50: Self::percentile(&sorted, 50.0),
            p95: Self::percentile(&sorted, 95.0),
            p99: Self::percentile(&sorted, 99.0),
            over_budget_pct: if self.total_frames > 0 {
                (self.over_budget as f64 / self.total_frames as f64) * 100.0
            } else {
                0.0
            },
            total_frames: self.total_frames,
        }
    }

    /// One-line status summary for the periodic log.
    pub fn status_line(&self) -> String {
        let s = self.stats();
        format!(
            "frames={} p50={:.2}ms p95={:.2}ms p99={:.2}ms over-budget={:.1}%",
            s.total_frames, s.p50, s.p95, s.p99, s.over_budget_pct,
        )
    }
}

// ── Tests ──────────────────────────────────────────────────
