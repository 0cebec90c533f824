// src/pipeline/metrics.rs
//
// Counters for the scene pipeline. Clones share the same counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub ticks: Arc<AtomicU64>,
    pub frames_drawn: Arc<AtomicU64>,
    pub frames_skipped: Arc<AtomicU64>,
    pub slow_frames: Arc<AtomicU64>,
    pub alert_changes: Arc<AtomicU64>,
    pub camera_switches: Arc<AtomicU64>,
    pub decode_failures: Arc<AtomicU64>,
    pub calibration_fallbacks: Arc<AtomicU64>,
    pub draw_time_us: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            ticks: Arc::new(AtomicU64::new(0)),
            frames_drawn: Arc::new(AtomicU64::new(0)),
            frames_skipped: Arc::new(AtomicU64::new(0)),
            slow_frames: Arc::new(AtomicU64::new(0)),
            alert_changes: Arc::new(AtomicU64::new(0)),
            camera_switches: Arc::new(AtomicU64::new(0)),
            decode_failures: Arc::new(AtomicU64::new(0)),
            calibration_fallbacks: Arc::new(AtomicU64::new(0)),
            draw_time_us: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_timing(&self, counter: &AtomicU64, duration_us: u64) {
        counter.store(duration_us, Ordering::Relaxed);
    }

    /// Drawn frames per wall-clock second since construction.
    pub fn fps(&self) -> f64 {
        let frames = self.frames_drawn.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            ticks: self.ticks.load(Ordering::Relaxed),
            frames_drawn: self.frames_drawn.load(Ordering::Relaxed),
            frames_skipped: self.frames_skipped.load(Ordering::Relaxed),
            slow_frames: self.slow_frames.load(Ordering::Relaxed),
            alert_changes: self.alert_changes.load(Ordering::Relaxed),
            camera_switches: self.camera_switches.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            calibration_fallbacks: self.calibration_fallbacks.load(Ordering::Relaxed),
            last_draw_us: self.draw_time_us.load(Ordering::Relaxed),
            fps: self.fps(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub ticks: u64,
    pub frames_drawn: u64,
    pub frames_skipped: u64,
    pub slow_frames: u64,
    pub alert_changes: u64,
    pub camera_switches: u64,
    pub decode_failures: u64,
    pub calibration_fallbacks: u64,
    pub last_draw_us: u64,
    pub fps: f64,
    pub elapsed_secs: f64,
}
