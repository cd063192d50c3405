use std::time::{Duration, Instant};

/// Loop health over one reporting interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub worst_frame_ms: f32,
    /// Stack changes applied during the interval.
    pub layer_changes: usize,
    pub layer_count: usize,
}

/// What one pass of the frame loop did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FrameSample {
    pub(crate) frame_dt: Duration,
    pub(crate) ticks: u32,
    pub(crate) layer_changes: usize,
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    frames: u32,
    ticks: u32,
    frame_time_sum: Duration,
    worst_frame: Duration,
    layer_changes: usize,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self::starting_at(Instant::now(), interval)
    }

    pub(crate) fn starting_at(interval_start: Instant, interval: Duration) -> Self {
        Self {
            interval_start,
            interval,
            frames: 0,
            ticks: 0,
            frame_time_sum: Duration::ZERO,
            worst_frame: Duration::ZERO,
            layer_changes: 0,
        }
    }

    pub(crate) fn record(&mut self, sample: FrameSample) {
        self.frames = self.frames.saturating_add(1);
        self.ticks = self.ticks.saturating_add(sample.ticks);
        self.frame_time_sum = self.frame_time_sum.saturating_add(sample.frame_dt);
        self.worst_frame = self.worst_frame.max(sample.frame_dt);
        self.layer_changes = self.layer_changes.saturating_add(sample.layer_changes);
    }

    /// Emits and resets once `interval` has passed since the last snapshot.
    pub(crate) fn maybe_snapshot(
        &mut self,
        now: Instant,
        layer_count: usize,
    ) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = match self.frames {
            0 => 0.0,
            frames => self.frame_time_sum.as_secs_f32() * 1000.0 / frames as f32,
        };
        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / elapsed_seconds,
            tps: self.ticks as f32 / elapsed_seconds,
            frame_time_ms,
            worst_frame_ms: self.worst_frame.as_secs_f32() * 1000.0,
            layer_changes: self.layer_changes,
            layer_count,
        };

        *self = Self::starting_at(now, self.interval);
        Some(snapshot)
    }
}
