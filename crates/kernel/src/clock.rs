use std::time::{Duration, Instant};

/// Upper bound on a single tick's delta, so a stalled window does not fling
/// the grid forward.
pub const MAX_DELTA: f32 = 0.1;

/// Turns wall-clock instants into the `(elapsed, delta)` pair the environment
/// ticks on.
///
/// Hosts with their own timing can skip this and call `Environment::tick`
/// directly.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self { start, last: start }
    }

    /// Advance to `now`. Returns `(elapsed seconds, delta seconds)`, delta
    /// clamped to [`MAX_DELTA`]. Instants earlier than the last one yield a
    /// zero delta.
    pub fn advance(&mut self, now: Instant) -> (f32, f32) {
        let delta = now.saturating_duration_since(self.last).as_secs_f32();
        if now > self.last {
            self.last = now;
        }
        let elapsed = self.last.duration_since(self.start).as_secs_f32();
        (elapsed, delta.min(MAX_DELTA))
    }

    pub fn tick(&mut self) -> (f32, f32) {
        self.advance(Instant::now())
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Ring buffer of recent frame durations for the stats overlay.
#[derive(Debug)]
pub struct FrameStats {
    samples: Vec<Duration>,
    next: usize,
    len: usize,
}

impl FrameStats {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![Duration::ZERO; capacity.max(1)],
            next: 0,
            len: 0,
        }
    }

    pub fn record(&mut self, frame: Duration) {
        self.samples[self.next] = frame;
        self.next = (self.next + 1) % self.samples.len();
        self.len = (self.len + 1).min(self.samples.len());
    }

    fn recorded(&self) -> &[Duration] {
        &self.samples[..self.len]
    }

    pub fn count(&self) -> usize {
        self.len
    }

    pub fn average(&self) -> Duration {
        if self.len == 0 {
            return Duration::ZERO;
        }
        self.recorded().iter().sum::<Duration>() / self.len as u32
    }

    pub fn max(&self) -> Duration {
        self.recorded().iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.recorded().iter().copied().min().unwrap_or(Duration::ZERO)
    }

    /// Frames per second from the average frame time.
    pub fn fps(&self) -> f32 {
        let avg = self.average().as_secs_f32();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_reports_elapsed_and_delta() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        let (elapsed, delta) = clock.advance(start + Duration::from_millis(16));
        assert!((elapsed - 0.016).abs() < 1e-6);
        assert!((delta - 0.016).abs() < 1e-6);
        let (elapsed, delta) = clock.advance(start + Duration::from_millis(48));
        assert!((elapsed - 0.048).abs() < 1e-6);
        assert!((delta - 0.032).abs() < 1e-6);
    }

    #[test]
    fn long_stall_is_clamped() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        let (elapsed, delta) = clock.advance(start + Duration::from_secs(3));
        assert_eq!(delta, MAX_DELTA);
        assert!((elapsed - 3.0).abs() < 1e-6);
    }

    #[test]
    fn elapsed_never_goes_backwards() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        clock.advance(start + Duration::from_millis(50));
        let (elapsed, delta) = clock.advance(start + Duration::from_millis(20));
        assert_eq!(delta, 0.0);
        assert!((elapsed - 0.05).abs() < 1e-6);
    }

    #[test]
    fn stats_track_history() {
        let mut stats = FrameStats::new(3);
        stats.record(Duration::from_millis(10));
        stats.record(Duration::from_millis(20));
        stats.record(Duration::from_millis(30));

        assert_eq!(stats.count(), 3);
        assert_eq!(stats.average(), Duration::from_millis(20));
        assert_eq!(stats.max(), Duration::from_millis(30));
        assert_eq!(stats.min(), Duration::from_millis(10));
        assert!((stats.fps() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn stats_overwrite_oldest() {
        let mut stats = FrameStats::new(2);
        stats.record(Duration::from_millis(10));
        stats.record(Duration::from_millis(20));
        stats.record(Duration::from_millis(30));

        assert_eq!(stats.count(), 2);
        assert_eq!(stats.average(), Duration::from_millis(25));
    }

    #[test]
    fn empty_stats() {
        let stats = FrameStats::new(8);
        assert_eq!(stats.average(), Duration::ZERO);
        assert_eq!(stats.fps(), 0.0);
    }
}
