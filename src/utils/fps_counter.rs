use std::time::{Duration, Instant};

/// Frame rate averaged over one-second windows.
pub struct FpsCounter {
    last_update: Instant,
    frame_count: u32,
    accumulated_time: Duration,
    pub current_fps: f32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FpsCounter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_update: Instant::now(),
            frame_count: 0,
            accumulated_time: Duration::ZERO,
            current_fps: 0.0,
        }
    }

    /// Counts one frame. Returns the new average once per second.
    pub fn update(&mut self) -> Option<f32> {
        let now = Instant::now();
        let delta = now - self.last_update;
        self.last_update = now;
        self.tick(delta)
    }

    fn tick(&mut self, delta: Duration) -> Option<f32> {
        self.frame_count += 1;
        self.accumulated_time += delta;

        if self.accumulated_time.as_secs_f32() >= 1.0 {
            self.current_fps = self.frame_count as f32 / self.accumulated_time.as_secs_f32();
            self.accumulated_time = Duration::ZERO;
            self.frame_count = 0;
            return Some(self.current_fps);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_per_second() {
        let mut fps = FpsCounter::new();
        let frame = Duration::from_millis(20);
        let reports: Vec<_> = (0..100).filter_map(|_| fps.tick(frame)).collect();
        assert_eq!(reports.len(), 2);
        assert!((reports[0] - 50.0).abs() < 0.5, "{}", reports[0]);
    }
}
