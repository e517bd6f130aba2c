// Frame-rate limiter for the cooperative render loop
//
// The loop does its frame's work, then tick() sleeps away whatever is left
// of the frame budget. No busy waiting, no drift correction beyond
// restarting the budget at the end of each tick.

use std::time::{Duration, Instant};

pub struct FrameLimiter {
    budget: Duration,
    frame_start: Instant,
}

impl FrameLimiter {
    pub fn new(fps: u32) -> Self {
        let fps = fps.max(1);
        Self {
            budget: Duration::from_secs(1) / fps,
            frame_start: Instant::now(),
        }
    }

    /// Block until the current frame's budget has elapsed, then start the
    /// next frame.
    pub fn tick(&mut self) {
        let elapsed = self.frame_start.elapsed();
        if elapsed < self.budget {
            std::thread::sleep(self.budget - elapsed);
        }
        self.frame_start = Instant::now();
    }
}
