//! Frame timing utilities

use std::time::{Duration, Instant};

/// Target frame period for the render loop (~60 updates per second).
pub const TICK_PERIOD: Duration = Duration::from_millis(16);

/// Drives the fixed-period render tick and provides the animation clock.
///
/// All animation timing is expressed as seconds since the timer was
/// created, so playback state never has to carry `Instant`s around.
pub struct TickTimer {
    epoch: Instant,
    next_tick: Instant,
    frame_count: u64,
    fps_timer: Instant,
    fps_frame_count: u32,
    fps: f32,
}

impl TickTimer {
    /// Create a new timer; the first tick fires immediately.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            epoch: now,
            next_tick: now,
            frame_count: 0,
            fps_timer: now,
            fps_frame_count: 0,
            fps: 0.0,
        }
    }

    /// Seconds elapsed since the timer was created.
    pub fn now(&self) -> f32 {
        self.epoch.elapsed().as_secs_f32()
    }

    /// True if the next fixed-period tick is due. Advances the schedule
    /// when it fires; a late caller does not accumulate debt.
    pub fn tick_due(&mut self) -> bool {
        let now = Instant::now();
        if now < self.next_tick {
            return false;
        }
        self.next_tick = now + TICK_PERIOD;
        self.frame_count += 1;
        self.fps_frame_count += 1;

        let fps_elapsed = now - self.fps_timer;
        if fps_elapsed >= Duration::from_secs(1) {
            self.fps = self.fps_frame_count as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = 0;
            self.fps_timer = now;
        }
        true
    }

    /// How long until the next tick is due (zero if already due).
    pub fn until_next_tick(&self) -> Duration {
        self.next_tick.saturating_duration_since(Instant::now())
    }

    /// Current frames per second (updated once per second)
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Total frame count since creation
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for TickTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_creation() {
        let timer = TickTimer::new();
        assert_eq!(timer.frame_count(), 0);
        assert_eq!(timer.fps(), 0.0);
    }

    #[test]
    fn test_clock_advances() {
        let timer = TickTimer::new();
        let a = timer.now();
        std::thread::sleep(Duration::from_millis(2));
        let b = timer.now();
        assert!(b > a);
    }

    #[test]
    fn test_first_tick_fires_immediately() {
        let mut timer = TickTimer::new();
        assert!(timer.tick_due());
        assert_eq!(timer.frame_count(), 1);
        // Immediately after, the next tick is not yet due
        assert!(!timer.tick_due());
        assert_eq!(timer.frame_count(), 1);
    }

    #[test]
    fn test_tick_schedule() {
        let mut timer = TickTimer::new();
        assert!(timer.tick_due());
        assert!(timer.until_next_tick() <= TICK_PERIOD);
        std::thread::sleep(TICK_PERIOD + Duration::from_millis(2));
        assert!(timer.tick_due());
        assert_eq!(timer.frame_count(), 2);
    }
}
