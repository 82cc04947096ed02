//! Time management for the game loop.
//!
//! The wall clock only feeds the accumulator; simulation code receives the
//! fixed step explicitly so a run can be replayed tick for tick.

use std::time::{Duration, Instant};

/// Longest stretch of wall time the accumulator will try to catch up on.
const MAX_ACCUMULATED: Duration = Duration::from_millis(250);

/// Manages frame timing and fixed-step accumulation.
#[derive(Debug)]
pub struct Time {
    /// Time of the last frame.
    last_frame: Instant,
    /// Duration of the last frame.
    delta: Duration,
    /// Total simulated time (sum of all advances).
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
    /// Fixed simulation step (default 60 Hz).
    fixed_timestep: Duration,
    /// Accumulated time for fixed updates.
    accumulator: Duration,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            fixed_timestep: Duration::from_secs_f64(1.0 / 60.0),
            accumulator: Duration::ZERO,
        }
    }

    /// Sample the wall clock at the start of a new frame.
    pub fn update(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;
        self.advance(delta);
    }

    /// Advance by an explicit delta. Deterministic alternative to [`Time::update`].
    pub fn advance(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
        self.accumulator = (self.accumulator + delta).min(MAX_ACCUMULATED);
    }

    /// Get total elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the fixed timestep in milliseconds.
    pub fn fixed_timestep_millis(&self) -> f32 {
        self.fixed_timestep.as_secs_f32() * 1000.0
    }

    /// Check if a fixed update should run and consume the time.
    pub fn should_fixed_update(&mut self) -> bool {
        if self.accumulator >= self.fixed_timestep {
            self.accumulator -= self.fixed_timestep;
            true
        } else {
            false
        }
    }

    /// Get the current FPS (averaged over last frame).
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }

    /// Set the fixed timestep rate in Hz.
    pub fn set_fixed_rate(&mut self, hz: f64) {
        self.fixed_timestep = Duration::from_secs_f64(1.0 / hz);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates_whole_fixed_steps() {
        let mut time = Time::new();
        time.set_fixed_rate(50.0);
        time.advance(Duration::from_millis(45));
        let mut steps = 0;
        while time.should_fixed_update() {
            steps += 1;
        }
        assert_eq!(steps, 2);
        time.advance(Duration::from_millis(15));
        assert!(time.should_fixed_update());
    }

    #[test]
    fn accumulator_is_capped_after_a_stall() {
        let mut time = Time::new();
        time.set_fixed_rate(100.0);
        time.advance(Duration::from_secs(5));
        let mut steps = 0;
        while time.should_fixed_update() {
            steps += 1;
        }
        assert_eq!(steps, 25);
        assert!((time.elapsed_seconds() - 5.0).abs() < 1e-4);
    }
}
