//! Frame timing for the simulated frame loop.
//!
//! Splits variable frame times into fixed physics steps and keeps a rolling
//! average of recent frame times.

use std::collections::VecDeque;

/// Most physics steps one frame may run.
const MAX_STEPS_PER_FRAME: u32 = 10;

/// Frame timing manager.
#[derive(Debug)]
pub struct FrameTiming {
    /// Accumulator for fixed timestep
    accumulator: f32,
    /// Fixed timestep delta (for physics)
    fixed_dt: f32,
    /// Maximum delta time to prevent spiral of death
    max_dt: f32,
    /// Recent frame times for averaging
    frame_times: VecDeque<f32>,
    /// Maximum samples for averaging
    max_samples: usize,
    /// Fixed steps run since creation
    total_steps: u64,
}

impl FrameTiming {
    /// Creates a frame timer with the given physics step.
    #[must_use]
    pub fn new(fixed_dt: f32) -> Self {
        Self {
            accumulator: 0.0,
            fixed_dt: fixed_dt.max(0.001),
            max_dt: 0.25,
            frame_times: VecDeque::with_capacity(120),
            max_samples: 120,
            total_steps: 0,
        }
    }

    /// Get the fixed timestep value.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Records a frame of `dt` seconds.
    ///
    /// Returns the clamped frame time and the number of fixed updates to run.
    pub fn frame(&mut self, dt: f32) -> (f32, u32) {
        let dt = dt.clamp(0.0, self.max_dt);

        self.frame_times.push_back(dt);
        if self.frame_times.len() > self.max_samples {
            self.frame_times.pop_front();
        }

        self.accumulator += dt;
        let mut count = 0;
        while self.accumulator >= self.fixed_dt && count < MAX_STEPS_PER_FRAME {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // Still behind: drop the backlog
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        self.total_steps += u64::from(count);
        (dt, count)
    }

    /// Get the current FPS (averaged over recent frames).
    #[must_use]
    pub fn fps(&self) -> f32 {
        let avg = self.average_frame_time();
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }

    /// Average frame time in seconds.
    #[must_use]
    pub fn average_frame_time(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32
    }

    /// Fixed steps run since creation.
    #[must_use]
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Clears the accumulator and history.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.frame_times.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_steps_accumulate() {
        let mut timing = FrameTiming::new(0.02);
        assert_eq!(timing.frame(0.015).1, 0);
        assert_eq!(timing.frame(0.015).1, 1);
        assert!((timing.accumulator - 0.01).abs() < 1e-4);
        assert_eq!(timing.total_steps(), 1);
    }

    #[test]
    fn test_long_frames_are_clamped() {
        let mut timing = FrameTiming::new(0.02);
        let (dt, steps) = timing.frame(5.0);
        assert!((dt - 0.25).abs() < f32::EPSILON);
        assert_eq!(steps, 10);
        assert_eq!(timing.accumulator, 0.0);
    }

    #[test]
    fn test_fps_average() {
        let mut timing = FrameTiming::new(0.02);
        assert_eq!(timing.fps(), 0.0);
        for _ in 0..10 {
            timing.frame(0.02);
        }
        assert!((timing.fps() - 50.0).abs() < 0.1);
        timing.reset();
        assert_eq!(timing.average_frame_time(), 0.0);
    }
}
