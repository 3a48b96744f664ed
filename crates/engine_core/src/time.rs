//! Tic clock for the fixed-rate simulation.

use std::time::Duration;

/// Simulation steps per second.
pub const TICRATE: u32 = 35;

/// Counts simulation tics and paces them against wall-clock time.
#[derive(Debug)]
pub struct TicClock {
    /// Tics elapsed since the level started.
    leveltime: u32,
    /// Duration of one tic.
    tic_duration: Duration,
    /// Wall-clock time not yet spent on tics.
    accumulator: Duration,
}

impl Default for TicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TicClock {
    pub fn new() -> Self {
        Self {
            leveltime: 0,
            tic_duration: Duration::from_secs(1) / TICRATE,
            accumulator: Duration::ZERO,
        }
    }

    /// Tics elapsed since the level started.
    pub fn leveltime(&self) -> u32 {
        self.leveltime
    }

    /// Advance by one tic.
    pub fn tick(&mut self) {
        self.leveltime = self.leveltime.wrapping_add(1);
    }

    /// Feed wall-clock time; returns how many tics are now due.
    pub fn accumulate(&mut self, real: Duration) -> u32 {
        self.accumulator += real;
        let mut due = 0;
        while self.accumulator >= self.tic_duration {
            self.accumulator -= self.tic_duration;
            due += 1;
        }
        due
    }

    pub fn tic_duration(&self) -> Duration {
        self.tic_duration
    }
}

/// Whole seconds expressed in tics.
pub const fn seconds(n: u32) -> u32 {
    n * TICRATE
}
