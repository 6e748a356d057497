/**
 * @file clock.rs
 * @date 17/10/2026
 * @brief Conversion between external simulated time and CPU cycles
 */
use crate::common::Seconds;

/// Relative distance from an integer, in units of `f64::EPSILON`, under which
/// a product of time and frequency is treated as that integer
pub const CYCLE_TOLERANCE_ULPS: f64 = 4.0;

/// Smallest whole number of cycles covering `elapsed` at `frequency`.
/// `None` when the count does not fit into a `u64`.
pub fn cycle_budget(elapsed: Seconds, frequency: f64) -> Option<u64> {
    budget_with_noise(elapsed, frequency, 0.0)
}

/// Same as [`cycle_budget`], additionally absorbing `noise` cycles of
/// rounding error already present in `elapsed`
fn budget_with_noise(elapsed: Seconds, frequency: f64, noise: f64) -> Option<u64> {
    if !(elapsed > 0.0) {
        return Some(0);
    }

    let exact = elapsed * frequency;
    if !(exact < u64::MAX as f64) {
        return None;
    }

    let nearest = exact.round();
    let tolerance = exact * CYCLE_TOLERANCE_ULPS * f64::EPSILON + noise;

    if (exact - nearest).abs() <= tolerance {
        Some(nearest as u64)
    } else {
        Some(exact.ceil() as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Elapsed {
    Forward(Seconds),
    Stalled,
    /// Time went backwards, or is not a number at all
    Backwards(Seconds),
}

/// Last external time the emulator was brought up to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncClock {
    last_time: Seconds,
    frequency: f64,
}

impl SyncClock {
    pub fn new(start: Seconds, frequency: f64) -> Self {
        Self {
            last_time: start,
            frequency,
        }
    }

    pub fn last_time(&self) -> Seconds {
        self.last_time
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
    }

    pub fn elapsed(&self, now: Seconds) -> Elapsed {
        let elapsed = now - self.last_time;

        if elapsed > 0.0 {
            Elapsed::Forward(elapsed)
        } else if elapsed == 0.0 {
            Elapsed::Stalled
        } else {
            Elapsed::Backwards(elapsed)
        }
    }

    /// Cycles covering `elapsed` seconds past the last time. The rounding
    /// error of subtracting two absolute times is absorbed as well.
    pub fn budget(&self, elapsed: Seconds) -> Option<u64> {
        let noise = (2.0 * self.last_time.abs() + elapsed) * f64::EPSILON * self.frequency;
        budget_with_noise(elapsed, self.frequency, noise)
    }

    pub fn advance(&mut self, now: Seconds) {
        if now.is_nan() {
            log::warn!("Ignoring NaN time, staying at {}s", self.last_time);
            return;
        }

        self.last_time = now;
    }

    pub fn cycles_to_seconds(&self, cycles: u64) -> Seconds {
        cycles as f64 / self.frequency
    }
}
