//! Fixed-timestep accumulator turning wall-clock deltas into logic ticks.
use crate::config::Tuning;

/// Collects wall-clock time and hands out logic ticks of the current
/// interval. The interval shrinks as the primary snake grows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickScheduler {
    base_ms: f64,
    interval_ms: f64,
    accumulated_ms: f64,
    max_catch_up_ticks: u32,
}

impl TickScheduler {
    #[allow(missing_docs)]
    pub fn new(base_ms: f64, max_catch_up_ticks: u32) -> Self {
        TickScheduler {
            base_ms,
            interval_ms: base_ms,
            accumulated_ms: 0.0,
            max_catch_up_ticks: max_catch_up_ticks.max(1),
        }
    }

    /// duration of the next logic tick
    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// time collected but not yet spent on ticks
    pub fn accumulated_ms(&self) -> f64 {
        self.accumulated_ms
    }

    /// most ticks a single [crate::round::Round::tick] call runs
    pub fn max_catch_up_ticks(&self) -> u32 {
        self.max_catch_up_ticks
    }

    /// adds elapsed wall-clock time; negative deltas are ignored
    pub fn accumulate(&mut self, delta_ms: f64) {
        if delta_ms > 0.0 {
            self.accumulated_ms += delta_ms;
        }
    }

    /// Spends one interval if enough time has been collected. The remainder
    /// carries over to later ticks.
    pub fn take_tick(&mut self) -> Option<f64> {
        if self.accumulated_ms >= self.interval_ms {
            self.accumulated_ms -= self.interval_ms;
            Some(self.interval_ms)
        } else {
            None
        }
    }

    /// derives the interval from the primary snake's length
    pub fn recompute(&mut self, primary_length: usize, tuning: &Tuning) {
        self.interval_ms = self.base_ms * tuning.speed_factor(primary_length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fractional_carry_over() {
        let mut scheduler = TickScheduler::new(150.0, 5);
        scheduler.accumulate(100.0);
        assert_eq!(scheduler.take_tick(), None);
        scheduler.accumulate(100.0);
        assert_eq!(scheduler.take_tick(), Some(150.0));
        assert_eq!(scheduler.accumulated_ms(), 50.0);
        assert_eq!(scheduler.take_tick(), None);
        scheduler.accumulate(-500.0);
        assert_eq!(scheduler.accumulated_ms(), 50.0);
    }

    #[test]
    fn test_interval_follows_length() {
        let tuning = Tuning::default();
        let mut scheduler = TickScheduler::new(150.0, 5);
        scheduler.recompute(10, &tuning);
        assert_eq!(scheduler.interval_ms(), 150.0);
        scheduler.recompute(11, &tuning);
        assert_eq!(scheduler.interval_ms(), 120.0);
        scheduler.recompute(21, &tuning);
        assert_eq!(scheduler.interval_ms(), 90.0);
    }
}
