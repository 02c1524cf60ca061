//! Minimum spacing between consecutive target attempts.

use std::time::{Duration, Instant};

/// Computes how long the runner still owes before starting the next target.
///
/// Pure over the instants it is given, so it can be exercised without
/// real time passing.
#[derive(Debug, Clone)]
pub struct SpacingPolicy {
    min_gap: Duration,
    last_start: Option<Instant>,
}

impl SpacingPolicy {
    pub fn new(min_gap: Duration) -> Self {
        Self { min_gap, last_start: None }
    }

    /// Remaining delay at `now`. Zero before the first start.
    pub fn delay_before(&self, now: Instant) -> Duration {
        match self.last_start {
            Some(last) => self.min_gap.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    pub fn mark_started(&mut self, now: Instant) {
        self.last_start = Some(now);
    }

    pub fn min_gap(&self) -> Duration {
        self.min_gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_target_starts_immediately() {
        let policy = SpacingPolicy::new(Duration::from_secs(1));
        assert_eq!(policy.delay_before(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn test_remaining_gap() {
        let mut policy = SpacingPolicy::new(Duration::from_millis(1000));
        let t0 = Instant::now();
        policy.mark_started(t0);

        assert_eq!(policy.delay_before(t0), Duration::from_millis(1000));
        assert_eq!(policy.delay_before(t0 + Duration::from_millis(300)), Duration::from_millis(700));
        assert_eq!(policy.delay_before(t0 + Duration::from_millis(1500)), Duration::ZERO);
    }

    #[test]
    fn test_zero_gap_never_delays() {
        let mut policy = SpacingPolicy::new(Duration::ZERO);
        let t0 = Instant::now();
        policy.mark_started(t0);
        assert_eq!(policy.delay_before(t0), Duration::ZERO);
    }
}
