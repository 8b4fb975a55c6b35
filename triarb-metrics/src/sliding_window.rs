use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Counts events over a rolling time window, pruning expired timestamps on
/// every read rather than on a background timer.
pub struct SlidingWindowCounter {
    window: Duration,
    events: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowCounter {
    pub fn new(window: Duration) -> Self {
        Self { window, events: Mutex::new(VecDeque::new()) }
    }

    pub fn increment(&self) {
        let now = Instant::now();
        let mut events = self.events.lock();
        events.push_back(now);
        prune(&mut events, now, self.window);
    }

    pub fn count(&self) -> usize {
        let mut events = self.events.lock();
        prune(&mut events, Instant::now(), self.window);
        events.len()
    }

    pub fn rate_per_second(&self) -> f64 {
        self.count() as f64 / self.window.as_secs_f64()
    }
}

fn prune(events: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = events.front() {
        if now.duration_since(oldest) > window {
            events.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_events_recorded_within_the_window() {
        let counter = SlidingWindowCounter::new(Duration::from_secs(60));
        counter.increment();
        counter.increment();
        counter.increment();
        assert_eq!(counter.count(), 3);
    }

    #[test]
    fn an_empty_window_reports_a_zero_rate() {
        let counter = SlidingWindowCounter::new(Duration::from_secs(60));
        assert_eq!(counter.rate_per_second(), 0.0);
    }
}
