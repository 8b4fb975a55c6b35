use fnv::FnvHashMap;
use parking_lot::RwLock;
use std::collections::VecDeque;

/// Aggregated latency statistics over whatever samples are currently
/// in the window. All fields are zero when no samples have been recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencyStats {
    pub min_us: i64,
    pub max_us: i64,
    pub avg_us: f64,
    pub p50_us: i64,
    pub p95_us: i64,
    pub p99_us: i64,
    pub count: usize,
}

/// Fixed-capacity ring buffer of latency samples per named series, with
/// percentiles computed by sorting on read rather than maintained online.
pub struct LatencyTracker {
    series: RwLock<FnvHashMap<String, VecDeque<i64>>>,
    window_size: usize,
}

impl LatencyTracker {
    pub fn new(window_size: usize) -> Self {
        Self { series: RwLock::new(FnvHashMap::default()), window_size }
    }

    /// Records one sample for `name` (e.g. `"tick_to_calc"`, `"order_to_fill"`),
    /// evicting the oldest sample once the window is full.
    pub fn record(&self, name: &str, latency_us: i64) {
        let mut series = self.series.write();
        let samples = series.entry(name.to_string()).or_insert_with(|| VecDeque::with_capacity(self.window_size));
        if samples.len() >= self.window_size {
            samples.pop_front();
        }
        samples.push_back(latency_us);
    }

    pub fn stats(&self, name: &str) -> LatencyStats {
        let series = self.series.read();
        let Some(samples) = series.get(name) else {
            return LatencyStats::default();
        };
        stats_from_samples(samples)
    }

    pub fn all_stats(&self) -> Vec<(String, LatencyStats)> {
        let series = self.series.read();
        series.iter().map(|(name, samples)| (name.clone(), stats_from_samples(samples))).collect()
    }
}

fn stats_from_samples(samples: &VecDeque<i64>) -> LatencyStats {
    if samples.is_empty() {
        return LatencyStats::default();
    }

    let mut sorted: Vec<i64> = samples.iter().copied().collect();
    sorted.sort_unstable();
    let n = sorted.len();

    LatencyStats {
        min_us: sorted[0],
        max_us: sorted[n - 1],
        avg_us: sorted.iter().sum::<i64>() as f64 / n as f64,
        p50_us: sorted[n / 2],
        p95_us: sorted[((n as f64) * 0.95) as usize],
        p99_us: if n > 1 { sorted[((n as f64) * 0.99) as usize] } else { sorted[n - 1] },
        count: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_are_zeroed_for_an_unseen_series() {
        let tracker = LatencyTracker::new(1_000);
        assert_eq!(tracker.stats("unknown"), LatencyStats::default());
    }

    #[test]
    fn min_max_avg_and_percentiles_match_a_known_sample_set() {
        let tracker = LatencyTracker::new(1_000);
        for sample in [10, 20, 30, 40, 50, 60, 70, 80, 90, 100] {
            tracker.record("order_to_fill", sample);
        }
        let stats = tracker.stats("order_to_fill");
        assert_eq!(stats.count, 10);
        assert_eq!(stats.min_us, 10);
        assert_eq!(stats.max_us, 100);
        assert_eq!(stats.avg_us, 55.0);
        assert_eq!(stats.p50_us, 60);
    }

    #[test]
    fn the_window_evicts_the_oldest_sample_once_full() {
        let tracker = LatencyTracker::new(3);
        tracker.record("tick_to_calc", 1);
        tracker.record("tick_to_calc", 2);
        tracker.record("tick_to_calc", 3);
        tracker.record("tick_to_calc", 4);

        let stats = tracker.stats("tick_to_calc");
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min_us, 2);
        assert_eq!(stats.max_us, 4);
    }
}
