use crate::counter::CounterRegistry;
use crate::latency::{LatencyStats, LatencyTracker};
use crate::trading::{TradingStats, TradingStatsRecorder};
use std::time::Instant;
use tracing::info;

const DEFAULT_LATENCY_WINDOW: usize = 1_000;

/// Central handle for in-process counters, latency histograms, and trading
/// statistics. Cheap to clone-share via `Arc`: every field is internally
/// synchronised, so a shared `&MetricsCollector` is enough for concurrent
/// callers across the detector, executor, and recovery paths.
pub struct MetricsCollector {
    counters: CounterRegistry,
    latencies: LatencyTracker,
    trading: TradingStatsRecorder,
    start: Instant,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::with_latency_window(DEFAULT_LATENCY_WINDOW)
    }

    pub fn with_latency_window(latency_window_size: usize) -> Self {
        Self {
            counters: CounterRegistry::new(),
            latencies: LatencyTracker::new(latency_window_size),
            trading: TradingStatsRecorder::new(),
            start: Instant::now(),
        }
    }

    pub fn increment_counter(&self, name: &str, value: u64) {
        self.counters.increment(name, value);
    }

    pub fn get_counter(&self, name: &str) -> u64 {
        self.counters.get(name)
    }

    pub fn record_latency(&self, name: &str, latency_us: i64) {
        self.latencies.record(name, latency_us);
    }

    pub fn get_latency_stats(&self, name: &str) -> LatencyStats {
        self.latencies.stats(name)
    }

    pub fn record_opportunity(&self, profit_pct: f64, executed: bool) {
        self.trading.record_opportunity(profit_pct, executed);
    }

    pub fn record_execution(&self, success: bool, profit: f64, commission: f64) {
        self.trading.record_execution(success, profit, commission);
    }

    pub fn trading_stats(&self) -> TradingStats {
        self.trading.snapshot()
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Logs one structured snapshot of every counter, tracked latency series,
    /// and the trading stats. Call this on a periodic timer from the binary;
    /// the collector itself schedules nothing.
    pub fn report(&self) {
        let stats = self.trading_stats();
        info!(
            uptime_s = self.uptime_seconds(),
            opportunities_found = stats.opportunities_found,
            opportunities_profitable = stats.opportunities_profitable,
            opportunities_executed = stats.opportunities_executed,
            executions_successful = stats.executions_successful,
            executions_failed = stats.executions_failed,
            execution_success_rate = stats.execution_success_rate(),
            total_profit = stats.total_profit,
            total_commission = stats.total_commission,
            net_profit = stats.net_profit(),
            "trading stats snapshot"
        );

        for (name, count) in self.counters.all() {
            info!(counter = %name, count, "counter snapshot");
        }

        for (name, latency) in self.latencies.all_stats() {
            if latency.count == 0 {
                continue;
            }
            info!(
                series = %name,
                min_us = latency.min_us,
                max_us = latency.max_us,
                avg_us = latency.avg_us,
                p50_us = latency.p50_us,
                p95_us = latency.p95_us,
                p99_us = latency.p99_us,
                count = latency.count,
                "latency snapshot"
            );
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_and_latencies_round_trip_through_the_collector() {
        let collector = MetricsCollector::new();
        collector.increment_counter("ticks.received", 5);
        collector.record_latency("tick_to_calc", 120);

        assert_eq!(collector.get_counter("ticks.received"), 5);
        assert_eq!(collector.get_latency_stats("tick_to_calc").count, 1);
    }

    #[test]
    fn trading_stats_reflect_recorded_opportunities_and_executions() {
        let collector = MetricsCollector::new();
        collector.record_opportunity(0.3, true);
        collector.record_execution(true, 12.0, 1.0);

        let stats = collector.trading_stats();
        assert_eq!(stats.opportunities_found, 1);
        assert_eq!(stats.executions_successful, 1);
        assert_eq!(stats.net_profit(), 11.0);
    }
}
