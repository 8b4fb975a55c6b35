//! In-process counters, latency histograms, and trading statistics,
//! queried back by the risk manager and the periodic reporter alike rather
//! than only pushed out to an external sink.

pub mod collector;
pub mod counter;
pub mod latency;
pub mod sliding_window;
pub mod trading;

pub use collector::MetricsCollector;
pub use counter::CounterRegistry;
pub use latency::{LatencyStats, LatencyTracker};
pub use sliding_window::SlidingWindowCounter;
pub use trading::{TradingStats, TradingStatsRecorder};
