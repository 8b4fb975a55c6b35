use parking_lot::RwLock;

/// Trading-level performance counters, distinct from the generic named
/// counters in [`crate::counter::CounterRegistry`]: these drive the derived
/// P&L and success-rate figures the reporter surfaces every cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct TradingStats {
    pub opportunities_found: u64,
    pub opportunities_profitable: u64,
    pub opportunities_executed: u64,
    pub executions_successful: u64,
    pub executions_failed: u64,
    pub total_profit: f64,
    pub total_commission: f64,
    pub best_profit_pct: f64,
}

impl TradingStats {
    pub fn net_profit(&self) -> f64 {
        self.total_profit - self.total_commission
    }

    pub fn execution_success_rate(&self) -> f64 {
        let total = self.executions_successful + self.executions_failed;
        if total == 0 {
            0.0
        } else {
            self.executions_successful as f64 / total as f64
        }
    }
}

#[derive(Default)]
pub struct TradingStatsRecorder {
    stats: RwLock<TradingStats>,
}

impl TradingStatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_opportunity(&self, profit_pct: f64, executed: bool) {
        let mut stats = self.stats.write();
        stats.opportunities_found += 1;
        if profit_pct > 0.0 {
            stats.opportunities_profitable += 1;
        }
        if profit_pct > stats.best_profit_pct {
            stats.best_profit_pct = profit_pct;
        }
        if executed {
            stats.opportunities_executed += 1;
        }
    }

    pub fn record_execution(&self, success: bool, profit: f64, commission: f64) {
        let mut stats = self.stats.write();
        if success {
            stats.executions_successful += 1;
        } else {
            stats.executions_failed += 1;
        }
        stats.total_profit += profit;
        stats.total_commission += commission;
    }

    pub fn snapshot(&self) -> TradingStats {
        *self.stats.read()
    }
}
