use crate::triangle::TrianglePath;

/// A transient, calculated arbitrage opportunity. Emitted and consumed within
/// the same tick cycle; not retained by the detector beyond cooldown bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct Opportunity {
    pub path: TrianglePath,
    pub profit_pct: f64,
    pub gross_return: f64,
    pub net_return: f64,
    pub prices: [f64; 3],
    pub quantities: [f64; 3],
    pub max_trade_qty: f64,
    pub timestamp_us: u64,
}

impl Opportunity {
    pub fn is_profitable(&self) -> bool {
        self.net_return > 1.0
    }
}

/// Running statistics over every opportunity the detector has observed.
#[derive(Debug, Clone, Default)]
pub struct OpportunityStats {
    pub total_scans: u64,
    pub opportunities_found: u64,
    pub opportunities_profitable: u64,
    pub opportunities_executed: u64,
    pub best_profit_pct: f64,
    pub worst_profit_pct: f64,
    avg_profit_pct: f64,
    profit_sum: f64,
}

impl OpportunityStats {
    pub fn record_opportunity(&mut self, profit_pct: f64, executed: bool) {
        self.opportunities_found += 1;

        if profit_pct > 0.0 {
            self.opportunities_profitable += 1;
            self.profit_sum += profit_pct;
            self.avg_profit_pct = self.profit_sum / self.opportunities_profitable as f64;
        }

        if profit_pct > self.best_profit_pct {
            self.best_profit_pct = profit_pct;
        }
        if profit_pct < self.worst_profit_pct || self.worst_profit_pct == 0.0 {
            self.worst_profit_pct = profit_pct;
        }

        if executed {
            self.opportunities_executed += 1;
        }
    }

    pub fn avg_profit_pct(&self) -> f64 {
        self.avg_profit_pct
    }
}
