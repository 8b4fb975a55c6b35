use chrono::NaiveDate;

/// Mutable per-day trading state. Created with a starting balance; reset at
/// calendar-day rollover; mutated by the executor around every trade.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskState {
    pub balance: f64,
    pub daily_pnl: f64,
    pub daily_trades: u32,
    pub open_positions: u32,
    pub last_trade_time_ms: u64,
    pub current_date: NaiveDate,
    pub is_halted: bool,
    pub halt_reason: Option<String>,
}

impl RiskState {
    pub fn new(balance: f64, today: NaiveDate) -> Self {
        Self {
            balance,
            daily_pnl: 0.0,
            daily_trades: 0,
            open_positions: 0,
            last_trade_time_ms: 0,
            current_date: today,
            is_halted: false,
            halt_reason: None,
        }
    }

    fn reset_daily_counters(&mut self, today: NaiveDate) {
        self.current_date = today;
        self.daily_pnl = 0.0;
        self.daily_trades = 0;
        if self
            .halt_reason
            .as_deref()
            .is_some_and(|reason| reason.starts_with("Daily"))
        {
            self.is_halted = false;
            self.halt_reason = None;
        }
    }

    /// Rolls daily counters over if `today` differs from `current_date`.
    /// Halts whose reason begins with "Daily" are lifted on rollover.
    pub fn roll_over_if_new_day(&mut self, today: NaiveDate) {
        if today != self.current_date {
            self.reset_daily_counters(today);
        }
    }

    pub fn halt(&mut self, reason: impl Into<String>) {
        self.is_halted = true;
        self.halt_reason = Some(reason.into());
    }

    pub fn resume(&mut self) {
        self.is_halted = false;
        self.halt_reason = None;
    }
}
