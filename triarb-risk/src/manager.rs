use crate::error::Error;
use crate::limits::RiskLimits;
use crate::state::RiskState;
use chrono::NaiveDate;
use tracing::{info, warn};

/// Outcome of a pre-trade risk check. Never an `Err` — a rejection is a
/// business outcome, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckResult {
    Pass { adjusted_size: f64 },
    Reject { reason: String },
}

impl CheckResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, CheckResult::Pass { .. })
    }

    fn reject(reason: impl Into<String>) -> Self {
        CheckResult::Reject { reason: reason.into() }
    }
}

/// Pre-trade gate, daily counters, and halt/resume lifecycle for one trading
/// account. Not internally synchronised — callers share it behind a short
/// critical section (e.g. `parking_lot::Mutex`) for the duration of one
/// `check_trade` + lifecycle-hook sequence.
pub struct RiskManager {
    limits: RiskLimits,
    state: RiskState,
}

impl RiskManager {
    pub fn new(limits: RiskLimits, balance: f64, today: NaiveDate) -> Self {
        Self {
            limits,
            state: RiskState::new(balance, today),
        }
    }

    pub fn state(&self) -> &RiskState {
        &self.state
    }

    pub fn is_trading_allowed(&self) -> bool {
        !self.state.is_halted
    }

    pub fn available_capacity(&self) -> u32 {
        self.limits
            .max_concurrent_positions
            .saturating_sub(self.state.open_positions)
    }

    pub fn max_trade_size(&self) -> f64 {
        self.limits
            .max_trade_size
            .min(self.state.balance * self.limits.max_position_pct)
    }

    /// Evaluates `size` for `opportunity`, rolling daily counters over first.
    pub fn check_trade(&mut self, net_return: f64, size: f64, now_ms: u64, today: NaiveDate) -> CheckResult {
        self.state.roll_over_if_new_day(today);

        if self.state.is_halted {
            let reason = self.state.halt_reason.clone().unwrap_or_else(|| "halted".to_string());
            return CheckResult::reject(format!("trading halted: {reason}"));
        }
        if self.state.daily_pnl <= -self.limits.daily_loss_limit {
            return CheckResult::reject("daily loss limit reached");
        }
        if self.state.daily_trades >= self.limits.max_daily_trades {
            return CheckResult::reject("daily trade count limit reached");
        }
        if self.state.open_positions >= self.limits.max_concurrent_positions {
            return CheckResult::reject("max concurrent positions reached");
        }
        if now_ms.saturating_sub(self.state.last_trade_time_ms) < self.limits.min_time_between_trades_ms {
            return CheckResult::reject("minimum time between trades not elapsed");
        }

        let adjusted_size = size.clamp(self.limits.min_trade_size, self.max_trade_size());
        if adjusted_size < self.limits.min_trade_size {
            return CheckResult::reject("adjusted size below minimum trade size");
        }

        let expected_profit = adjusted_size * (net_return - 1.0);
        if expected_profit < 0.0 {
            return CheckResult::reject("expected profit is negative");
        }

        CheckResult::Pass { adjusted_size }
    }

    pub fn record_trade_start(&mut self, now_ms: u64) {
        self.state.open_positions += 1;
        self.state.last_trade_time_ms = now_ms;
    }

    pub fn record_trade_complete(&mut self, pnl: f64) {
        self.state.open_positions = self.state.open_positions.saturating_sub(1);
        self.state.daily_trades += 1;
        self.state.daily_pnl += pnl;

        if self.state.daily_pnl <= -self.limits.daily_loss_limit {
            warn!(daily_pnl = self.state.daily_pnl, "daily loss limit breached, halting");
            self.state.halt("Daily loss limit breached");
        }
    }

    pub fn record_trade_failed(&mut self) {
        self.state.open_positions = self.state.open_positions.saturating_sub(1);
    }

    pub fn force_halt(&mut self, reason: impl Into<String>) {
        self.state.halt(reason);
    }

    pub fn resume(&mut self) -> Result<(), Error> {
        if !self.state.is_halted {
            return Err(Error::NotHalted);
        }
        info!("risk manager resumed");
        self.state.resume();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 26).unwrap()
    }

    fn manager() -> RiskManager {
        RiskManager::new(RiskLimits::default(), 10_000.0, today())
    }

    #[test]
    fn passes_a_well_formed_trade() {
        let mut rm = manager();
        let result = rm.check_trade(1.01, 100.0, 1_000, today());
        assert!(result.is_pass());
    }

    #[test]
    fn rejects_when_halted() {
        let mut rm = manager();
        rm.force_halt("manual halt");
        let result = rm.check_trade(1.01, 100.0, 1_000, today());
        assert!(!result.is_pass());
    }

    #[test]
    fn rejects_negative_expected_profit() {
        let mut rm = manager();
        let result = rm.check_trade(0.99, 100.0, 1_000, today());
        assert!(!result.is_pass());
    }

    #[test]
    fn daily_loss_limit_breach_auto_halts_and_blocks_further_trades() {
        let mut rm = manager();
        rm.record_trade_complete(-600.0);
        assert!(!rm.is_trading_allowed());
        let result = rm.check_trade(1.01, 100.0, 1_000, today());
        assert!(!result.is_pass());
    }

    #[test]
    fn new_calendar_day_resets_counters_and_lifts_daily_halt() {
        let mut rm = manager();
        rm.record_trade_complete(-600.0);
        assert!(!rm.is_trading_allowed());

        let tomorrow = today().succ_opt().unwrap();
        let result = rm.check_trade(1.01, 100.0, 1_000, tomorrow);
        assert!(result.is_pass());
        assert_eq!(rm.state().daily_trades, 0);
    }

    #[test]
    fn size_is_clamped_to_the_position_pct_ceiling() {
        let mut rm = manager();
        let result = rm.check_trade(1.01, 100_000.0, 1_000, today());
        match result {
            CheckResult::Pass { adjusted_size } => {
                assert!((adjusted_size - rm.max_trade_size()).abs() < 1e-9);
            }
            CheckResult::Reject { .. } => panic!("expected pass"),
        }
    }
}
