/// Configurable bounds the risk manager enforces on every trade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskLimits {
    pub max_position_pct: f64,
    pub max_trade_size: f64,
    pub min_trade_size: f64,
    pub daily_loss_limit: f64,
    pub max_daily_trades: u32,
    pub max_concurrent_positions: u32,
    pub min_time_between_trades_ms: u64,
    pub max_hold_time_ms: u64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_pct: 0.1,
            max_trade_size: 1_000.0,
            min_trade_size: 10.0,
            daily_loss_limit: 500.0,
            max_daily_trades: 200,
            max_concurrent_positions: 3,
            min_time_between_trades_ms: 200,
            max_hold_time_ms: 30_000,
        }
    }
}
