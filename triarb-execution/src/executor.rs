use crate::quantities::leg_quantities;
use crate::recovery::Recovery;
use crate::types::{self, ExecutionResult, ExecutionStatus, LegResult};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use triarb_instrument::SymbolCatalog;
use triarb_integration::time::now_us;
use triarb_integration::{ExchangeTransport, OrderStatus, Side, TimeInForce};
use triarb_risk::{CheckResult, RiskManager};
use triarb_strategy::Opportunity;

/// Tunables for one executor instance. `slippage_buffer` applies to the
/// simulated fill price under `dry_run`, and also bounds the limit price
/// offered on live limit orders when `use_market_orders` is false.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    pub slippage_buffer: f64,
    pub order_timeout_ms: u64,
    pub dry_run: bool,
    pub dry_run_fee_rate: f64,
    pub use_market_orders: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            slippage_buffer: 0.0005,
            order_timeout_ms: 5_000,
            dry_run: true,
            dry_run_fee_rate: 0.001,
            use_market_orders: true,
        }
    }
}

/// Dispatches the three legs of a triangle concurrently, reconciles the
/// outcome, and hands off to `Recovery` whenever fewer than three legs fill.
pub struct TriangleExecutor<T: ExchangeTransport> {
    transport: Arc<T>,
    catalog: Arc<SymbolCatalog>,
    risk: Arc<Mutex<RiskManager>>,
    recovery: Recovery<T>,
    config: ExecutorConfig,
}

impl<T: ExchangeTransport + 'static> TriangleExecutor<T> {
    pub fn new(
        transport: Arc<T>,
        catalog: Arc<SymbolCatalog>,
        risk: Arc<Mutex<RiskManager>>,
        recovery: Recovery<T>,
        config: ExecutorConfig,
    ) -> Self {
        Self { transport, catalog, risk, recovery, config }
    }

    /// Runs one triangle end to end: risk gate, concurrent leg dispatch,
    /// outcome reconciliation, and recovery if the outcome isn't `Success`.
    pub async fn execute(&self, opportunity: &Opportunity) -> ExecutionResult {
        let start = now_us();
        let today = Utc::now().date_naive();

        let size = {
            let risk = self.risk.lock();
            opportunity.max_trade_qty.min(risk.max_trade_size())
        };

        let adjusted_size = {
            let mut risk = self.risk.lock();
            match risk.check_trade(opportunity.net_return, size, (start / 1_000) as u64, today) {
                CheckResult::Pass { adjusted_size } => {
                    risk.record_trade_start((start / 1_000) as u64);
                    adjusted_size
                }
                CheckResult::Reject { reason } => {
                    warn!(triangle_id = %opportunity.path.id, %reason, "trade rejected by risk manager");
                    return rejected(opportunity, start, reason);
                }
            }
        };

        let quantities = leg_quantities(&opportunity.path, &opportunity.prices, adjusted_size);

        let legs = if self.config.dry_run {
            self.simulate_legs(opportunity, &quantities)
        } else {
            self.dispatch_legs(opportunity, &quantities).await
        };

        let filled_count = legs.iter().filter(|leg| leg.is_filled()).count();
        let status = types::status_from_filled_count(filled_count);
        let (total_profit, total_commission) = types::settle(&legs, adjusted_size);

        {
            let mut risk = self.risk.lock();
            if status == ExecutionStatus::Success {
                risk.record_trade_complete(total_profit);
            } else {
                risk.record_trade_failed();
            }
        }

        let mut result = ExecutionResult {
            triangle_id: opportunity.path.id.clone(),
            status,
            legs,
            total_profit,
            total_commission,
            start_timestamp_us: start,
            end_timestamp_us: now_us(),
            rejection_reason: None,
        };

        if result.needs_recovery() {
            warn!(
                triangle_id = %opportunity.path.id,
                filled = filled_count,
                "triangle execution incomplete, attempting recovery"
            );
            if let Some(recovery) = self.recovery.analyze_and_recover(&result).await {
                if recovery.success {
                    result.status = ExecutionStatus::Recovered;
                }
            }
        } else {
            info!(
                triangle_id = %opportunity.path.id,
                profit = total_profit,
                "triangle executed successfully"
            );
        }

        result
    }

    /// Places all three orders concurrently and awaits every leg, regardless
    /// of whether an earlier one failed: a triangle is either fully unwound
    /// or fully recovered, never abandoned mid-flight. Orders are fired as
    /// plain market orders unless `use_market_orders` is false, in which
    /// case each leg is priced at the quoted price buffered by
    /// `slippage_buffer` against the trader and rounded to the symbol's
    /// tick/step size before being sent as a limit order.
    async fn dispatch_legs(&self, opportunity: &Opportunity, quantities: &[f64; 3]) -> [LegResult; 3] {
        let timeout = Duration::from_millis(self.config.order_timeout_ms);
        let use_market_orders = self.config.use_market_orders;
        let slippage_buffer = self.config.slippage_buffer;

        let handles =
            opportunity.path.legs.clone().into_iter().zip(*quantities).zip(opportunity.prices).map(
                |((leg, qty), quoted_price)| {
                    let transport = self.transport.clone();
                    let catalog = self.catalog.clone();
                    tokio::spawn(async move {
                        let start = now_us();
                        let symbol = leg.symbol.clone();
                        let side = leg.side;

                        let outcome = if use_market_orders {
                            tokio::time::timeout(timeout, transport.place_market_order(&symbol, side, qty)).await
                        } else {
                            let raw_price = match side {
                                Side::Buy => quoted_price * (1.0 + slippage_buffer),
                                Side::Sell => quoted_price * (1.0 - slippage_buffer),
                            };
                            let (price, qty) = match catalog.get(&symbol) {
                                Some(info) => (info.round_price(raw_price), info.round_quantity(qty)),
                                None => (raw_price, qty),
                            };
                            tokio::time::timeout(
                                timeout,
                                transport.place_limit_order(&symbol, side, qty, price, TimeInForce::ImmediateOrCancel),
                            )
                            .await
                        };
                        let latency_us = now_us() - start;

                        match outcome {
                            Ok(Ok(response)) => LegResult {
                                filled_qty: response.executed_qty,
                                filled_price: response.avg_fill_price().unwrap_or(0.0),
                                quote_qty: response.cumulative_quote_qty,
                                commission: response.total_commission(),
                                commission_asset: response.commission_asset.clone(),
                                order_id: Some(response.order_id.clone()),
                                status: response.status,
                                error: None,
                                leg,
                                latency_us,
                            },
                            Ok(Err(err)) => LegResult::failed(leg, err.to_string(), latency_us),
                            Err(_) => LegResult::failed(leg, "order timed out", latency_us),
                        }
                    })
                },
            );

        let mut results = futures::future::join_all(handles).await.into_iter();
        std::array::from_fn(|_| results.next().unwrap().unwrap_or_else(|join_err| {
            LegResult::failed(
                opportunity.path.legs[0].clone(),
                format!("leg task panicked: {join_err}"),
                0,
            )
        }))
    }

    /// Simulates every leg filling in full at the quoted price, adjusted by
    /// `slippage_buffer` against the trader, with a synthetic commission of
    /// `qty * price * dry_run_fee_rate`.
    fn simulate_legs(&self, opportunity: &Opportunity, quantities: &[f64; 3]) -> [LegResult; 3] {
        std::array::from_fn(|i| {
            let leg = opportunity.path.legs[i].clone();
            let quoted_price = opportunity.prices[i];
            let filled_price = match leg.side {
                Side::Buy => quoted_price * (1.0 + self.config.slippage_buffer),
                Side::Sell => quoted_price * (1.0 - self.config.slippage_buffer),
            };
            let qty = quantities[i];
            let commission = qty * filled_price * self.config.dry_run_fee_rate;

            LegResult {
                leg,
                status: OrderStatus::Filled,
                order_id: Some(format!("dry-run-{i}")),
                filled_qty: qty,
                filled_price,
                quote_qty: qty * filled_price,
                commission,
                commission_asset: String::from("dry-run"),
                error: None,
                latency_us: 0,
            }
        })
    }
}

fn rejected(opportunity: &Opportunity, start: i64, reason: String) -> ExecutionResult {
    let legs = std::array::from_fn(|i| {
        LegResult::failed(opportunity.path.legs[i].clone(), reason.clone(), 0)
    });

    ExecutionResult {
        triangle_id: opportunity.path.id.clone(),
        status: ExecutionStatus::Failed,
        legs,
        total_profit: 0.0,
        total_commission: 0.0,
        start_timestamp_us: start,
        end_timestamp_us: now_us(),
        rejection_reason: Some(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use chrono::NaiveDate;
    use smol_str::SmolStr;
    use triarb_instrument::SymbolCatalog;
    use triarb_strategy::TriangleLeg;
    use triarb_strategy::TrianglePath;

    fn triangle() -> TrianglePath {
        TrianglePath {
            id: SmolStr::new("USDT-BTC-ETH"),
            base_asset: SmolStr::new("USDT"),
            legs: [
                TriangleLeg {
                    symbol: SmolStr::new("BTCUSDT"),
                    side: Side::Buy,
                    from_asset: SmolStr::new("USDT"),
                    to_asset: SmolStr::new("BTC"),
                },
                TriangleLeg {
                    symbol: SmolStr::new("ETHBTC"),
                    side: Side::Buy,
                    from_asset: SmolStr::new("BTC"),
                    to_asset: SmolStr::new("ETH"),
                },
                TriangleLeg {
                    symbol: SmolStr::new("ETHUSDT"),
                    side: Side::Sell,
                    from_asset: SmolStr::new("ETH"),
                    to_asset: SmolStr::new("USDT"),
                },
            ],
        }
    }

    fn opportunity() -> Opportunity {
        Opportunity {
            path: triangle(),
            profit_pct: 1.0,
            gross_return: 1.011,
            net_return: 1.01,
            prices: [50_000.0, 0.059, 3_001.0],
            quantities: [1.0, 50.0, 10.0],
            max_trade_qty: 500.0,
            timestamp_us: 0,
        }
    }

    fn risk() -> Arc<Mutex<RiskManager>> {
        let today = NaiveDate::from_ymd_opt(2026, 7, 26).unwrap();
        Arc::new(Mutex::new(RiskManager::new(Default::default(), 10_000.0, today)))
    }

    #[tokio::test]
    async fn dry_run_fills_every_leg_and_reports_success() {
        let transport = Arc::new(MockTransport::new());
        let catalog = Arc::new(SymbolCatalog::default());
        let cache = Arc::new(triarb_data::BboCache::new());
        let recovery = Recovery::new(transport.clone(), catalog.clone(), cache, SmolStr::new("USDT"));
        let config = ExecutorConfig { dry_run: true, ..Default::default() };
        let executor = TriangleExecutor::new(transport, catalog, risk(), recovery, config);

        let result = executor.execute(&opportunity()).await;
        assert_eq!(result.status, ExecutionStatus::Success);
        assert_eq!(result.filled_count(), 3);
        assert!(result.rejection_reason.is_none());
    }

    #[tokio::test]
    async fn a_failing_middle_leg_triggers_recovery_attempt() {
        let transport = Arc::new(MockTransport::new());
        transport.fail_leg("ETHBTC");
        let catalog = Arc::new(SymbolCatalog::default());
        let cache = Arc::new(triarb_data::BboCache::new());
        let recovery = Recovery::new(transport.clone(), catalog.clone(), cache, SmolStr::new("USDT"));
        let config = ExecutorConfig { dry_run: false, ..Default::default() };
        let executor = TriangleExecutor::new(transport, catalog, risk(), recovery, config);

        let result = executor.execute(&opportunity()).await;
        assert_ne!(result.status, ExecutionStatus::Success);
        assert_eq!(result.filled_count(), 1);
    }

    #[tokio::test]
    async fn live_dispatch_with_limit_orders_fills_every_leg() {
        let transport = Arc::new(MockTransport::new());
        let catalog = Arc::new(SymbolCatalog::default());
        let cache = Arc::new(triarb_data::BboCache::new());
        let recovery = Recovery::new(transport.clone(), catalog.clone(), cache, SmolStr::new("USDT"));
        let config = ExecutorConfig { dry_run: false, use_market_orders: false, ..Default::default() };
        let executor = TriangleExecutor::new(transport, catalog, risk(), recovery, config);

        let result = executor.execute(&opportunity()).await;
        assert_eq!(result.status, ExecutionStatus::Success);
        assert_eq!(result.filled_count(), 3);
    }

    #[tokio::test]
    async fn exhausted_risk_budget_rejects_before_dispatch() {
        let transport = Arc::new(MockTransport::new());
        let catalog = Arc::new(SymbolCatalog::default());
        let cache = Arc::new(triarb_data::BboCache::new());
        let recovery = Recovery::new(transport.clone(), catalog.clone(), cache, SmolStr::new("USDT"));
        let config = ExecutorConfig::default();
        let risk = risk();
        risk.lock().force_halt("manual halt");
        let executor = TriangleExecutor::new(transport, catalog, risk, recovery, config);

        let result = executor.execute(&opportunity()).await;
        assert_eq!(result.filled_count(), 0);
        assert!(result.rejection_reason.is_some());
    }
}
