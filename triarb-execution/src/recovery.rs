use crate::types::ExecutionResult;
use fnv::FnvHashMap;
use smol_str::SmolStr;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};
use triarb_data::BboCache;
use triarb_instrument::SymbolCatalog;
use triarb_integration::time::now_us;
use triarb_integration::{ExchangeTransport, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    NoAction,
    Liquidate,
}

#[derive(Debug, Clone)]
pub struct RecoveryResult {
    pub action: RecoveryAction,
    pub success: bool,
    /// Name of the first stranded asset discovered. Only the first, even
    /// when several assets were liquidated in the same pass: one execution
    /// produces at most one unplanned asset in the common case (a single
    /// failed leg), so this is enough for a log line; full detail lives in
    /// `errors`.
    pub original_asset: String,
    pub recovered_amount: f64,
    pub recovery_cost: f64,
    pub latency_us: i64,
    pub errors: Vec<String>,
}

/// Liquidates whatever a partially-executed triangle left the account
/// holding, back into the base currency.
pub struct Recovery<T: ExchangeTransport> {
    transport: Arc<T>,
    catalog: Arc<SymbolCatalog>,
    cache: Arc<BboCache>,
    base_currency: SmolStr,
}

impl<T: ExchangeTransport> Recovery<T> {
    pub fn new(transport: Arc<T>, catalog: Arc<SymbolCatalog>, cache: Arc<BboCache>, base_currency: SmolStr) -> Self {
        Self { transport, catalog, cache, base_currency }
    }

    /// No-op on a fully successful execution. Otherwise computes the net
    /// stranded holdings across filled legs and liquidates them.
    pub async fn analyze_and_recover(&self, result: &ExecutionResult) -> Option<RecoveryResult> {
        if result.is_success() {
            return None;
        }

        let holdings = analyze_holdings(result, &self.base_currency);
        if holdings.is_empty() {
            return None;
        }

        Some(self.liquidate_holdings(holdings).await)
    }

    async fn liquidate_holdings(&self, holdings: Vec<(SmolStr, f64)>) -> RecoveryResult {
        let start = now_us();
        let original_asset = holdings[0].0.to_string();

        let mut recovered_amount = 0.0;
        let mut recovery_cost = 0.0;
        let mut errors = Vec::new();

        for (asset, amount) in &holdings {
            match self.liquidate_asset(asset, *amount).await {
                Ok(Some((recovered, cost))) => {
                    recovered_amount += recovered;
                    recovery_cost += cost;
                }
                Ok(None) => {
                    info!(%asset, amount, "stranded amount below minimum quantity, skipping liquidation");
                }
                Err(err) => {
                    error!(%asset, amount, %err, "failed to liquidate stranded asset");
                    errors.push(format!("{asset}: {err}"));
                }
            }
        }

        RecoveryResult {
            action: RecoveryAction::Liquidate,
            success: errors.is_empty(),
            original_asset,
            recovered_amount,
            recovery_cost,
            latency_us: now_us() - start,
            errors,
        }
    }

    /// Liquidates `amount` units of `asset` into the base currency, preferring
    /// a direct `asset/base` `Sell`, falling back to a reversed `base/asset`
    /// `Buy`. Returns `Ok(None)` if the rounded quantity falls below the
    /// pair's minimum and nothing was placed.
    async fn liquidate_asset(&self, asset: &str, amount: f64) -> Result<Option<(f64, f64)>, crate::Error> {
        if let Some(symbol) = self.catalog.find_symbol(asset, &self.base_currency) {
            let info = self.catalog.get(symbol).expect("catalog returned a symbol it doesn't track");
            let qty = info.round_quantity(amount);
            if qty < info.min_qty {
                return Ok(None);
            }
            let response = self.transport.place_market_order(symbol, Side::Sell, qty).await?;
            return Ok(Some((response.cumulative_quote_qty, response.total_commission())));
        }

        if let Some(symbol) = self.catalog.find_symbol(&self.base_currency, asset) {
            let info = self.catalog.get(symbol).expect("catalog returned a symbol it doesn't track");
            // Reversed pair: `asset` is the quote side, so buying the base
            // currency spends `amount` units of `asset`. Convert that spend
            // into base-currency order quantity using the pair's current
            // ask (we're the one lifting the offer).
            let Some(bbo) = self.cache.get(symbol) else {
                warn!(%asset, symbol = %symbol, "no live price for reversed liquidation pair, skipping");
                return Ok(None);
            };
            if bbo.ask_price <= 0.0 {
                return Ok(None);
            }
            let qty = info.round_quantity(amount / bbo.ask_price);
            if qty < info.min_qty {
                return Ok(None);
            }
            let response = self.transport.place_market_order(symbol, Side::Buy, qty).await?;
            return Ok(Some((response.cumulative_quote_qty, response.total_commission())));
        }

        Err(crate::Error::NoLiquidationPair {
            asset: asset.to_string(),
            base: self.base_currency.to_string(),
        })
    }

    /// Sweeps every non-kept balance into the base currency, for out-of-band
    /// cleanup outside the normal per-triangle recovery path.
    pub async fn emergency_liquidate_all(&self, assets_to_keep: &HashSet<SmolStr>) -> Vec<RecoveryResult> {
        let mut results = Vec::new();

        for asset in self.catalog.all_bases() {
            if assets_to_keep.contains(asset) || *asset == self.base_currency {
                continue;
            }
            let balance = match self.transport.get_balance(asset).await {
                Ok(balance) => balance,
                Err(err) => {
                    warn!(%asset, %err, "failed to fetch balance during emergency liquidation");
                    continue;
                }
            };
            if balance <= 0.0 {
                continue;
            }
            results.push(self.liquidate_holdings(vec![((*asset).clone(), balance)]).await);
        }

        results
    }
}

/// Two-pass net holdings: every filled leg's acquisition is added before any
/// filled leg's spend is subtracted, so an asset that was both acquired and
/// later spent (as input to a subsequent filled leg) nets to ~0 rather than
/// going transiently negative depending on iteration order.
fn analyze_holdings(result: &ExecutionResult, base_currency: &str) -> Vec<(SmolStr, f64)> {
    let mut holdings: FnvHashMap<SmolStr, f64> = FnvHashMap::default();

    for leg_result in result.legs.iter().filter(|leg| leg.is_filled()) {
        let to_asset = &leg_result.leg.to_asset;
        let acquired = match leg_result.leg.side {
            Side::Buy => leg_result.filled_qty,
            Side::Sell => leg_result.quote_qty,
        };
        *holdings.entry(to_asset.clone()).or_insert(0.0) += acquired;
    }

    for leg_result in result.legs.iter().filter(|leg| leg.is_filled()) {
        let from_asset = &leg_result.leg.from_asset;
        let spent = match leg_result.leg.side {
            Side::Buy => leg_result.quote_qty,
            Side::Sell => leg_result.filled_qty,
        };
        *holdings.entry(from_asset.clone()).or_insert(0.0) -= spent;
    }

    const DUST: f64 = 1e-9;
    holdings
        .into_iter()
        .filter(|(asset, amount)| asset.as_str() != base_currency && *amount > DUST)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LegResult;
    use smol_str::SmolStr;
    use triarb_integration::OrderStatus;
    use triarb_strategy::{TriangleLeg, TrianglePath};

    fn leg(symbol: &str, side: Side, from: &str, to: &str) -> TriangleLeg {
        TriangleLeg {
            symbol: SmolStr::new(symbol),
            side,
            from_asset: SmolStr::new(from),
            to_asset: SmolStr::new(to),
        }
    }

    fn filled(leg: TriangleLeg, filled_qty: f64, quote_qty: f64) -> LegResult {
        LegResult {
            leg,
            status: OrderStatus::Filled,
            order_id: Some("1".into()),
            filled_qty,
            filled_price: quote_qty / filled_qty,
            quote_qty,
            commission: 0.0,
            commission_asset: "USDT".into(),
            error: None,
            latency_us: 0,
        }
    }

    fn failed(leg: TriangleLeg) -> LegResult {
        LegResult::failed(leg, "rejected", 0)
    }

    fn path() -> TrianglePath {
        TrianglePath {
            id: "USDT-BTC-ETH".into(),
            base_asset: "USDT".into(),
            legs: [
                leg("BTCUSDT", Side::Buy, "USDT", "BTC"),
                leg("ETHBTC", Side::Buy, "BTC", "ETH"),
                leg("ETHUSDT", Side::Sell, "ETH", "USDT"),
            ],
        }
    }

    #[test]
    fn a_stranded_middle_asset_nets_to_its_acquired_amount() {
        let p = path();
        let result = ExecutionResult {
            triangle_id: p.id.clone(),
            status: crate::types::ExecutionStatus::Partial,
            legs: [
                filled(p.legs[0].clone(), 0.02, 1_000.0),
                failed(p.legs[1].clone()),
                failed(p.legs[2].clone()),
            ],
            total_profit: 0.0,
            total_commission: 0.0,
            start_timestamp_us: 0,
            end_timestamp_us: 0,
            rejection_reason: None,
        };

        let holdings = analyze_holdings(&result, "USDT");
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].0.as_str(), "BTC");
        assert!((holdings[0].1 - 0.02).abs() < 1e-9);
    }

    #[test]
    fn an_asset_spent_forward_by_a_later_filled_leg_nets_to_zero() {
        let p = path();
        let result = ExecutionResult {
            triangle_id: p.id.clone(),
            status: crate::types::ExecutionStatus::Partial,
            legs: [
                filled(p.legs[0].clone(), 0.02, 1_000.0),
                filled(p.legs[1].clone(), 0.34, 0.02),
                failed(p.legs[2].clone()),
            ],
            total_profit: 0.0,
            total_commission: 0.0,
            start_timestamp_us: 0,
            end_timestamp_us: 0,
            rejection_reason: None,
        };

        let holdings = analyze_holdings(&result, "USDT");
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].0.as_str(), "ETH");
        assert!((holdings[0].1 - 0.34).abs() < 1e-9);
    }

    #[test]
    fn a_fully_successful_triangle_needs_no_recovery() {
        let p = path();
        let result = ExecutionResult {
            triangle_id: p.id.clone(),
            status: crate::types::ExecutionStatus::Success,
            legs: [
                filled(p.legs[0].clone(), 0.02, 1_000.0),
                filled(p.legs[1].clone(), 0.34, 0.02),
                filled(p.legs[2].clone(), 0.34, 1_020.0),
            ],
            total_profit: 20.0,
            total_commission: 0.0,
            start_timestamp_us: 0,
            end_timestamp_us: 0,
            rejection_reason: None,
        };

        assert!(!result.needs_recovery());
        let holdings = analyze_holdings(&result, "USDT");
        assert!(holdings.is_empty());
    }
}
