use crate::opportunity::Opportunity;
use crate::triangle::TrianglePath;
use triarb_data::BboCache;
use triarb_integration::time::now_us;
use triarb_integration::Side;

/// Computes arbitrage profit for a triangle against the current BBO cache.
/// Pre-computes the composed three-leg fee multiplier so the hot path never
/// recomputes a `powi`.
pub struct ProfitCalculator {
    fee_rate: f64,
    fee_multiplier: f64,
}

impl ProfitCalculator {
    pub fn new(fee_rate: f64) -> Self {
        Self {
            fee_rate,
            fee_multiplier: (1.0 - fee_rate).powi(3),
        }
    }

    pub fn fee_rate(&self) -> f64 {
        self.fee_rate
    }

    pub fn set_fee_rate(&mut self, fee_rate: f64) {
        self.fee_rate = fee_rate;
        self.fee_multiplier = (1.0 - fee_rate).powi(3);
    }

    /// Full opportunity calculation, including max trade quantity. Returns
    /// `None` if any leg's BBO is missing or any leg price is non-positive.
    /// Allocation-free: a single cache read lock via `bbos_for_triangle`,
    /// indexed directly into fixed-size arrays.
    pub fn calculate_opportunity(&self, path: &TrianglePath, cache: &BboCache) -> Option<Opportunity> {
        let bbos = cache.bbos_for_triangle(&path.symbols())?;

        let mut prices = [0.0; 3];
        let mut quantities = [0.0; 3];
        for (i, leg) in path.legs.iter().enumerate() {
            let bbo = bbos[i];
            let (price, qty) = match leg.side {
                Side::Buy => (bbo.ask_price, bbo.ask_qty),
                Side::Sell => (bbo.bid_price, bbo.bid_qty),
            };
            if price <= 0.0 {
                return None;
            }
            prices[i] = price;
            quantities[i] = qty;
        }

        let gross_return = gross_return(path, &prices);
        let net_return = gross_return * self.fee_multiplier;
        let profit_pct = (net_return - 1.0) * 100.0;
        let max_trade_qty = max_trade_quantity(path, &prices, &quantities);

        Some(Opportunity {
            path: path.clone(),
            profit_pct,
            gross_return,
            net_return,
            prices,
            quantities,
            max_trade_qty,
            timestamp_us: now_us(),
        })
    }

    /// Cheap pre-filter: same fee composition, skips quantity work.
    pub fn quick_check(&self, path: &TrianglePath, prices: [f64; 3], min_profit_pct: f64) -> bool {
        if prices.iter().any(|p| *p <= 0.0) {
            return false;
        }
        let net_return = gross_return(path, &prices) * self.fee_multiplier;
        (net_return - 1.0) * 100.0 >= min_profit_pct
    }
}

/// `result = 1; for each leg: BUY divides by price, SELL multiplies by price`.
fn gross_return(path: &TrianglePath, prices: &[f64; 3]) -> f64 {
    let mut result = 1.0;
    for (leg, price) in path.legs.iter().zip(prices.iter()) {
        result = match leg.side {
            Side::Buy => result / price,
            Side::Sell => result * price,
        };
    }
    result
}

/// Minimum per-leg quantity, converted forward into base-currency units
/// through the same leg-by-leg composition as `gross_return`, rather than a
/// flat price-times-price approximation.
fn max_trade_quantity(path: &TrianglePath, prices: &[f64; 3], quantities: &[f64; 3]) -> f64 {
    let mut scale = 1.0;
    let mut min_qty = f64::INFINITY;

    for (leg, (price, qty)) in path.legs.iter().zip(prices.iter().zip(quantities.iter())) {
        let qty_in_base_units = match leg.side {
            Side::Buy => (qty * price) / scale,
            Side::Sell => qty / scale,
        };
        min_qty = min_qty.min(qty_in_base_units);

        scale = match leg.side {
            Side::Buy => scale / price,
            Side::Sell => scale * price,
        };
    }

    min_qty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangle::TriangleLeg;
    use smol_str::SmolStr;
    use triarb_data::Bbo;

    fn triangle() -> TrianglePath {
        TrianglePath {
            id: "USDT-BTC-ETH".into(),
            base_asset: "USDT".into(),
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

    fn bbo(bid: f64, bid_qty: f64, ask: f64, ask_qty: f64) -> Bbo {
        Bbo {
            bid_price: bid,
            bid_qty,
            ask_price: ask,
            ask_qty,
            update_id: 1,
            timestamp_us: 0,
        }
    }

    #[test]
    fn profitable_triangle_matches_expected_return() {
        let cache = BboCache::new();
        cache.update("BTCUSDT".into(), bbo(49990.0, 1.0, 50000.0, 1.0));
        cache.update("ETHBTC".into(), bbo(0.0589, 50.0, 0.059, 50.0));
        cache.update("ETHUSDT".into(), bbo(3000.0, 10.0, 3001.0, 10.0));

        let calculator = ProfitCalculator::new(0.001);
        let opportunity = calculator.calculate_opportunity(&triangle(), &cache).unwrap();

        assert!((opportunity.gross_return - 1.01695).abs() < 1e-3);
        assert!((opportunity.net_return - 1.01390).abs() < 1e-3);
        assert!(opportunity.is_profitable());
    }

    #[test]
    fn max_trade_qty_is_bounded_by_the_thinnest_leg_in_base_units() {
        let cache = BboCache::new();
        cache.update("BTCUSDT".into(), bbo(49990.0, 1.0, 50000.0, 1.0));
        cache.update("ETHBTC".into(), bbo(0.0589, 50.0, 0.059, 50.0));
        cache.update("ETHUSDT".into(), bbo(3000.0, 10.0, 3001.0, 10.0));

        let calculator = ProfitCalculator::new(0.001);
        let opportunity = calculator.calculate_opportunity(&triangle(), &cache).unwrap();

        // Leg 3 (selling 10 ETH at 3000 USDT) is the binding constraint.
        assert!((opportunity.max_trade_qty - 29_500.0).abs() < 1.0);
    }

    #[test]
    fn missing_bbo_yields_none() {
        let cache = BboCache::new();
        cache.update("BTCUSDT".into(), bbo(49990.0, 1.0, 50000.0, 1.0));
        let calculator = ProfitCalculator::new(0.001);
        assert!(calculator.calculate_opportunity(&triangle(), &cache).is_none());
    }

    #[test]
    fn zero_price_yields_none() {
        let cache = BboCache::new();
        cache.update("BTCUSDT".into(), bbo(0.0, 1.0, 0.0, 1.0));
        cache.update("ETHBTC".into(), bbo(0.0589, 50.0, 0.059, 50.0));
        cache.update("ETHUSDT".into(), bbo(3000.0, 10.0, 3001.0, 10.0));
        let calculator = ProfitCalculator::new(0.001);
        assert!(calculator.calculate_opportunity(&triangle(), &cache).is_none());
    }
}
