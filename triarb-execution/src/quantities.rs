use triarb_integration::Side;
use triarb_strategy::TrianglePath;

/// Composes the three order quantities needed to trade `size` units of the
/// triangle's base asset through every leg, given the quoted `prices`.
///
/// Each leg's order quantity is always expressed in units of that leg's base
/// asset, matching exchange market-order semantics: a `Buy` spends the
/// incoming (quote) amount to acquire `incoming / price` units of base; a
/// `Sell` spends the incoming (base) amount directly. The amount carried
/// forward into the next leg is the amount of the next leg's `from_asset`
/// actually received: for a `Buy` that's the base just acquired (equal to
/// the order quantity); for a `Sell` it's the quote proceeds (`order_qty *
/// price`), which differs from the order quantity itself.
pub fn leg_quantities(path: &TrianglePath, prices: &[f64; 3], size: f64) -> [f64; 3] {
    let mut incoming = size;
    let mut quantities = [0.0; 3];

    for (i, (leg, price)) in path.legs.iter().zip(prices.iter()).enumerate() {
        let order_qty = match leg.side {
            Side::Buy => incoming / price,
            Side::Sell => incoming,
        };
        quantities[i] = order_qty;

        incoming = match leg.side {
            Side::Buy => order_qty,
            Side::Sell => order_qty * price,
        };
    }

    quantities
}

#[cfg(test)]
mod tests {
    use super::*;
    use smol_str::SmolStr;
    use triarb_strategy::TriangleLeg;

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

    #[test]
    fn each_leg_quantity_is_in_that_legs_base_asset_units() {
        let prices = [50_000.0, 0.059, 3001.0];
        let quantities = leg_quantities(&triangle(), &prices, 1_000.0);

        // Leg 0 BUY: spend 1000 USDT at 50000 -> 0.02 BTC.
        assert!((quantities[0] - 1_000.0 / 50_000.0).abs() < 1e-9);
        // Leg 1 BUY: spend the 0.02 BTC at 0.059 -> 0.339... ETH.
        let btc = quantities[0];
        assert!((quantities[1] - btc / 0.059).abs() < 1e-9);
        // Leg 2 SELL: sell all the ETH just acquired, quantity == holding.
        assert!((quantities[2] - quantities[1]).abs() < 1e-9);
    }
}
