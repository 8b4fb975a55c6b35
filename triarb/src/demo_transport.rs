use async_trait::async_trait;
use fnv::FnvHashMap;
use parking_lot::Mutex;
use rand::Rng;
use smol_str::SmolStr;
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use triarb_integration::{
    Error, ExchangeInfo, ExchangeTransport, Fill, OrderResponse, OrderStatus, RawTick, Side,
    SymbolMetadata, TickStream, TimeInForce,
};

const TICK_INTERVAL: std::time::Duration = std::time::Duration::from_millis(200);
const DEMO_FEE_RATE: f64 = 0.001;
const DEMO_STARTING_BALANCE: f64 = 10_000.0;

struct DemoSymbol {
    metadata: SymbolMetadata,
    seed_price: f64,
}

fn demo_universe() -> Vec<DemoSymbol> {
    vec![
        DemoSymbol {
            metadata: metadata("BTCUSDT", "BTC", "USDT"),
            seed_price: 60_000.0,
        },
        DemoSymbol {
            metadata: metadata("ETHUSDT", "ETH", "USDT"),
            seed_price: 3_000.0,
        },
        DemoSymbol {
            metadata: metadata("ETHBTC", "ETH", "BTC"),
            seed_price: 0.05,
        },
    ]
}

fn metadata(symbol: &str, base: &str, quote: &str) -> SymbolMetadata {
    SymbolMetadata {
        symbol: symbol.to_string(),
        base_asset: base.to_string(),
        quote_asset: quote.to_string(),
        price_precision: 8,
        quantity_precision: 6,
        min_notional: 10.0,
        min_qty: 0.000_001,
        max_qty: 10_000.0,
        step_size: 0.000_001,
        tick_size: 0.000_01,
        trading: true,
    }
}

/// Synthetic `ExchangeTransport` that walks a handful of prices at random
/// and fills every order immediately at the last synthetic price. This is
/// not a production exchange integration — it exists so the binary can run
/// end to end without any real credentials or network access, for local
/// experimentation and demos only.
pub struct DemoTransport {
    prices: Arc<Mutex<FnvHashMap<SmolStr, f64>>>,
    next_order_id: Mutex<u64>,
}

impl DemoTransport {
    pub fn new() -> Self {
        let prices = demo_universe()
            .into_iter()
            .map(|s| (SmolStr::new(&s.metadata.symbol), s.seed_price))
            .collect();
        Self {
            prices: Arc::new(Mutex::new(prices)),
            next_order_id: Mutex::new(0),
        }
    }

    fn next_id(&self) -> String {
        let mut guard = self.next_order_id.lock();
        *guard += 1;
        guard.to_string()
    }
}

impl Default for DemoTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeTransport for DemoTransport {
    async fn get_exchange_info(&self) -> Result<ExchangeInfo, Error> {
        Ok(ExchangeInfo {
            symbols: demo_universe().into_iter().map(|s| s.metadata).collect(),
        })
    }

    async fn get_balance(&self, _asset: &str) -> Result<f64, Error> {
        Ok(DEMO_STARTING_BALANCE)
    }

    async fn place_market_order(&self, symbol: &str, side: Side, quantity: f64) -> Result<OrderResponse, Error> {
        let price = self.prices.lock().get(symbol).copied().ok_or_else(|| Error::Transport {
            operation: "place_market_order",
            message: format!("unknown demo symbol '{symbol}'"),
        })?;

        let quote_qty = quantity * price;
        let commission = quote_qty * DEMO_FEE_RATE;

        Ok(OrderResponse {
            order_id: self.next_id(),
            client_order_id: format!("demo-{symbol}-{side:?}"),
            status: OrderStatus::Filled,
            executed_qty: quantity,
            cumulative_quote_qty: quote_qty,
            commission_asset: "DEMO".to_string(),
            fills: vec![Fill { price, qty: quantity, commission }],
        })
    }

    async fn place_limit_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: f64,
        price: f64,
        _tif: TimeInForce,
    ) -> Result<OrderResponse, Error> {
        if !self.prices.lock().contains_key(symbol) {
            return Err(Error::Transport {
                operation: "place_limit_order",
                message: format!("unknown demo symbol '{symbol}'"),
            });
        }

        let quote_qty = quantity * price;
        let commission = quote_qty * DEMO_FEE_RATE;

        Ok(OrderResponse {
            order_id: self.next_id(),
            client_order_id: format!("demo-limit-{symbol}-{side:?}"),
            status: OrderStatus::Filled,
            executed_qty: quantity,
            cumulative_quote_qty: quote_qty,
            commission_asset: "DEMO".to_string(),
            fills: vec![Fill { price, qty: quantity, commission }],
        })
    }

    async fn cancel_order(&self, _symbol: &str, _order_id: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn subscribe_ticks(&self, symbols: Vec<SmolStr>) -> Result<TickStream, Error> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let prices = self.prices.clone();
        let mut update_counter: u64 = 0;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            let mut rng = rand::rng();
            loop {
                interval.tick().await;
                for symbol in &symbols {
                    let Some(new_price) = walk_price(&prices, symbol, &mut rng) else {
                        continue;
                    };
                    update_counter += 1;
                    let spread = new_price * 0.0005;
                    let tick = RawTick {
                        s: symbol.to_string(),
                        b: format!("{:.8}", new_price - spread),
                        bid_qty: "1.0".to_string(),
                        a: format!("{:.8}", new_price + spread),
                        ask_qty: "1.0".to_string(),
                        u: update_counter,
                    };
                    if tx.send(Ok(tick)).is_err() {
                        return;
                    }
                }
            }
        });

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}

fn walk_price(prices: &Arc<Mutex<FnvHashMap<SmolStr, f64>>>, symbol: &SmolStr, rng: &mut impl Rng) -> Option<f64> {
    let mut guard = prices.lock();
    let price = guard.get_mut(symbol)?;
    let drift = rng.random_range(-0.0008..0.0008);
    *price *= 1.0 + drift;
    Some(*price)
}
