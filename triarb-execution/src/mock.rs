use async_trait::async_trait;
use parking_lot::Mutex;
use smol_str::SmolStr;
use std::collections::HashSet;
use triarb_integration::{
    Error, ExchangeInfo, ExchangeTransport, Fill, OrderResponse, OrderStatus, Side, TickStream,
    TimeInForce,
};

/// In-memory `ExchangeTransport` double for executor and recovery tests.
/// Fills every order at a fixed price unless the symbol has been marked to
/// fail via `fail_leg`.
pub struct MockTransport {
    failing_symbols: Mutex<HashSet<SmolStr>>,
    next_order_id: Mutex<u64>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            failing_symbols: Mutex::new(HashSet::new()),
            next_order_id: Mutex::new(0),
        }
    }

    pub fn fail_leg(&self, symbol: &str) {
        self.failing_symbols.lock().insert(SmolStr::new(symbol));
    }

    fn next_id(&self) -> String {
        let mut guard = self.next_order_id.lock();
        *guard += 1;
        guard.to_string()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeTransport for MockTransport {
    async fn get_exchange_info(&self) -> Result<ExchangeInfo, Error> {
        Ok(ExchangeInfo { symbols: Vec::new() })
    }

    async fn get_balance(&self, _asset: &str) -> Result<f64, Error> {
        Ok(0.0)
    }

    async fn place_market_order(&self, symbol: &str, _side: Side, quantity: f64) -> Result<OrderResponse, Error> {
        if self.failing_symbols.lock().contains(symbol) {
            return Err(Error::Transport {
                operation: "place_market_order",
                message: format!("{symbol} is configured to fail in this test"),
            });
        }

        let price = 1.0;
        let commission = quantity * price * 0.001;

        Ok(OrderResponse {
            order_id: self.next_id(),
            client_order_id: format!("mock-{symbol}"),
            status: OrderStatus::Filled,
            executed_qty: quantity,
            cumulative_quote_qty: quantity * price,
            commission_asset: "MOCK".to_string(),
            fills: vec![Fill { price, qty: quantity, commission }],
        })
    }

    async fn place_limit_order(
        &self,
        symbol: &str,
        _side: Side,
        quantity: f64,
        price: f64,
        _tif: TimeInForce,
    ) -> Result<OrderResponse, Error> {
        if self.failing_symbols.lock().contains(symbol) {
            return Err(Error::Transport {
                operation: "place_limit_order",
                message: format!("{symbol} is configured to fail in this test"),
            });
        }

        let commission = quantity * price * 0.001;

        Ok(OrderResponse {
            order_id: self.next_id(),
            client_order_id: format!("mock-limit-{symbol}"),
            status: OrderStatus::Filled,
            executed_qty: quantity,
            cumulative_quote_qty: quantity * price,
            commission_asset: "MOCK".to_string(),
            fills: vec![Fill { price, qty: quantity, commission }],
        })
    }

    async fn cancel_order(&self, _symbol: &str, _order_id: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn subscribe_ticks(&self, _symbols: Vec<SmolStr>) -> Result<TickStream, Error> {
        unimplemented!("mock transport does not serve a tick stream")
    }
}
