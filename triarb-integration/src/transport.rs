use crate::error::Error;
use async_trait::async_trait;
use futures::Stream;
use serde::Deserialize;
use smol_str::SmolStr;
use std::pin::Pin;

/// Order side.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

/// Order time-in-force, for limit orders.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TimeInForce {
    GoodTillCancel,
    ImmediateOrCancel,
    FillOrKill,
}

/// Lifecycle status of an order as reported by the exchange.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OrderStatus {
    Filled,
    PartiallyFilled,
    Canceled,
    Rejected,
    Expired,
}

impl OrderStatus {
    pub fn is_filled(self) -> bool {
        matches!(self, OrderStatus::Filled)
    }
}

/// One fill within an order's execution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub price: f64,
    pub qty: f64,
    pub commission: f64,
}

/// Response to a placed order, per the exchange transport contract.
#[derive(Debug, Clone)]
pub struct OrderResponse {
    pub order_id: String,
    pub client_order_id: String,
    pub status: OrderStatus,
    pub executed_qty: f64,
    pub cumulative_quote_qty: f64,
    pub commission_asset: String,
    pub fills: Vec<Fill>,
}

impl OrderResponse {
    /// `avg_fill_price = Σ(price·qty)/Σ(qty)` over fills; `None` if nothing filled.
    pub fn avg_fill_price(&self) -> Option<f64> {
        let total_qty: f64 = self.fills.iter().map(|f| f.qty).sum();
        if total_qty <= 0.0 {
            return None;
        }
        let weighted: f64 = self.fills.iter().map(|f| f.price * f.qty).sum();
        Some(weighted / total_qty)
    }

    pub fn total_commission(&self) -> f64 {
        self.fills.iter().map(|f| f.commission).sum()
    }
}

/// Exchange-reported metadata for one tradeable pair, as returned by
/// `get_exchange_info`. The symbol catalog (`triarb-instrument`) turns this raw
/// DTO into a validated, read-only `SymbolInfo`.
#[derive(Debug, Clone)]
pub struct SymbolMetadata {
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub price_precision: u32,
    pub quantity_precision: u32,
    pub min_notional: f64,
    pub min_qty: f64,
    pub max_qty: f64,
    pub step_size: f64,
    pub tick_size: f64,
    pub trading: bool,
}

#[derive(Debug, Clone)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolMetadata>,
}

/// A single push-stream message, in the exchange's wire shape: `{s, b, B, a, A, u}`.
/// Kept as strings/integers exactly as specified; callers convert to a `BBO`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTick {
    pub s: String,
    pub b: String,
    #[serde(rename = "B")]
    pub bid_qty: String,
    pub a: String,
    #[serde(rename = "A")]
    pub ask_qty: String,
    pub u: u64,
}

pub type TickStream = Pin<Box<dyn Stream<Item = Result<RawTick, Error>> + Send>>;

/// Capability set consumed from a concrete exchange integration. No production
/// implementation lives in this workspace — wiring a real exchange's REST and
/// websocket transport behind this trait is an external integration concern.
#[async_trait]
pub trait ExchangeTransport: Send + Sync {
    async fn get_exchange_info(&self) -> Result<ExchangeInfo, Error>;

    async fn get_balance(&self, asset: &str) -> Result<f64, Error>;

    async fn place_market_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: f64,
    ) -> Result<OrderResponse, Error>;

    async fn place_limit_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: f64,
        price: f64,
        tif: TimeInForce,
    ) -> Result<OrderResponse, Error>;

    async fn cancel_order(&self, symbol: &str, order_id: &str) -> Result<(), Error>;

    async fn subscribe_ticks(&self, symbols: Vec<SmolStr>) -> Result<TickStream, Error>;
}
