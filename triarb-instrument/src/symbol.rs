use smol_str::SmolStr;

/// Exchange-side trading status for a symbol. Only `Trading` symbols are
/// eligible for the catalog; everything else is filtered out at load time.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SymbolStatus {
    Trading,
    Halted,
}

/// Read-only, validated trading-pair metadata, built once at startup from
/// exchange metadata and never mutated thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolInfo {
    pub symbol: SmolStr,
    pub base_asset: SmolStr,
    pub quote_asset: SmolStr,
    pub price_precision: u32,
    pub quantity_precision: u32,
    pub min_notional: f64,
    pub min_qty: f64,
    pub max_qty: f64,
    pub step_size: f64,
    pub tick_size: f64,
    pub status: SymbolStatus,
}

impl SymbolInfo {
    /// Rounds a price to the nearest tick: `round(p / tick) * tick`.
    pub fn round_price(&self, price: f64) -> f64 {
        round_to_step(price, self.tick_size)
    }

    /// Rounds a quantity down to the nearest step: `floor(q / step) * step`.
    pub fn round_quantity(&self, quantity: f64) -> f64 {
        floor_to_step(quantity, self.step_size)
    }

    pub fn is_trading(&self) -> bool {
        self.status == SymbolStatus::Trading
    }
}

fn round_to_step(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}

fn floor_to_step(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    (value / step).floor() * step
}
