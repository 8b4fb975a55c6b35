use crate::symbol::{SymbolInfo, SymbolStatus};
use fnv::FnvHashMap;
use smol_str::SmolStr;
use std::collections::HashSet;
use triarb_integration::{ExchangeInfo, SymbolMetadata};

/// Tradeable-pair metadata for every symbol accepted from exchange info,
/// indexed by symbol, base asset, and quote asset. Built once at startup and
/// treated as read-only thereafter.
#[derive(Debug, Default)]
pub struct SymbolCatalog {
    symbols: FnvHashMap<SmolStr, SymbolInfo>,
    by_base: FnvHashMap<SmolStr, Vec<SmolStr>>,
    by_quote: FnvHashMap<SmolStr, Vec<SmolStr>>,
    pairs: HashSet<(SmolStr, SmolStr)>,
}

impl SymbolCatalog {
    /// Builds a catalog from raw exchange info, keeping only `TRADING` symbols
    /// whose quote asset is in `quote_assets`.
    pub fn from_exchange_info(info: &ExchangeInfo, quote_assets: &[SmolStr]) -> Self {
        let mut catalog = Self::default();
        for metadata in &info.symbols {
            if !metadata.trading {
                continue;
            }
            if !quote_assets.iter().any(|q| q.as_str() == metadata.quote_asset) {
                continue;
            }
            catalog.insert(symbol_info_from_metadata(metadata));
        }
        catalog
    }

    fn insert(&mut self, info: SymbolInfo) {
        self.by_base
            .entry(info.base_asset.clone())
            .or_default()
            .push(info.symbol.clone());
        self.by_quote
            .entry(info.quote_asset.clone())
            .or_default()
            .push(info.symbol.clone());
        self.pairs
            .insert((info.base_asset.clone(), info.quote_asset.clone()));
        self.symbols.insert(info.symbol.clone(), info);
    }

    pub fn get(&self, symbol: &str) -> Option<&SymbolInfo> {
        self.symbols.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    pub fn symbols_by_base(&self, base_asset: &str) -> &[SmolStr] {
        self.by_base.get(base_asset).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn symbols_by_quote(&self, quote_asset: &str) -> &[SmolStr] {
        self.by_quote.get(quote_asset).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Finds the symbol name for a `(base, quote)` pair using the exchange's
    /// concatenated naming convention (e.g. `BTC` + `USDT` -> `BTCUSDT`).
    pub fn find_symbol(&self, base: &str, quote: &str) -> Option<&SmolStr> {
        let candidate = format!("{base}{quote}");
        self.symbols.get(candidate.as_str()).map(|info| &info.symbol)
    }

    pub fn has_pair(&self, base: &str, quote: &str) -> bool {
        self.pairs.contains(&(SmolStr::new(base), SmolStr::new(quote)))
    }

    pub fn all_bases(&self) -> HashSet<&SmolStr> {
        self.by_base.keys().collect()
    }

    pub fn all_quotes(&self) -> HashSet<&SmolStr> {
        self.by_quote.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolInfo> {
        self.symbols.values()
    }
}

fn symbol_info_from_metadata(metadata: &SymbolMetadata) -> SymbolInfo {
    SymbolInfo {
        symbol: SmolStr::new(&metadata.symbol),
        base_asset: SmolStr::new(&metadata.base_asset),
        quote_asset: SmolStr::new(&metadata.quote_asset),
        price_precision: metadata.price_precision,
        quantity_precision: metadata.quantity_precision,
        min_notional: metadata.min_notional,
        min_qty: metadata.min_qty,
        max_qty: metadata.max_qty,
        step_size: metadata.step_size,
        tick_size: metadata.tick_size,
        status: if metadata.trading {
            SymbolStatus::Trading
        } else {
            SymbolStatus::Halted
        },
    }
}
