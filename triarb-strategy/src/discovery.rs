use crate::triangle::{TriangleLeg, TrianglePath};
use fnv::FnvHashMap;
use smol_str::SmolStr;
use std::collections::HashSet;
use tracing::info;
use triarb_instrument::SymbolCatalog;
use triarb_integration::Side;

#[derive(Debug, Clone, Copy)]
struct Edge<'a> {
    symbol: &'a SmolStr,
    side: Side,
}

/// Builds a directed asset graph from a symbol catalog and enumerates
/// simple three-asset cycles through a chosen base asset.
pub struct TriangleDiscovery {
    adjacency: FnvHashMap<SmolStr, Vec<SmolStr>>,
    edges: FnvHashMap<(SmolStr, SmolStr), (SmolStr, Side)>,
}

impl TriangleDiscovery {
    /// Builds the graph: for every tradeable `(base, quote)` pair, an edge
    /// `quote -> base` (BUY) and `base -> quote` (SELL).
    pub fn from_catalog(catalog: &SymbolCatalog) -> Self {
        let mut adjacency: FnvHashMap<SmolStr, Vec<SmolStr>> = FnvHashMap::default();
        let mut edges: FnvHashMap<(SmolStr, SmolStr), (SmolStr, Side)> = FnvHashMap::default();

        for info in catalog.iter() {
            if !info.is_trading() {
                continue;
            }
            let base = info.base_asset.clone();
            let quote = info.quote_asset.clone();

            adjacency.entry(quote.clone()).or_default().push(base.clone());
            edges.insert((quote.clone(), base.clone()), (info.symbol.clone(), Side::Buy));

            adjacency.entry(base.clone()).or_default().push(quote.clone());
            edges.insert((base, quote), (info.symbol.clone(), Side::Sell));
        }

        info!(
            assets = adjacency.len(),
            edges = edges.len(),
            "built triangle discovery graph"
        );

        Self { adjacency, edges }
    }

    fn neighbors(&self, asset: &str) -> &[SmolStr] {
        self.adjacency.get(asset).map(Vec::as_slice).unwrap_or(&[])
    }

    fn edge(&self, from: &str, to: &str) -> Option<Edge<'_>> {
        self.edges
            .get(&(SmolStr::new(from), SmolStr::new(to)))
            .map(|(symbol, side)| Edge { symbol, side: *side })
    }

    /// Enumerates simple three-asset cycles `base -> m1 -> m2 -> base`,
    /// deduplicating by the unordered middle pair `{m1, m2}`, capped at
    /// `max_triangles`.
    pub fn find_triangles(&self, base_asset: &str, max_triangles: usize) -> Vec<TrianglePath> {
        let mut triangles = Vec::new();
        let mut seen_pairs: HashSet<(SmolStr, SmolStr)> = HashSet::new();

        'outer: for first_hop in self.neighbors(base_asset) {
            if triangles.len() >= max_triangles {
                break;
            }
            if first_hop.as_str() == base_asset {
                continue;
            }

            for second_hop in self.neighbors(first_hop) {
                if triangles.len() >= max_triangles {
                    break 'outer;
                }
                if second_hop.as_str() == base_asset || second_hop == first_hop {
                    continue;
                }
                if self.edge(second_hop, base_asset).is_none() {
                    continue;
                }

                let pair_key = unordered_pair(first_hop, second_hop);
                if !seen_pairs.insert(pair_key) {
                    continue;
                }

                if let Some(triangle) = self.build_triangle(base_asset, first_hop, second_hop) {
                    triangles.push(triangle);
                }
            }
        }

        info!(
            base_asset,
            count = triangles.len(),
            "discovered triangular paths"
        );

        triangles
    }

    fn build_triangle(&self, base: &str, mid1: &str, mid2: &str) -> Option<TrianglePath> {
        let edge1 = self.edge(base, mid1)?;
        let edge2 = self.edge(mid1, mid2)?;
        let edge3 = self.edge(mid2, base)?;

        let legs = [
            TriangleLeg {
                symbol: edge1.symbol.clone(),
                side: edge1.side,
                from_asset: SmolStr::new(base),
                to_asset: SmolStr::new(mid1),
            },
            TriangleLeg {
                symbol: edge2.symbol.clone(),
                side: edge2.side,
                from_asset: SmolStr::new(mid1),
                to_asset: SmolStr::new(mid2),
            },
            TriangleLeg {
                symbol: edge3.symbol.clone(),
                side: edge3.side,
                from_asset: SmolStr::new(mid2),
                to_asset: SmolStr::new(base),
            },
        ];

        Some(TrianglePath {
            id: SmolStr::new(format!("{base}-{mid1}-{mid2}")),
            base_asset: SmolStr::new(base),
            legs,
        })
    }
}

fn unordered_pair(a: &str, b: &str) -> (SmolStr, SmolStr) {
    if a <= b {
        (SmolStr::new(a), SmolStr::new(b))
    } else {
        (SmolStr::new(b), SmolStr::new(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triarb_integration::{ExchangeInfo, SymbolMetadata};

    fn metadata(symbol: &str, base: &str, quote: &str) -> SymbolMetadata {
        SymbolMetadata {
            symbol: symbol.to_string(),
            base_asset: base.to_string(),
            quote_asset: quote.to_string(),
            price_precision: 2,
            quantity_precision: 6,
            min_notional: 10.0,
            min_qty: 0.0001,
            max_qty: 1000.0,
            step_size: 0.0001,
            tick_size: 0.01,
            trading: true,
        }
    }

    fn catalog() -> SymbolCatalog {
        let info = ExchangeInfo {
            symbols: vec![
                metadata("BTCUSDT", "BTC", "USDT"),
                metadata("ETHBTC", "ETH", "BTC"),
                metadata("ETHUSDT", "ETH", "USDT"),
            ],
        };
        let quotes = vec![SmolStr::new("USDT"), SmolStr::new("BTC")];
        SymbolCatalog::from_exchange_info(&info, &quotes)
    }

    #[test]
    fn finds_the_usdt_btc_eth_triangle() {
        let discovery = TriangleDiscovery::from_catalog(&catalog());
        let triangles = discovery.find_triangles("USDT", 100);
        assert_eq!(triangles.len(), 1);
        let triangle = &triangles[0];
        assert_eq!(triangle.legs[0].from_asset.as_str(), "USDT");
        assert_eq!(triangle.legs[2].to_asset.as_str(), "USDT");
    }

    #[test]
    fn caps_results_at_max_triangles() {
        let discovery = TriangleDiscovery::from_catalog(&catalog());
        let triangles = discovery.find_triangles("USDT", 0);
        assert!(triangles.is_empty());
    }

    #[test]
    fn unknown_base_asset_yields_no_triangles() {
        let discovery = TriangleDiscovery::from_catalog(&catalog());
        assert!(discovery.find_triangles("DOGE", 100).is_empty());
    }
}
