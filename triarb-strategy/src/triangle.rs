use smol_str::SmolStr;
use std::collections::HashSet;
use triarb_integration::Side;

/// One leg of a triangle: the pair traded and the direction the cycle moves
/// through it. `side == Buy` spends `from_asset` (the quote) to acquire
/// `to_asset` (the base); `side == Sell` spends the base to acquire the quote.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleLeg {
    pub symbol: SmolStr,
    pub side: Side,
    pub from_asset: SmolStr,
    pub to_asset: SmolStr,
}

/// An immutable three-leg cycle `base -> m1 -> m2 -> base`, built once at
/// discovery time. `id` uniquely identifies the cycle for cooldown tracking
/// and is derived from the three assets in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrianglePath {
    pub id: SmolStr,
    pub base_asset: SmolStr,
    pub legs: [TriangleLeg; 3],
}

impl TrianglePath {
    pub fn symbols(&self) -> [SmolStr; 3] {
        [
            self.legs[0].symbol.clone(),
            self.legs[1].symbol.clone(),
            self.legs[2].symbol.clone(),
        ]
    }

    pub fn symbol_set(&self) -> HashSet<SmolStr> {
        self.symbols().into_iter().collect()
    }
}
