//! Tradeable-pair metadata: the symbol catalog, tick/step rounding, and the
//! base/quote indexes other Triarb components query on the hot path.

pub mod catalog;
pub mod error;
pub mod symbol;

pub use catalog::SymbolCatalog;
pub use error::Error;
pub use symbol::{SymbolInfo, SymbolStatus};
