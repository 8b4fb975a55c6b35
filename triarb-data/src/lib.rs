//! The BBO cache and reconnecting stream ingestor: the boundary between raw
//! exchange ticks and everything downstream that reasons about prices.

pub mod bbo;
pub mod cache;
pub mod error;
pub mod ingestor;

pub use bbo::Bbo;
pub use cache::{BboCache, Callback};
pub use error::Error;
pub use ingestor::{ConnectionState, ReconnectPolicy, StreamIngestor};
