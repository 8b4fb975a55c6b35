//! Low-level primitives shared across the Triarb workspace: a microsecond clock,
//! the HMAC request signer, the composed token-bucket rate limiter, and the
//! `ExchangeTransport` contract consumed by everything downstream.

pub mod error;
pub mod rate_limit;
pub mod signer;
pub mod time;
pub mod transport;

pub use error::Error;
pub use rate_limit::{RateLimiter, TokenBucket};
pub use signer::{HmacSha256Signer, Signer, build_signed_query};
pub use transport::{
    ExchangeInfo, ExchangeTransport, Fill, OrderResponse, OrderStatus, RawTick, Side,
    SymbolMetadata, TickStream, TimeInForce,
};
