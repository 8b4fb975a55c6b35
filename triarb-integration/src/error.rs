use thiserror::Error;

/// Errors surfaced by the low-level integration primitives: signing, rate limiting,
/// and the `ExchangeTransport` boundary.
#[derive(Debug, Error)]
pub enum Error {
    #[error("rate limit denied: requested {requested} tokens, bucket '{bucket}' holds {available:.2}")]
    RateLimitDenied {
        bucket: &'static str,
        requested: u32,
        available: f64,
    },

    #[error("transport error calling '{operation}': {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("signer misconfigured: {0}")]
    Signer(String),
}
