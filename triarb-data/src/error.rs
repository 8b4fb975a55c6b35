use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed tick for '{symbol}': {reason}")]
    MalformedTick { symbol: String, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] triarb_integration::Error),
}
