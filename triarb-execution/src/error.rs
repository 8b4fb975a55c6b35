use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no direct or reversed pair exists between '{asset}' and '{base}'")]
    NoLiquidationPair { asset: String, base: String },

    #[error(transparent)]
    Transport(#[from] triarb_integration::Error),
}
