use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("symbol '{0}' not found in catalog")]
    UnknownSymbol(String),

    #[error("no direct trading pair between '{0}' and '{1}'")]
    NoDirectPair(String, String),
}
