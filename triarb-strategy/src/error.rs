use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("base asset '{0}' has no tradeable pairs")]
    UnknownBaseAsset(String),
}
