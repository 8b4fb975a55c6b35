use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot resume: risk manager is not halted")]
    NotHalted,
}
