//! Concurrent three-leg order dispatch, post-trade accounting, and
//! stranded-position recovery: the layer that turns an `Opportunity` into
//! exchange orders and reconciles whatever actually filled.

pub mod error;
pub mod executor;
#[cfg(test)]
pub(crate) mod mock;
pub mod quantities;
pub mod recovery;
pub mod types;

pub use error::Error;
pub use executor::{ExecutorConfig, TriangleExecutor};
pub use quantities::leg_quantities;
pub use recovery::{Recovery, RecoveryAction, RecoveryResult};
pub use types::{ExecutionResult, ExecutionStatus, LegResult};
