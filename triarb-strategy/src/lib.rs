//! Triangle discovery, profit calculation, and tick-driven opportunity
//! detection: the decision layer between the BBO cache and the risk manager.

pub mod calculator;
pub mod detector;
pub mod discovery;
pub mod error;
pub mod opportunity;
pub mod triangle;

pub use calculator::ProfitCalculator;
pub use detector::{OpportunityCallback, OpportunityDetector};
pub use discovery::TriangleDiscovery;
pub use error::Error;
pub use opportunity::{Opportunity, OpportunityStats};
pub use triangle::{TriangleLeg, TrianglePath};
