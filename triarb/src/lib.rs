//! Configuration, logging, and engine wiring for the triangular arbitrage
//! binary: everything the `triarb` executable needs beyond the library
//! crates it composes.

pub mod config;
pub mod demo_transport;
pub mod engine;
pub mod error;
pub mod logging;

pub use config::{Config, Credentials};
pub use demo_transport::DemoTransport;
pub use engine::Engine;
pub use error::ConfigError;
pub use logging::init_logging;
