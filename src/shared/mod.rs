pub mod config;
pub mod error;
pub mod metrics;

pub use config::EngineConfig;
pub use error::{AppError, MutationError, Result, TransportError};
