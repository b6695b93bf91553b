pub mod core;
mod ledger;
pub mod retry;

pub use self::core::{MutationCoordinator, MutationOutcome};
pub use retry::RetryPolicy;
