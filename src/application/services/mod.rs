pub mod mutation_coordinator;

pub use mutation_coordinator::{MutationCoordinator, MutationOutcome, RetryPolicy};
