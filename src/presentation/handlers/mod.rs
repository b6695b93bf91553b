pub mod mutation_handler;

pub use mutation_handler::MutationHandler;
