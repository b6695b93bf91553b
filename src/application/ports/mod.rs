pub mod credentials;
pub mod query_fetcher;
pub mod token_source;
pub mod transport;

pub use credentials::CredentialProvider;
pub use query_fetcher::QueryFetcher;
pub use token_source::IdempotencyTokenSource;
pub use transport::{ApiRequest, HttpMethod, Transport};
