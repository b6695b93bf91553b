pub mod query_fetcher;
pub mod transport;

pub use query_fetcher::HttpQueryFetcher;
pub use transport::HttpTransport;
