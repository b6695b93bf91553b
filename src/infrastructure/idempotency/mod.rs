pub mod uuid_token_source;

pub use uuid_token_source::UuidTokenSource;
