pub mod session_credentials;

pub use session_credentials::{Session, SessionCredentials};
