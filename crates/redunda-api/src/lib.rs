// redunda-api: Async Rust client for the Redunda bot coordination service

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::RedundaClient;
pub use error::Error;
pub use models::{RemoteFile, StatusReport};
pub use transport::{DEFAULT_ENDPOINT, TransportConfig, user_agent};
