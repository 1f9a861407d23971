//! HTTP transport used by provider networks.

mod client;
mod retry;
mod transport;

pub use client::{HttpClient, HttpClientBuilder, HttpClientConfig};
pub use retry::BackoffPolicy;
pub use transport::{HttpTransport, Transport, TransportResponse};
