//! Utility modules supporting lookup and download operations.
//!
//! - [`HttpClient`]: shared HTTP client with timeouts and a fixed user agent
//! - [`RetryPolicy`]: bounded retry with a linearly increasing backoff schedule

mod http;
mod retry;

pub use http::HttpClient;
pub use retry::RetryPolicy;
