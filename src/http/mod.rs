//! HTTP client for talking to the remote API
//!
//! Streams never build their own clients; the run context constructs one
//! from config and hands it out. The client handles retries with
//! exponential backoff, `Retry-After` on 429s, client-side rate limiting,
//! and bearer authentication.

mod client;
mod rate_limit;

pub use client::{HttpClient, RequestConfig};
pub use rate_limit::RateLimiter;

#[cfg(test)]
mod tests;
