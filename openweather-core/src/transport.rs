use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

use crate::{request::PreparedRequest, response::TransportOutcome};

pub mod http;

pub use http::HttpTransport;

/// Performs the single GET round trip behind every API call.
///
/// Implementations decode the body as JSON and report `Ok(None)` when there
/// is no usable payload. They must not interpret the payload; that is left to
/// [`classify`](crate::response::classify).
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get(&self, request: &PreparedRequest, timeout: Duration) -> TransportOutcome;
}
