use async_trait::async_trait;
use log::{debug, trace};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::{error::TransportError, request::PreparedRequest, response::TransportOutcome};

use super::Transport;

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self { http: Client::new() }
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: &PreparedRequest, timeout: Duration) -> TransportOutcome {
        trace!(
            "GET {} params=[{}] timeout={:?}",
            request.url,
            request.params.keys().collect::<Vec<_>>().join(","),
            timeout
        );

        let res = self
            .http
            .get(&request.url)
            .query(&request.params.iter().collect::<Vec<_>>())
            .timeout(timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = res.status();
        let body = res.bytes().await.map_err(transport_error)?;

        debug!("{} answered {} ({} bytes)", request.endpoint, status, body.len());

        Ok(decode_body(&body))
    }
}

fn transport_error(err: reqwest::Error) -> TransportError {
    let code = err.status().map(|s| i64::from(s.as_u16()));
    TransportError { code, message: describe(&err) }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("The request timed out: {err}")
    } else if err.is_connect() {
        format!("Could not connect to the server: {err}")
    } else {
        err.to_string()
    }
}

// Bodies that are empty, not JSON, or JSON `null` carry no payload.
fn decode_body(body: &[u8]) -> Option<Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Null) | Err(_) => None,
        Ok(value) => Some(value),
    }
}
