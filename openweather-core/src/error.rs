use serde_json::Value;
use thiserror::Error;

/// Code reported for arguments rejected before any request is sent.
pub const INVALID_INPUT_CODE: i64 = -1;

/// Message carried by responses that had neither a payload nor an error.
pub const INVALID_DATA_MESSAGE: &str = "Invalid data";

/// Terminal failure of a single API call.
///
/// Every variant has a machine-readable [`code`](WeatherError::code) and a
/// human-readable message (its `Display` output). None of them are retried
/// by the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    /// The caller supplied an empty identifying parameter. No request was sent.
    #[error("invalid input: `{field}` must not be empty")]
    InvalidInput { field: &'static str },

    /// The HTTP round trip itself failed (DNS, connect, timeout, ...).
    #[error("{message}")]
    Transport { code: i64, message: String },

    /// OpenWeatherMap answered with its `{ "message", "cod" }` error shape.
    /// `payload` is the full body as received.
    #[error("{message}")]
    Service { code: i64, message: String, payload: Value },

    /// Neither a payload nor a transport error came back.
    #[error("Invalid data")]
    MalformedResponse,
}

impl WeatherError {
    pub fn code(&self) -> i64 {
        match self {
            WeatherError::InvalidInput { .. } => INVALID_INPUT_CODE,
            WeatherError::Transport { code, .. } | WeatherError::Service { code, .. } => *code,
            WeatherError::MalformedResponse => 0,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Body that accompanied a service error, if any.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            WeatherError::Service { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// True when the caller's input was refused locally, before any request
    /// was built.
    ///
    /// A [`Dispatch::Rejected`](crate::client::Dispatch::Rejected) caused by a
    /// missing Tokio runtime delivers a `Transport` failure instead, for which
    /// this is false.
    pub fn is_rejected_before_send(&self) -> bool {
        matches!(self, WeatherError::InvalidInput { .. })
    }
}

/// Failure reported by a [`Transport`](crate::transport::Transport).
///
/// `code` is whatever numeric code the transport can attach (an HTTP status,
/// for instance); it becomes `0` once classified if absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub code: Option<i64>,
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { code: None, message: message.into() }
    }

    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self { code: Some(code), message: message.into() }
    }
}

impl From<TransportError> for WeatherError {
    fn from(err: TransportError) -> Self {
        WeatherError::Transport { code: err.code.unwrap_or(0), message: err.message }
    }
}
