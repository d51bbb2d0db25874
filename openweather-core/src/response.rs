//! Classification of transport results into [`ResponseOutcome`].

use log::trace;
use serde_json::Value;

use crate::error::{TransportError, WeatherError};

/// What a transport hands back: a decoded JSON payload (`None` when the body
/// was empty or not JSON) or a transport failure.
pub type TransportOutcome = Result<Option<Value>, TransportError>;

/// Terminal result of one API call.
pub type ResponseOutcome = Result<Value, WeatherError>;

/// Normalize a transport result.
///
/// Rules are applied in order, first match wins:
/// 1. transport error -> [`WeatherError::Transport`]
/// 2. payload with string `message` and string `cod` -> [`WeatherError::Service`]
/// 3. any other payload -> success
/// 4. nothing at all -> [`WeatherError::MalformedResponse`]
///
/// Rule 2 also catches a legitimate payload that happens to carry both keys
/// as strings, notably `find` results (`"message": "like", "cod": "200"`).
/// The body stays reachable through [`WeatherError::payload`]. Forecasts send
/// a numeric `"message": 0` and pass through as successes.
pub fn classify(outcome: TransportOutcome) -> ResponseOutcome {
    match outcome {
        Err(err) => {
            trace!("classified as transport error");
            Err(err.into())
        }
        Ok(Some(payload)) => match service_error(&payload) {
            Some(err) => {
                trace!("classified as service error (cod {})", err.code());
                Err(err)
            }
            None => {
                trace!("classified as success");
                Ok(payload)
            }
        },
        Ok(None) => {
            trace!("classified as malformed response");
            Err(WeatherError::MalformedResponse)
        }
    }
}

fn service_error(payload: &Value) -> Option<WeatherError> {
    let message = payload.get("message")?.as_str()?;
    let cod = payload.get("cod")?.as_str()?;

    Some(WeatherError::Service {
        code: cod.trim().parse().unwrap_or(0),
        message: message.to_string(),
        payload: payload.clone(),
    })
}
