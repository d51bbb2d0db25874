//! Client library for the OpenWeatherMap 2.5 REST API.
//!
//! This crate defines:
//! - Client configuration (API key, units, locale, timeout)
//! - Request construction for the `weather`, `forecast`, `forecast/daily`
//!   and `find` endpoints
//! - Classification of responses into a single success/failure outcome
//! - The transport seam, with a `reqwest` implementation
//! - Optional typed models for success payloads
//!
//! ```no_run
//! # async fn demo() {
//! use openweather_core::OpenWeather;
//!
//! let client = OpenWeather::new(Some("API_KEY".to_string()));
//! match client.current_weather_by_city("Rome, IT").await {
//!     Ok(payload) => println!("{}", payload["name"]),
//!     Err(err) => eprintln!("error {}: {err}", err.code()),
//! }
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{Dispatch, OpenWeather, RequestHandle};
pub use config::{ClientConfig, Units};
pub use error::{TransportError, WeatherError};
pub use model::{CitySearch, CurrentWeather, Forecast};
pub use request::{Location, Operation, PreparedRequest, QueryParameters};
pub use response::{ResponseOutcome, TransportOutcome, classify};
pub use transport::{HttpTransport, Transport};
