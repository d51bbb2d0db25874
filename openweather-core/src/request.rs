//! Request construction.
//!
//! Turns an [`Operation`] plus the client's [`ClientConfig`] into a
//! [`PreparedRequest`]: endpoint URL and merged query parameters. Nothing
//! here performs I/O.

use anyhow::Context;
use reqwest::Url;
use std::collections::BTreeMap;

use crate::{config::ClientConfig, error::WeatherError};

pub const ENDPOINT_WEATHER: &str = "weather";
pub const ENDPOINT_FORECAST: &str = "forecast";
pub const ENDPOINT_FORECAST_DAILY: &str = "forecast/daily";
pub const ENDPOINT_FIND: &str = "find";

pub const DEFAULT_MATCH_TYPE: &str = "like";
pub const DEFAULT_SORT_BY: &str = "population";

/// Subject of a weather or forecast query.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// Free-form city name, e.g. `"Rome, IT"`.
    City(String),
    /// OpenWeatherMap city id.
    Id(u64),
    Coordinates { lat: f64, lon: f64 },
}

impl Location {
    pub fn city(name: impl Into<String>) -> Self {
        Location::City(name.into())
    }

    pub fn coordinates(lat: f64, lon: f64) -> Self {
        Location::Coordinates { lat, lon }
    }

    fn params(&self) -> Result<QueryParameters, WeatherError> {
        let params = match self {
            Location::City(name) => QueryParameters::from_pairs([("q", require_name(name)?)]),
            Location::Id(id) => QueryParameters::from_pairs([("id", id.to_string())]),
            Location::Coordinates { lat, lon } => {
                QueryParameters::from_pairs([("lat", lat.to_string()), ("lon", lon.to_string())])
            }
        };
        Ok(params)
    }
}

/// A logical API call.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CurrentWeather(Location),
    Forecast {
        location: Location,
        /// `forecast/daily` when true, the 3-hourly `forecast` otherwise.
        daily: bool,
    },
    SearchCity {
        name: String,
        match_type: String,
        sort_by: String,
    },
}

impl Operation {
    pub fn current_weather(location: Location) -> Self {
        Operation::CurrentWeather(location)
    }

    /// Daily forecast, the service default.
    pub fn forecast(location: Location) -> Self {
        Operation::Forecast { location, daily: true }
    }

    pub fn search_city(name: impl Into<String>) -> Self {
        Operation::SearchCity {
            name: name.into(),
            match_type: DEFAULT_MATCH_TYPE.to_string(),
            sort_by: DEFAULT_SORT_BY.to_string(),
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Operation::CurrentWeather(_) => ENDPOINT_WEATHER,
            Operation::Forecast { daily: true, .. } => ENDPOINT_FORECAST_DAILY,
            Operation::Forecast { daily: false, .. } => ENDPOINT_FORECAST,
            Operation::SearchCity { .. } => ENDPOINT_FIND,
        }
    }

    /// Parameters selecting the subject of the call. Fails on empty names.
    pub fn identifying_params(&self) -> Result<QueryParameters, WeatherError> {
        match self {
            Operation::CurrentWeather(location) | Operation::Forecast { location, .. } => {
                location.params()
            }
            Operation::SearchCity { name, match_type, sort_by } => Ok(QueryParameters::from_pairs([
                ("q", require_name(name)?),
                ("type", match_type.clone()),
                ("sort", sort_by.clone()),
            ])),
        }
    }
}

fn require_name(name: &str) -> Result<String, WeatherError> {
    if name.is_empty() {
        return Err(WeatherError::InvalidInput { field: "city" });
    }
    Ok(name.to_string())
}

/// Query string parameters, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters(BTreeMap<String, String>);

impl QueryParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay `other` on top of `self`; on a shared key `other` wins.
    pub fn merge(mut self, other: QueryParameters) -> Self {
        self.0.extend(other.0);
        self
    }
}

/// Parameters every request carries: `lang`, `APPID` (when a key is
/// configured) and `units` (when non-empty).
pub fn config_params(config: &ClientConfig) -> QueryParameters {
    let mut params = QueryParameters::from_pairs([("lang", config.locale())]);

    if let Some(key) = &config.api_key {
        params.insert("APPID", key.as_str());
    }

    if !config.units.is_empty() {
        params.insert("units", config.units.as_str());
    }

    params
}

/// A GET request ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub endpoint: &'static str,
    /// Base URL joined with the endpoint, without query string.
    pub url: String,
    pub params: QueryParameters,
}

impl PreparedRequest {
    /// Build the request for `op`, or fail with `InvalidInput` before any
    /// network activity.
    pub fn build(op: &Operation, config: &ClientConfig) -> Result<Self, WeatherError> {
        let identifying = op.identifying_params()?;
        let endpoint = op.endpoint();

        // Identifying parameters go last so they can never be overridden.
        let params = config_params(config).merge(identifying);

        Ok(Self {
            endpoint,
            url: format!("{}/{}", config.base_url.trim_end_matches('/'), endpoint),
            params,
        })
    }

    /// The fully encoded URL including the query string.
    pub fn encoded_url(&self) -> anyhow::Result<Url> {
        Url::parse_with_params(&self.url, self.params.iter())
            .with_context(|| format!("Invalid request URL: {}", self.url))
    }
}
