//! Typed views over success payloads.
//!
//! Decoding is optional; every call yields the raw JSON first. Fields the
//! service may leave out are `Option` or defaulted.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::WeatherError, response::ResponseOutcome};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One weather condition, e.g. `{ "main": "Rain", "description": "light rain" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    pub temp: f64,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub deg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    #[serde(default)]
    pub all: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub country: Option<String>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub sunrise: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub sunset: Option<DateTime<Utc>>,
}

/// Body of the `weather` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub coord: Option<Coordinates>,
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub main: Measurements,
    pub wind: Option<Wind>,
    pub clouds: Option<Clouds>,
    pub sys: Option<SystemInfo>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub dt: DateTime<Utc>,
}

impl CurrentWeather {
    pub fn from_payload(payload: &Value) -> Result<Self> {
        serde_json::from_value(payload.clone())
            .context("Failed to parse OpenWeather current weather JSON")
    }

    /// Description of the first reported condition.
    pub fn condition(&self) -> Option<&str> {
        self.weather.first().map(|w| w.description.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub country: Option<String>,
    pub coord: Option<Coordinates>,
}

/// Day-part temperatures of a `forecast/daily` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTemperature {
    pub day: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub night: Option<f64>,
    pub eve: Option<f64>,
    pub morn: Option<f64>,
}

/// One forecast step. Three-hourly entries fill `main`/`wind`; daily
/// entries fill `temp` plus the flat `humidity`/`speed` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub dt: DateTime<Utc>,
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub main: Option<Measurements>,
    pub wind: Option<Wind>,
    pub temp: Option<DailyTemperature>,
    pub humidity: Option<f64>,
    pub speed: Option<f64>,
}

impl ForecastEntry {
    /// Representative temperature regardless of the forecast granularity.
    pub fn temperature(&self) -> Option<f64> {
        self.main
            .as_ref()
            .map(|m| m.temp)
            .or_else(|| self.temp.as_ref().map(|t| t.day))
    }
}

/// Body of the `forecast` and `forecast/daily` endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub city: City,
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
}

impl Forecast {
    pub fn from_payload(payload: &Value) -> Result<Self> {
        serde_json::from_value(payload.clone()).context("Failed to parse OpenWeather forecast JSON")
    }
}

/// Body of the `find` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySearch {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub list: Vec<CurrentWeather>,
}

impl CitySearch {
    pub fn from_payload(payload: &Value) -> Result<Self> {
        serde_json::from_value(payload.clone()).context("Failed to parse OpenWeather search JSON")
    }

    /// Decode a `find` outcome.
    ///
    /// The service answers searches with `"message": "like", "cod": "200"`,
    /// which the classifier reports as a service error. A service error with
    /// code 200 is accepted here and its body decoded.
    pub fn from_outcome(outcome: &ResponseOutcome) -> Result<Self> {
        match outcome {
            Ok(payload) => Self::from_payload(payload),
            Err(WeatherError::Service { code: 200, payload, .. }) => Self::from_payload(payload),
            Err(err) => Err(anyhow::Error::new(err.clone()).context("City search failed")),
        }
    }
}
