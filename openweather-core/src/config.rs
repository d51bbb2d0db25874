use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

/// Base URL of the OpenWeatherMap 2.5 API.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

pub const DEFAULT_UNITS: &str = "metric";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Language used when the environment does not name one.
pub const FALLBACK_LOCALE: &str = "en";

/// Unit systems understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Units {
    /// Kelvin, meters/sec.
    Standard,
    /// Celsius, meters/sec.
    Metric,
    /// Fahrenheit, miles/hour.
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Standard => "standard",
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Units> for String {
    fn from(units: Units) -> Self {
        units.as_str().to_string()
    }
}

/// Per-client configuration.
///
/// Example TOML, as an embedding application might store it:
/// ```toml
/// api_key = "..."
/// units = "imperial"
/// locale = "it"
/// timeout = 5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_key: Option<String>,

    /// Sent as-is; an empty string omits the `units` parameter.
    pub units: String,

    /// Explicit language override. See [`ClientConfig::locale`].
    pub locale: Option<String>,

    /// Per-request timeout handed to the transport, in whole seconds on disk.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,

    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            units: DEFAULT_UNITS.to_string(),
            locale: None,
            timeout: DEFAULT_TIMEOUT,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key, ..Self::default() }
    }

    /// Build a config from `OPENWEATHER_*` environment variables.
    ///
    /// Values are trimmed; unset or blank variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        };

        let timeout = match get("OPENWEATHER_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("Invalid OPENWEATHER_TIMEOUT_SECS value: {raw:?}"))?;
                if secs == 0 {
                    bail!("Invalid OPENWEATHER_TIMEOUT_SECS value: {raw:?} (must be at least 1)");
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            api_key: get("OPENWEATHER_API_KEY"),
            units: get("OPENWEATHER_UNITS").unwrap_or_else(|| DEFAULT_UNITS.to_string()),
            locale: get("OPENWEATHER_LANG"),
            timeout,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Explicit override if set, the system preferred language otherwise.
    pub fn locale(&self) -> String {
        match &self.locale {
            Some(locale) if !locale.is_empty() => locale.clone(),
            _ => system_locale(),
        }
    }
}

/// Preferred language of the running process, e.g. `"it"` for `it_IT.UTF-8`.
pub fn system_locale() -> String {
    let candidates = ["LC_ALL", "LC_MESSAGES", "LANG"].map(|key| std::env::var(key).ok());
    locale_from_candidates(&candidates)
}

fn locale_from_candidates(candidates: &[Option<String>]) -> String {
    candidates
        .iter()
        .flatten()
        .filter_map(|raw| language_tag(raw))
        .next()
        .unwrap_or_else(|| FALLBACK_LOCALE.to_string())
}

// "pt_BR.UTF-8@euro" -> "pt"
fn language_tag(raw: &str) -> Option<String> {
    let lang = raw.split(['_', '.', '@', '-']).next()?.trim();

    if lang.is_empty() || lang.eq_ignore_ascii_case("c") || lang.eq_ignore_ascii_case("posix") {
        return None;
    }

    Some(lang.to_ascii_lowercase())
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
