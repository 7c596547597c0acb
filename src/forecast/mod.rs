pub mod accuweather;
pub mod nws;
pub mod openweather;
pub mod policy;
pub mod retry;

pub use policy::{select_daily, select_hourly, DayHalf, ProviderDay};
pub use retry::{retry_with_backoff, RetryPolicy};

use crate::model::{Forecast, ForecastShapeError};
use crate::units::Units;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Coordinates of the forecast location, written `lat,long`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl FromStr for Location {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, long) = s
            .split_once(',')
            .ok_or_else(|| anyhow::anyhow!("location '{s}' is not 'lat,long'"))?;
        let latitude: f64 = lat.trim().parse()?;
        let longitude: f64 = long.trim().parse()?;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            anyhow::bail!("location '{s}' is out of range");
        }
        Ok(Self::new(latitude, longitude))
    }
}

impl TryFrom<String> for Location {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.to_string()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Transport, auth, timeout or non-success status.
    Unavailable { provider: String, reason: String },
    /// Payload was malformed or missing required fields.
    Data { provider: String, reason: String },
}

impl ProviderError {
    pub fn unavailable(provider: &str, reason: impl Into<String>) -> Self {
        ProviderError::Unavailable {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }

    pub fn data(provider: &str, reason: impl Into<String>) -> Self {
        ProviderError::Data {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }

    pub fn shape(provider: &str, err: ForecastShapeError) -> Self {
        Self::data(provider, err.to_string())
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, ProviderError::Unavailable { .. })
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Unavailable { provider, reason } => {
                write!(f, "{provider} unavailable: {reason}")
            }
            ProviderError::Data { provider, reason } => {
                write!(f, "{provider} returned bad data: {reason}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// One weather provider mapped onto the canonical model.
pub trait ForecastAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the provider reports separate day and night forecasts.
    fn has_night_forecasts(&self) -> bool;

    fn fetch_forecast(&self, location: &Location, units: Units) -> Result<Forecast, ProviderError>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeatherProvider {
    OpenWeather,
    AccuWeather,
}

impl Default for WeatherProvider {
    fn default() -> Self {
        WeatherProvider::OpenWeather
    }
}

pub(crate) fn http_client(timeout: Duration, user_agent: &str) -> anyhow::Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()?)
}

/// Send `request` and return the body of a successful response.
pub(crate) fn fetch_text(provider: &str, request: RequestBuilder) -> Result<String, ProviderError> {
    fetch_text_with(provider, request, |_| {})
}

/// Like [`fetch_text`], handing the response headers to `inspect` first,
/// whatever the status.
pub(crate) fn fetch_text_with(
    provider: &str,
    request: RequestBuilder,
    inspect: impl FnOnce(&HeaderMap),
) -> Result<String, ProviderError> {
    let resp = request.send().map_err(|e| {
        if e.is_timeout() {
            ProviderError::unavailable(provider, "request timed out")
        } else {
            ProviderError::unavailable(provider, e.to_string())
        }
    })?;
    inspect(resp.headers());
    let status = resp.status();
    if !status.is_success() {
        return Err(ProviderError::unavailable(
            provider,
            format!("http status {status}"),
        ));
    }
    resp.text()
        .map_err(|e| ProviderError::unavailable(provider, format!("read body: {e}")))
}

pub(crate) fn parse_json<T: DeserializeOwned>(
    provider: &str,
    body: &str,
) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::data(provider, e.to_string()))
}

/// Upper-case the first letter of a provider description.
pub(crate) fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
