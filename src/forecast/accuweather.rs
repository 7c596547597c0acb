use super::nws::NwsAlerts;
use super::policy::{select_daily, select_hourly, DayHalf, ProviderDay};
use super::{fetch_text_with, http_client, parse_json, ForecastAdapter, Location, ProviderError};
use crate::model::{Condition, CurrentConditions, Forecast, HourPoint, Speed, Temperature};
use crate::units::Units;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Duration;

pub const ACCUWEATHER_BASE_URL: &str = "https://dataservice.accuweather.com";
const NAME: &str = "AccuWeather";
const RATE_LIMIT_REMAINING: &str = "RateLimit-Remaining";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GeoPosition {
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Value {
    value: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UnitPair {
    metric: Value,
    imperial: Value,
}

impl UnitPair {
    fn pick(&self, units: Units) -> f64 {
        match units {
            Units::Metric => self.metric.value,
            Units::Imperial => self.imperial.value,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Wind {
    speed: UnitPair,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Current {
    local_observation_date_time: String,
    weather_text: String,
    weather_icon: u8,
    temperature: UnitPair,
    #[serde(default)]
    real_feel_temperature: Option<UnitPair>,
    #[serde(default)]
    relative_humidity: Option<f64>,
    #[serde(default)]
    wind: Option<Wind>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Hour {
    date_time: String,
    weather_icon: u8,
    temperature: Value,
    #[serde(default)]
    precipitation_probability: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Range {
    minimum: Value,
    maximum: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Half {
    icon: u8,
    icon_phrase: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Day {
    date: String,
    temperature: Range,
    day: Half,
    night: Half,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Daily {
    daily_forecasts: Vec<Day>,
}

/// Map an AccuWeather icon number.
pub fn condition_for(icon: u8) -> Condition {
    match icon {
        1..=5 => Condition::Clear,
        6..=8 => Condition::Cloudy,
        11 => Condition::Fog,
        12..=14 => Condition::Showers,
        15..=17 => Condition::Thunderstorm,
        18 => Condition::Rain,
        19..=23 => Condition::Snow,
        24..=26 | 29 => Condition::Sleet,
        // hot, cold
        30 | 31 => Condition::Clear,
        32 => Condition::Wind,
        33 | 34 => Condition::ClearNight,
        35..=38 => Condition::PartlyCloudyNight,
        39 | 40 => Condition::Showers,
        41 | 42 => Condition::Thunderstorm,
        43 | 44 => Condition::Snow,
        _ => Condition::Unknown,
    }
}

fn timestamp(value: &str, tz: Tz) -> Result<DateTime<Tz>, ProviderError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&tz))
        .map_err(|e| ProviderError::data(NAME, format!("bad timestamp '{value}': {e}")))
}

/// `currentconditions/v1` returns a one-element array.
pub fn parse_current(body: &str, units: Units, tz: Tz) -> Result<CurrentConditions, ProviderError> {
    let mut list: Vec<Current> = parse_json(NAME, body)?;
    if list.is_empty() {
        return Err(ProviderError::data(NAME, "no current conditions"));
    }
    let current = list.swap_remove(0);
    Ok(CurrentConditions {
        observed_at: timestamp(&current.local_observation_date_time, tz)?,
        temperature: Temperature::new(current.temperature.pick(units), units),
        feels_like: current
            .real_feel_temperature
            .as_ref()
            .map(|t| Temperature::new(t.pick(units), units)),
        condition: condition_for(current.weather_icon),
        summary: current.weather_text,
        humidity: current.relative_humidity,
        wind: current
            .wind
            .as_ref()
            .map(|w| Speed::new(w.speed.pick(units), units)),
    })
}

/// Hourly values already arrive in the requested units.
pub fn parse_hourly(body: &str, units: Units, tz: Tz) -> Result<Vec<HourPoint>, ProviderError> {
    let hours: Vec<Hour> = parse_json(NAME, body)?;
    hours
        .iter()
        .map(|h| {
            Ok(HourPoint {
                time: timestamp(&h.date_time, tz)?,
                temperature: Temperature::new(h.temperature.value, units),
                condition: condition_for(h.weather_icon),
                precipitation_probability: h.precipitation_probability,
            })
        })
        .collect()
}

pub fn parse_daily(body: &str, units: Units) -> Result<Vec<ProviderDay>, ProviderError> {
    let daily: Daily = parse_json(NAME, body)?;
    daily
        .daily_forecasts
        .into_iter()
        .map(|d| {
            // The date carries the location's own offset; its calendar day is what counts.
            let date = DateTime::parse_from_rfc3339(&d.date)
                .map_err(|e| ProviderError::data(NAME, format!("bad date '{}': {e}", d.date)))?
                .date_naive();
            Ok(ProviderDay {
                date,
                high: Temperature::new(d.temperature.maximum.value, units),
                low: Temperature::new(d.temperature.minimum.value, units),
                day: DayHalf {
                    condition: condition_for(d.day.icon),
                    summary: d.day.icon_phrase,
                },
                night: Some(DayHalf {
                    condition: condition_for(d.night.icon),
                    summary: d.night.icon_phrase,
                }),
            })
        })
        .collect()
}

/// Calls left on the API key, as last reported by the service. A spent
/// budget blocks requests for the rest of that UTC day.
#[derive(Debug, Default)]
struct CallBudget {
    last: Mutex<Option<(u32, NaiveDate)>>,
}

impl CallBudget {
    fn with_last<R>(&self, f: impl FnOnce(&mut Option<(u32, NaiveDate)>) -> R) -> R {
        match self.last.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn record(&self, headers: &HeaderMap, today: NaiveDate) {
        let Some(remaining) = headers
            .get(RATE_LIMIT_REMAINING)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok())
        else {
            return;
        };
        if remaining == 0 {
            tracing::warn!(provider = NAME, "api call budget exhausted");
        } else {
            tracing::debug!(provider = NAME, remaining, "api calls remaining");
        }
        self.with_last(|last| *last = Some((remaining, today)));
    }

    fn exhausted(&self, today: NaiveDate) -> bool {
        self.with_last(|last| matches!(*last, Some((0, day)) if day == today))
    }
}

pub struct AccuWeatherAdapter {
    client: Client,
    base_url: String,
    api_key: String,
    tz: Tz,
    location_key: OnceCell<String>,
    alerts: Option<NwsAlerts>,
    budget: CallBudget,
}

impl AccuWeatherAdapter {
    pub fn new(api_key: impl Into<String>, tz: Tz, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(timeout, "epd-dashboard weather")?,
            base_url: ACCUWEATHER_BASE_URL.to_string(),
            api_key: api_key.into(),
            tz,
            location_key: OnceCell::new(),
            alerts: None,
            budget: CallBudget::default(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_alerts(mut self, alerts: NwsAlerts) -> Self {
        self.alerts = Some(alerts);
        self
    }

    fn get(&self, path: &str, extra: &[(&str, String)]) -> Result<String, ProviderError> {
        let today = Utc::now().date_naive();
        if self.budget.exhausted(today) {
            return Err(ProviderError::unavailable(NAME, "api call budget exhausted"));
        }
        let mut query = vec![("apikey", self.api_key.clone())];
        query.extend(extra.iter().cloned());
        let request = self
            .client
            .get(format!("{}/{}", self.base_url, path))
            .query(&query);
        fetch_text_with(NAME, request, |headers| self.budget.record(headers, today))
    }

    fn location_key(&self, location: &Location) -> Result<&str, ProviderError> {
        let key = self.location_key.get_or_try_init(|| {
            let body = self.get(
                "locations/v1/cities/geoposition/search",
                &[("q", location.to_string())],
            )?;
            let position: GeoPosition = parse_json(NAME, &body)?;
            tracing::info!(provider = NAME, key = %position.key, "resolved location key");
            Ok::<_, ProviderError>(position.key)
        })?;
        Ok(key.as_str())
    }
}

impl ForecastAdapter for AccuWeatherAdapter {
    fn name(&self) -> &str {
        NAME
    }

    fn has_night_forecasts(&self) -> bool {
        true
    }

    fn fetch_forecast(&self, location: &Location, units: Units) -> Result<Forecast, ProviderError> {
        let key = self.location_key(location)?.to_string();
        let metric = [("metric", (units == Units::Metric).to_string())];

        let current = parse_current(
            &self.get(
                &format!("currentconditions/v1/{key}"),
                &[("details", "true".to_string())],
            )?,
            units,
            self.tz,
        )?;
        let hourly = parse_hourly(
            &self.get(&format!("forecasts/v1/hourly/12hour/{key}"), &metric)?,
            units,
            self.tz,
        )?;
        let days = parse_daily(
            &self.get(&format!("forecasts/v1/daily/5day/{key}"), &metric)?,
            units,
        )?;

        let now = Utc::now().with_timezone(&self.tz);
        let hourly = select_hourly(hourly, now).map_err(|e| ProviderError::shape(NAME, e))?;
        let daily = select_daily(days, now, self.has_night_forecasts())
            .map_err(|e| ProviderError::shape(NAME, e))?;

        let alerts = match &self.alerts {
            Some(nws) => nws.fetch(location, self.tz).unwrap_or_else(|err| {
                tracing::warn!(provider = NAME, error = %err, "alerts unavailable");
                Vec::new()
            }),
            None => Vec::new(),
        };

        Forecast::new(NAME, units, current, hourly, daily, alerts)
            .map_err(|e| ProviderError::shape(NAME, e))
    }
}
