use super::policy::{select_daily, select_hourly, DayHalf, ProviderDay};
use super::{
    capitalize, fetch_text, http_client, parse_json, ForecastAdapter, Location, ProviderError,
};
use crate::model::{
    Alert, AlertSeverity, Condition, CurrentConditions, Forecast, HourPoint, Speed, Temperature,
};
use crate::units::{meters_per_second_to_kmh, Units};
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/3.0";
const NAME: &str = "OpenWeather";
// One Call daily rows have no separate night half.
const NIGHT_FORECASTS: bool = false;

#[derive(Debug, Deserialize)]
struct OneCall {
    current: OwCurrent,
    #[serde(default)]
    hourly: Vec<OwHour>,
    #[serde(default)]
    daily: Vec<OwDay>,
    #[serde(default)]
    alerts: Vec<OwAlert>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: u16,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    dt: i64,
    temp: f64,
    #[serde(default)]
    feels_like: Option<f64>,
    #[serde(default)]
    humidity: Option<f64>,
    #[serde(default)]
    wind_speed: Option<f64>,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwHour {
    dt: i64,
    temp: f64,
    #[serde(default)]
    pop: Option<f64>,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwDayTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OwDay {
    dt: i64,
    temp: OwDayTemp,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwAlert {
    event: String,
    start: i64,
    end: i64,
}

/// Map an OpenWeather condition id (and its day/night icon suffix).
pub fn condition_for(id: u16, icon: &str) -> Condition {
    let night = icon.ends_with('n');
    match id {
        200..=299 => Condition::Thunderstorm,
        300..=399 => Condition::Showers,
        511 => Condition::Sleet,
        520..=531 => Condition::Showers,
        500..=599 => Condition::Rain,
        611..=616 => Condition::Sleet,
        600..=699 => Condition::Snow,
        771 | 781 => Condition::Wind,
        700..=799 => Condition::Fog,
        800 if night => Condition::ClearNight,
        800 => Condition::Clear,
        801 | 802 if night => Condition::PartlyCloudyNight,
        801 | 802 => Condition::PartlyCloudy,
        803 | 804 => Condition::Cloudy,
        _ => Condition::Unknown,
    }
}

fn first_condition(weather: &[OwWeather]) -> (Condition, String) {
    match weather.first() {
        Some(w) => (condition_for(w.id, &w.icon), capitalize(&w.description)),
        None => (Condition::Unknown, String::new()),
    }
}

fn at(tz: Tz, timestamp: i64) -> Result<DateTime<Tz>, ProviderError> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|dt| dt.with_timezone(&tz))
        .ok_or_else(|| ProviderError::data(NAME, format!("bad timestamp {timestamp}")))
}

/// Map a One Call 3.0 response onto the canonical forecast.
pub fn parse_onecall(
    body: &str,
    units: Units,
    tz: Tz,
    now: DateTime<Utc>,
) -> Result<Forecast, ProviderError> {
    let payload: OneCall = parse_json(NAME, body)?;
    let now = now.with_timezone(&tz);

    let (condition, summary) = first_condition(&payload.current.weather);
    // Metric wind arrives in m/s.
    let wind = payload.current.wind_speed.map(|speed| match units {
        Units::Metric => Speed::new(meters_per_second_to_kmh(speed), units),
        Units::Imperial => Speed::new(speed, units),
    });
    let current = CurrentConditions {
        observed_at: at(tz, payload.current.dt)?,
        temperature: Temperature::new(payload.current.temp, units),
        feels_like: payload
            .current
            .feels_like
            .map(|v| Temperature::new(v, units)),
        condition,
        summary,
        humidity: payload.current.humidity,
        wind,
    };

    let hourly = payload
        .hourly
        .iter()
        .map(|h| {
            Ok(HourPoint {
                time: at(tz, h.dt)?,
                temperature: Temperature::new(h.temp, units),
                condition: first_condition(&h.weather).0,
                precipitation_probability: h.pop.map(|p| (p * 100.0).round()),
            })
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;
    let hourly = select_hourly(hourly, now).map_err(|e| ProviderError::shape(NAME, e))?;

    let days = payload
        .daily
        .into_iter()
        .map(|d| {
            let (condition, description) = first_condition(&d.weather);
            Ok(ProviderDay {
                date: at(tz, d.dt)?.date_naive(),
                high: Temperature::new(d.temp.max, units),
                low: Temperature::new(d.temp.min, units),
                day: DayHalf {
                    condition,
                    summary: d.summary.filter(|s| !s.is_empty()).unwrap_or(description),
                },
                night: None,
            })
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;
    let daily =
        select_daily(days, now, NIGHT_FORECASTS).map_err(|e| ProviderError::shape(NAME, e))?;

    let alerts = payload
        .alerts
        .into_iter()
        .map(|a| {
            Ok(Alert {
                id: format!("{}@{}", a.event, a.start),
                headline: a.event,
                severity: AlertSeverity::Unknown,
                starts: Some(at(tz, a.start)?),
                ends: Some(at(tz, a.end)?),
            })
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;

    Forecast::new(NAME, units, current, hourly, daily, alerts)
        .map_err(|e| ProviderError::shape(NAME, e))
}

pub struct OpenWeatherAdapter {
    client: Client,
    base_url: String,
    api_key: String,
    language: String,
    tz: Tz,
}

impl OpenWeatherAdapter {
    pub fn new(
        api_key: impl Into<String>,
        language: impl Into<String>,
        tz: Tz,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(timeout, "epd-dashboard weather")?,
            base_url: OPENWEATHER_BASE_URL.to_string(),
            api_key: api_key.into(),
            language: language.into(),
            tz,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl ForecastAdapter for OpenWeatherAdapter {
    fn name(&self) -> &str {
        NAME
    }

    fn has_night_forecasts(&self) -> bool {
        NIGHT_FORECASTS
    }

    fn fetch_forecast(&self, location: &Location, units: Units) -> Result<Forecast, ProviderError> {
        let request = self
            .client
            .get(format!("{}/onecall", self.base_url))
            .query(&[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", units.as_str().to_string()),
                ("lang", self.language.clone()),
                ("exclude", "minutely".to_string()),
            ]);
        let body = fetch_text(NAME, request)?;
        tracing::debug!(provider = NAME, bytes = body.len(), "fetched one call payload");
        parse_onecall(&body, units, self.tz, Utc::now())
    }
}
