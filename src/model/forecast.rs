use crate::units::Units;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use std::fmt;

pub const HOURLY_LEN: usize = 7;
pub const DAILY_LEN: usize = 4;

/// Canonical weather condition every provider code table maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Clear,
    ClearNight,
    PartlyCloudy,
    PartlyCloudyNight,
    Cloudy,
    Showers,
    Rain,
    Thunderstorm,
    Snow,
    Sleet,
    Fog,
    Wind,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature {
    pub value: f64,
    pub units: Units,
}

impl Temperature {
    pub fn new(value: f64, units: Units) -> Self {
        Self { value, units }
    }

    /// Rounded value with the unit letter, e.g. `72°F`.
    pub fn with_symbol(&self) -> String {
        format!("{}{}", self, self.units.temperature_symbol())
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_finite() {
            write!(f, "{}°", self.value.round() as i64)
        } else {
            f.write_str("-")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speed {
    pub value: f64,
    pub units: Units,
}

impl Speed {
    pub fn new(value: f64, units: Units) -> Self {
        Self { value, units }
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_finite() {
            write!(f, "{} {}", self.value.round() as i64, self.units.speed_label())
        } else {
            f.write_str("-")
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub observed_at: DateTime<Tz>,
    pub temperature: Temperature,
    pub feels_like: Option<Temperature>,
    pub condition: Condition,
    pub summary: String,
    /// Relative humidity in percent.
    pub humidity: Option<f64>,
    pub wind: Option<Speed>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourPoint {
    pub time: DateTime<Tz>,
    pub temperature: Temperature,
    pub condition: Condition,
    /// Chance of precipitation in percent.
    pub precipitation_probability: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySlot {
    Today,
    Tonight,
    Tomorrow,
    Upcoming,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayPoint {
    pub date: NaiveDate,
    pub high: Temperature,
    pub low: Temperature,
    pub condition: Condition,
    pub summary: String,
    pub is_night_variant: bool,
    pub slot: DaySlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlertSeverity {
    Extreme,
    Severe,
    Moderate,
    Minor,
    Unknown,
}

impl AlertSeverity {
    /// Parse a provider severity string, falling back to `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "extreme" => AlertSeverity::Extreme,
            "severe" => AlertSeverity::Severe,
            "moderate" => AlertSeverity::Moderate,
            "minor" => AlertSeverity::Minor,
            _ => AlertSeverity::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub id: String,
    pub headline: String,
    pub severity: AlertSeverity,
    pub starts: Option<DateTime<Tz>>,
    pub ends: Option<DateTime<Tz>>,
}

/// Rejected shape of a provider payload after mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastShapeError {
    UnitMismatch { field: String },
    HourlyLength { expected: usize, actual: usize },
    DailyLength { expected: usize, actual: usize },
    HourlyOutOfOrder,
}

impl fmt::Display for ForecastShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastShapeError::UnitMismatch { field } => {
                write!(f, "field '{field}' does not use the forecast units")
            }
            ForecastShapeError::HourlyLength { expected, actual } => {
                write!(f, "expected {expected} hourly points, got {actual}")
            }
            ForecastShapeError::DailyLength { expected, actual } => {
                write!(f, "expected {expected} daily points, got {actual}")
            }
            ForecastShapeError::HourlyOutOfOrder => {
                write!(f, "hourly points are not chronological")
            }
        }
    }
}

impl std::error::Error for ForecastShapeError {}

#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub provider: String,
    pub units: Units,
    pub current: CurrentConditions,
    pub hourly: Vec<HourPoint>,
    pub daily: Vec<DayPoint>,
    pub alerts: Vec<Alert>,
}

impl Forecast {
    pub fn new(
        provider: impl Into<String>,
        units: Units,
        current: CurrentConditions,
        hourly: Vec<HourPoint>,
        daily: Vec<DayPoint>,
        alerts: Vec<Alert>,
    ) -> Result<Self, ForecastShapeError> {
        if hourly.len() != HOURLY_LEN {
            return Err(ForecastShapeError::HourlyLength {
                expected: HOURLY_LEN,
                actual: hourly.len(),
            });
        }
        if daily.len() != DAILY_LEN {
            return Err(ForecastShapeError::DailyLength {
                expected: DAILY_LEN,
                actual: daily.len(),
            });
        }
        if hourly.windows(2).any(|pair| pair[0].time >= pair[1].time) {
            return Err(ForecastShapeError::HourlyOutOfOrder);
        }

        let check = |field: &str, other: Units| {
            if other == units {
                Ok(())
            } else {
                Err(ForecastShapeError::UnitMismatch {
                    field: field.to_string(),
                })
            }
        };
        check("current.temperature", current.temperature.units)?;
        if let Some(feels) = &current.feels_like {
            check("current.feels_like", feels.units)?;
        }
        if let Some(wind) = &current.wind {
            check("current.wind", wind.units)?;
        }
        for hour in &hourly {
            check("hourly.temperature", hour.temperature.units)?;
        }
        for day in &daily {
            check("daily.high", day.high.units)?;
            check("daily.low", day.low.units)?;
        }

        Ok(Self {
            provider: provider.into(),
            units,
            current,
            hourly,
            daily,
            alerts,
        })
    }
}
