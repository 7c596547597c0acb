use super::{fetch_text, http_client, parse_json, Location, ProviderError};
use crate::model::{Alert, AlertSeverity};
use chrono::DateTime;
use chrono_tz::Tz;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::time::Duration;

pub const NWS_BASE_URL: &str = "https://api.weather.gov";
const NAME: &str = "NWS";

#[derive(Debug, Deserialize)]
struct AlertCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: AlertProperties,
}

#[derive(Debug, Deserialize)]
struct AlertProperties {
    id: String,
    event: String,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    effective: Option<String>,
    #[serde(default)]
    onset: Option<String>,
    #[serde(default)]
    ends: Option<String>,
    #[serde(default)]
    expires: Option<String>,
}

fn timestamp(value: Option<&str>, tz: Tz) -> Result<Option<DateTime<Tz>>, ProviderError> {
    value
        .map(|v| {
            DateTime::parse_from_rfc3339(v)
                .map(|dt| dt.with_timezone(&tz))
                .map_err(|e| ProviderError::data(NAME, format!("bad timestamp '{v}': {e}")))
        })
        .transpose()
}

/// Convert an `alerts/active` GeoJSON collection.
pub fn parse_alerts(body: &str, tz: Tz) -> Result<Vec<Alert>, ProviderError> {
    let collection: AlertCollection = parse_json(NAME, body)?;
    collection
        .features
        .into_iter()
        .map(|feature| {
            let p = feature.properties;
            let starts = p.onset.as_deref().or(p.effective.as_deref());
            let ends = p.ends.as_deref().or(p.expires.as_deref());
            Ok(Alert {
                starts: timestamp(starts, tz)?,
                ends: timestamp(ends, tz)?,
                severity: p
                    .severity
                    .as_deref()
                    .map_or(AlertSeverity::Unknown, AlertSeverity::parse),
                id: p.id,
                headline: p.event,
            })
        })
        .collect()
}

/// National Weather Service active alerts, used alongside AccuWeather.
pub struct NwsAlerts {
    client: Client,
    base_url: String,
}

impl NwsAlerts {
    /// `user_agent` is required by the service and should carry contact details.
    pub fn new(user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(timeout, user_agent)?,
            base_url: NWS_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn fetch(&self, location: &Location, tz: Tz) -> Result<Vec<Alert>, ProviderError> {
        let request = self
            .client
            .get(format!("{}/alerts/active", self.base_url))
            .header(ACCEPT, "application/geo+json")
            .query(&[
                ("point", location.to_string()),
                ("status", "actual".to_string()),
            ]);
        let body = fetch_text(NAME, request)?;
        parse_alerts(&body, tz)
    }
}
