use crate::calendar::google::GoogleCalendarConfig;
use crate::forecast::{Location, RetryPolicy, WeatherProvider};
use crate::layout::{CanvasSize, LayoutSpec};
use crate::quiet_hours::QuietHours;
use crate::render::DisplayModel;
use crate::units::Units;
use anyhow::Context;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

fn default_timezone() -> String {
    "UTC".into()
}

fn default_horizon_days() -> u32 {
    7
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_refresh_minutes() -> u64 {
    15
}

fn default_language() -> String {
    "en".into()
}

fn default_max_results() -> u32 {
    20
}

fn default_excluded_calendars() -> Vec<String> {
    vec!["Contacts".into()]
}

fn default_excluded_titles() -> Vec<String> {
    vec!["Happy birthday!".into()]
}

fn default_output() -> PathBuf {
    PathBuf::from("dashboard.bmp")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenWeatherSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for OpenWeatherSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: default_language(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AccuWeatherSettings {
    #[serde(default)]
    pub api_key: String,
    /// Contact string sent to the NWS alerts service. Alerts are skipped when unset.
    #[serde(default)]
    pub nws_user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarSettings {
    #[serde(default)]
    pub access_token: Option<String>,
    /// File re-read before each fetch, kept current by an external refresher.
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    #[serde(default = "default_excluded_calendars")]
    pub excluded_calendars: Vec<String>,
    #[serde(default = "default_excluded_titles")]
    pub excluded_titles: Vec<String>,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            access_token: None,
            token_file: None,
            excluded_calendars: default_excluded_calendars(),
            excluded_titles: default_excluded_titles(),
            max_results: default_max_results(),
        }
    }
}

impl CalendarSettings {
    pub fn google_config(&self) -> GoogleCalendarConfig {
        GoogleCalendarConfig {
            excluded_calendars: self.excluded_calendars.clone(),
            excluded_titles: self.excluded_titles.clone(),
            max_results: self.max_results,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkSettings {
    File {
        #[serde(default = "default_output")]
        path: PathBuf,
        /// Canvas size when no display model applies.
        #[serde(default)]
        model: DisplayModel,
    },
    Display {
        #[serde(default)]
        model: DisplayModel,
        device: PathBuf,
    },
}

impl Default for SinkSettings {
    fn default() -> Self {
        SinkSettings::File {
            path: default_output(),
            model: DisplayModel::default(),
        }
    }
}

impl SinkSettings {
    pub fn model(&self) -> DisplayModel {
        match self {
            SinkSettings::File { model, .. } | SinkSettings::Display { model, .. } => *model,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub units: Units,
    #[serde(default = "default_timezone")]
    pub display_timezone: String,
    #[serde(default = "default_horizon_days")]
    pub calendar_horizon_days: u32,
    #[serde(default)]
    pub quiet_hours: Option<QuietHours>,
    /// Custom layout; the stock dashboard is used when unset.
    #[serde(default)]
    pub layout: Option<LayoutSpec>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub weather_provider: WeatherProvider,
    #[serde(default)]
    pub openweather: OpenWeatherSettings,
    #[serde(default)]
    pub accuweather: AccuWeatherSettings,
    #[serde(default = "default_timeout_secs")]
    pub provider_timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub calendar: CalendarSettings,
    #[serde(default)]
    pub sink: SinkSettings,
    #[serde(default = "default_refresh_minutes")]
    pub refresh_interval_minutes: u64,
    #[serde(default)]
    pub run_once: bool,
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            units: Units::default(),
            display_timezone: default_timezone(),
            calendar_horizon_days: default_horizon_days(),
            quiet_hours: None,
            layout: None,
            location: None,
            weather_provider: WeatherProvider::default(),
            openweather: OpenWeatherSettings::default(),
            accuweather: AccuWeatherSettings::default(),
            provider_timeout_secs: default_timeout_secs(),
            retry: RetryPolicy::default(),
            calendar: CalendarSettings::default(),
            sink: SinkSettings::default(),
            refresh_interval_minutes: default_refresh_minutes(),
            run_once: false,
            debug_logging: false,
            log_file: None,
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&content).with_context(|| format!("parse settings file {path}"))
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn timezone(&self) -> anyhow::Result<Tz> {
        self.display_timezone.parse::<Tz>().map_err(|e| {
            anyhow::anyhow!("invalid display_timezone '{}': {e}", self.display_timezone)
        })
    }

    pub fn canvas(&self) -> CanvasSize {
        self.sink.model().size()
    }

    pub fn layout(&self) -> LayoutSpec {
        self.layout.clone().unwrap_or_else(LayoutSpec::dashboard)
    }

    pub fn calendar_horizon(&self) -> chrono::Duration {
        chrono::Duration::days(self.calendar_horizon_days.max(1) as i64)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs.max(1))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes.max(1) * 60)
    }
}
