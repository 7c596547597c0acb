use crate::calendar::google::{FileToken, GoogleCalendarSource, StaticToken, TokenSource};
use crate::calendar::{CalendarSource, NoCalendar};
use crate::dashboard::{Composer, ComposerSettings};
use crate::forecast::accuweather::AccuWeatherAdapter;
use crate::forecast::nws::NwsAlerts;
use crate::forecast::openweather::OpenWeatherAdapter;
use crate::forecast::{ForecastAdapter, WeatherProvider};
use crate::render::{DeviceFileDriver, DisplaySink, FileSink, RenderSink};
use crate::settings::{Settings, SinkSettings};
use anyhow::{Context, Result};
use chrono_tz::Tz;

pub fn build_adapter(settings: &Settings, tz: Tz) -> Result<Box<dyn ForecastAdapter>> {
    let timeout = settings.provider_timeout();
    let adapter: Box<dyn ForecastAdapter> = match settings.weather_provider {
        WeatherProvider::OpenWeather => {
            if settings.openweather.api_key.is_empty() {
                anyhow::bail!("openweather.api_key is required");
            }
            Box::new(OpenWeatherAdapter::new(
                settings.openweather.api_key.clone(),
                settings.openweather.language.clone(),
                tz,
                timeout,
            )?)
        }
        WeatherProvider::AccuWeather => {
            if settings.accuweather.api_key.is_empty() {
                anyhow::bail!("accuweather.api_key is required");
            }
            let mut adapter =
                AccuWeatherAdapter::new(settings.accuweather.api_key.clone(), tz, timeout)?;
            match &settings.accuweather.nws_user_agent {
                Some(agent) => adapter = adapter.with_alerts(NwsAlerts::new(agent, timeout)?),
                None => tracing::warn!("accuweather.nws_user_agent unset, alerts disabled"),
            }
            Box::new(adapter)
        }
    };
    tracing::info!(
        provider = adapter.name(),
        night_forecasts = adapter.has_night_forecasts(),
        "weather adapter ready"
    );
    Ok(adapter)
}

pub fn build_calendar(settings: &Settings) -> Result<Box<dyn CalendarSource>> {
    let calendar = &settings.calendar;
    let tokens: Box<dyn TokenSource> = match (&calendar.token_file, &calendar.access_token) {
        (Some(path), _) => Box::new(FileToken::new(path.clone())),
        (None, Some(token)) => Box::new(StaticToken::new(token.clone())),
        (None, None) => {
            tracing::warn!("no calendar credentials configured, calendar will be empty");
            return Ok(Box::new(NoCalendar));
        }
    };
    Ok(Box::new(GoogleCalendarSource::new(
        tokens,
        settings.calendar.google_config(),
        settings.provider_timeout(),
    )?))
}

pub fn build_sink(settings: &Settings) -> Result<Box<dyn RenderSink>> {
    let sink: Box<dyn RenderSink> = match &settings.sink {
        SinkSettings::File { path, .. } => Box::new(FileSink::new(path.clone())?),
        SinkSettings::Display { model, device } => Box::new(DisplaySink::new(
            DeviceFileDriver::new(device.clone()),
            *model,
        )),
    };
    Ok(sink)
}

/// Assemble the composer. Layout problems surface here, before any cycle runs.
pub fn build_composer(settings: &Settings) -> Result<Composer> {
    let tz = settings.timezone()?;
    let location = settings
        .location
        .context("settings.location is required, e.g. \"40.71,-74.01\"")?;
    let composer_settings = ComposerSettings {
        units: settings.units,
        location,
        display_timezone: tz,
        calendar_horizon: settings.calendar_horizon(),
        quiet_hours: settings.quiet_hours,
        retry: settings.retry,
        canvas: settings.canvas(),
    };
    let composer = Composer::new(
        &settings.layout(),
        build_adapter(settings, tz)?,
        build_calendar(settings)?,
        build_sink(settings)?,
        composer_settings,
    )
    .context("invalid layout")?;
    Ok(composer)
}
