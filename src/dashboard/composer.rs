use super::frame_cache::FrameCache;
use super::panels;
use crate::calendar::{normalize, CalendarError, CalendarSource};
use crate::forecast::{
    retry_with_backoff, ForecastAdapter, Location, ProviderError, RetryPolicy,
};
use crate::layout::{
    daily_cell, hourly_cell, required_cells, BindError, CanvasSize, CellContent, Grid, LayoutError,
    LayoutSpec, ALERTS, CALENDAR, CURRENT_CONDITIONS, FOOTER,
};
use crate::model::{Event, Forecast, DAILY_LEN, HOURLY_LEN};
use crate::quiet_hours::QuietHours;
use crate::render::{RenderSink, SinkError};
use crate::units::Units;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use image::GrayImage;
use std::fmt;
use std::sync::Arc;

pub const WEATHER_UNAVAILABLE: &str = "Weather unavailable";
pub const CALENDAR_UNAVAILABLE: &str = "Calendar unavailable";

#[derive(Debug, Clone)]
pub struct ComposerSettings {
    pub units: Units,
    pub location: Location,
    pub display_timezone: Tz,
    pub calendar_horizon: Duration,
    pub quiet_hours: Option<QuietHours>,
    pub retry: RetryPolicy,
    pub canvas: CanvasSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Quiet hours; nothing drawn or sent.
    Suppressed,
    Rendered { weather: bool, calendar: bool },
    /// The new frame matched the one on the panel, so no refresh was sent.
    Unchanged,
    /// Both sources failed and the last good raster was sent again.
    RetainedPrevious,
    /// Both sources failed before anything ever rendered.
    FirstRunPlaceholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub weather_error: Option<ProviderError>,
    pub calendar_error: Option<CalendarError>,
    pub sink_error: Option<SinkError>,
}

impl CycleReport {
    fn new(outcome: CycleOutcome) -> Self {
        Self {
            outcome,
            weather_error: None,
            calendar_error: None,
            sink_error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComposeError {
    Bind(BindError),
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposeError::Bind(err) => write!(f, "binding failed: {err}"),
        }
    }
}

impl std::error::Error for ComposeError {}

impl From<BindError> for ComposeError {
    fn from(err: BindError) -> Self {
        ComposeError::Bind(err)
    }
}

/// Orchestrates one refresh: fetch, bind, draw, present.
pub struct Composer {
    settings: ComposerSettings,
    grid: Grid,
    adapter: Box<dyn ForecastAdapter>,
    calendar: Box<dyn CalendarSource>,
    sink: Box<dyn RenderSink>,
    last_frame: FrameCache,
    /// Raster the panel currently shows and the footer time drawn on it.
    shown: Option<(Arc<GrayImage>, DateTime<Tz>)>,
}

impl Composer {
    pub fn new(
        layout: &LayoutSpec,
        adapter: Box<dyn ForecastAdapter>,
        calendar: Box<dyn CalendarSource>,
        sink: Box<dyn RenderSink>,
        settings: ComposerSettings,
    ) -> Result<Self, LayoutError> {
        let grid = Grid::new(layout, settings.canvas)?;
        grid.require(required_cells())?;
        Ok(Self {
            settings,
            grid,
            adapter,
            calendar,
            sink,
            last_frame: FrameCache::new(),
            shown: None,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn last_frame(&self) -> Option<Arc<GrayImage>> {
        self.last_frame.snapshot()
    }

    pub fn run_cycle(&mut self, now: DateTime<Utc>) -> Result<CycleReport, ComposeError> {
        let local = now.with_timezone(&self.settings.display_timezone);
        if let Some(quiet) = &self.settings.quiet_hours {
            if !quiet.should_refresh(local.time()) {
                tracing::info!(time = %local.format("%H:%M"), "quiet hours, skipping refresh");
                return Ok(CycleReport::new(CycleOutcome::Suppressed));
            }
        }

        let (weather, events) = self.fetch_all(now);

        let (forecast, events) = match (weather, events) {
            (Err(weather_error), Err(calendar_error)) => {
                tracing::warn!(
                    weather = %weather_error,
                    calendar = %calendar_error,
                    "both sources failed"
                );
                let mut report = self.fallback(local);
                report.weather_error = Some(weather_error);
                report.calendar_error = Some(calendar_error);
                return Ok(report);
            }
            pair => pair,
        };

        self.grid.clear_bindings();
        let mut report = CycleReport::new(CycleOutcome::Rendered {
            weather: forecast.is_ok(),
            calendar: events.is_ok(),
        });

        let provider = match forecast {
            Ok(forecast) => {
                let provider = forecast.provider.clone();
                self.bind_forecast(forecast)?;
                provider
            }
            Err(err) => {
                tracing::warn!(
                    provider = %self.adapter.name(),
                    error = %err,
                    "weather unavailable"
                );
                self.bind_weather_placeholders()?;
                report.weather_error = Some(err);
                self.adapter.name().to_string()
            }
        };
        match events {
            Ok(events) => self.grid.bind(CALENDAR, CellContent::Calendar(events))?,
            Err(err) => {
                tracing::warn!(
                    source = %self.calendar.name(),
                    error = %err,
                    "calendar unavailable"
                );
                self.grid
                    .bind(CALENDAR, CellContent::Placeholder(CALENDAR_UNAVAILABLE.into()))?;
                report.calendar_error = Some(err);
            }
        }
        if let Some((shown, shown_at)) = self.shown.clone() {
            self.bind_footer(&provider, shown_at)?;
            if panels::render(&self.grid, local) == *shown {
                tracing::info!("frame unchanged, skipping refresh");
                report.outcome = CycleOutcome::Unchanged;
                return Ok(report);
            }
        }
        self.bind_footer(&provider, local)?;

        let image = panels::render(&self.grid, local);
        report.sink_error = self.present(&image);
        let frame = self.last_frame.replace(image);
        self.shown = report.sink_error.is_none().then_some((frame, local));
        Ok(report)
    }

    fn bind_footer(&mut self, provider: &str, updated_at: DateTime<Tz>) -> Result<(), BindError> {
        if self.grid.cell(FOOTER).is_none() {
            return Ok(());
        }
        self.grid.unbind(FOOTER);
        self.grid.bind(
            FOOTER,
            CellContent::Footer {
                provider: provider.to_string(),
                updated_at,
            },
        )
    }

    /// Run both fetches on scoped threads. A panicking fetch counts as a
    /// failure of that source.
    fn fetch_all(
        &self,
        now: DateTime<Utc>,
    ) -> (Result<Forecast, ProviderError>, Result<Vec<Event>, CalendarError>) {
        let adapter = self.adapter.as_ref();
        let calendar = self.calendar.as_ref();
        let settings = &self.settings;
        std::thread::scope(|scope| {
            let weather = scope.spawn(move || {
                retry_with_backoff(&settings.retry, || {
                    adapter.fetch_forecast(&settings.location, settings.units)
                })
            });
            let events = scope.spawn(move || -> Result<Vec<Event>, CalendarError> {
                let raw = calendar.fetch_events(now, now + settings.calendar_horizon)?;
                Ok(normalize(
                    &raw,
                    settings.display_timezone,
                    settings.calendar_horizon,
                    now,
                ))
            });
            let weather = weather.join().unwrap_or_else(|_| {
                Err(ProviderError::unavailable(adapter.name(), "fetch panicked"))
            });
            let events = events
                .join()
                .unwrap_or_else(|_| Err(CalendarError::Unavailable("fetch panicked".into())));
            (weather, events)
        })
    }

    fn bind_forecast(&mut self, forecast: Forecast) -> Result<(), BindError> {
        self.grid
            .bind(CURRENT_CONDITIONS, CellContent::Current(forecast.current))?;
        for (i, hour) in forecast.hourly.into_iter().enumerate() {
            self.grid.bind(&hourly_cell(i + 1), CellContent::Hour(hour))?;
        }
        for (i, day) in forecast.daily.into_iter().enumerate() {
            self.grid.bind(&daily_cell(i + 1), CellContent::Day(day))?;
        }
        self.grid.bind(ALERTS, CellContent::Alerts(forecast.alerts))
    }

    fn bind_weather_placeholders(&mut self) -> Result<(), BindError> {
        let placeholder = || CellContent::Placeholder(WEATHER_UNAVAILABLE.into());
        self.grid.bind(CURRENT_CONDITIONS, placeholder())?;
        for i in 1..=HOURLY_LEN {
            self.grid.bind(&hourly_cell(i), placeholder())?;
        }
        for i in 1..=DAILY_LEN {
            self.grid.bind(&daily_cell(i), placeholder())?;
        }
        // No alerts are known, so the band stays empty.
        self.grid.bind(ALERTS, CellContent::Alerts(Vec::new()))
    }

    fn fallback(&mut self, local: DateTime<Tz>) -> CycleReport {
        self.shown = None;
        match self.last_frame.snapshot() {
            Some(frame) => {
                let mut report = CycleReport::new(CycleOutcome::RetainedPrevious);
                report.sink_error = self.present(&frame);
                report
            }
            None => {
                let image = panels::first_run_placeholder(self.settings.canvas, local);
                let mut report = CycleReport::new(CycleOutcome::FirstRunPlaceholder);
                report.sink_error = self.present(&image);
                report
            }
        }
    }

    fn present(&mut self, image: &GrayImage) -> Option<SinkError> {
        match self.sink.present(image) {
            Ok(()) => {
                tracing::info!(sink = %self.sink.name(), "frame presented");
                None
            }
            Err(err) => {
                tracing::error!(
                    sink = %self.sink.name(),
                    error = %err,
                    "presenting frame failed"
                );
                Some(err)
            }
        }
    }
}
