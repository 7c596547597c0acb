use epd_dashboard::calendar::CalendarSource;
use epd_dashboard::forecast::{Location, WeatherProvider};
use epd_dashboard::layout::{CellSpec, LayoutSpec, CALENDAR};
use epd_dashboard::settings::{Settings, SinkSettings};
use epd_dashboard::startup::{build_adapter, build_calendar, build_composer};
use tempfile::tempdir;

fn configured(dir: &std::path::Path) -> Settings {
    let mut settings = Settings::default();
    settings.location = Some(Location::new(40.71, -74.01));
    settings.openweather.api_key = "key".into();
    settings.sink = SinkSettings::File {
        path: dir.join("dashboard.png"),
        model: Default::default(),
    };
    settings
}

#[test]
fn builds_composer_for_stock_layout() {
    let dir = tempdir().unwrap();
    let composer = build_composer(&configured(dir.path())).unwrap();
    assert!(composer.grid().cell(CALENDAR).is_some());
    assert!(composer.last_frame().is_none());
}

#[test]
fn missing_location_is_rejected() {
    let dir = tempdir().unwrap();
    let mut settings = configured(dir.path());
    settings.location = None;
    let err = build_composer(&settings).err().unwrap();
    assert!(err.to_string().contains("location"));
}

#[test]
fn missing_api_key_is_rejected() {
    let mut settings = Settings::default();
    settings.weather_provider = WeatherProvider::AccuWeather;
    assert!(build_adapter(&settings, chrono_tz::UTC).is_err());
}

#[test]
fn layout_without_required_cells_is_rejected() {
    let dir = tempdir().unwrap();
    let mut settings = configured(dir.path());
    settings.layout = Some(LayoutSpec {
        grid: Default::default(),
        cells: vec![CellSpec::track(CALENDAR, 0, 0)],
    });
    let err = build_composer(&settings).err().unwrap();
    assert!(format!("{err:#}").contains("invalid layout"));
}

#[test]
fn calendar_without_credentials_is_empty() {
    let source = build_calendar(&Settings::default()).unwrap();
    assert_eq!(source.name(), "none");
}
