use epd_dashboard::forecast::{Location, WeatherProvider};
use epd_dashboard::layout::CanvasSize;
use epd_dashboard::render::DisplayModel;
use epd_dashboard::settings::{Settings, SinkSettings};
use epd_dashboard::units::Units;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn missing_file_gives_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let settings = Settings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.units, Units::Imperial);
    assert_eq!(settings.refresh_interval().as_secs(), 15 * 60);
    assert_eq!(settings.canvas(), CanvasSize::new(640, 384));
}

#[test]
fn blank_file_gives_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "  \n").unwrap();
    let settings = Settings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let mut settings = Settings::default();
    settings.location = Some(Location::new(47.61, -122.33));
    settings.display_timezone = "America/Los_Angeles".into();
    settings.units = Units::Metric;
    settings.save(path.to_str().unwrap()).unwrap();

    let loaded = Settings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(loaded, settings);
    assert_eq!(
        loaded.timezone().unwrap(),
        chrono_tz::America::Los_Angeles
    );
}

#[test]
fn parses_display_deployment() {
    let json = r#"{
        "units": "metric",
        "display_timezone": "Europe/Berlin",
        "location": "52.52,13.40",
        "weather_provider": "accuweather",
        "accuweather": {"api_key": "abc", "nws_user_agent": "dash (me@example.com)"},
        "quiet_hours": {"start": "23:00", "end": "06:00"},
        "sink": {"kind": "display", "model": "epd7in5_v2", "device": "/dev/epd0"},
        "calendar": {"token_file": "/run/dashboard/token"}
    }"#;
    let settings: Settings = serde_json::from_str(json).unwrap();

    assert_eq!(settings.weather_provider, WeatherProvider::AccuWeather);
    assert_eq!(settings.canvas(), CanvasSize::new(800, 480));
    assert_eq!(
        settings.sink,
        SinkSettings::Display {
            model: DisplayModel::Epd7in5V2,
            device: PathBuf::from("/dev/epd0"),
        }
    );
    assert_eq!(settings.calendar.max_results, 20);
    assert_eq!(settings.calendar.excluded_calendars, vec!["Contacts"]);
    assert!(settings.quiet_hours.is_some());
    assert_eq!(settings.calendar_horizon().num_days(), 7);
}

#[test]
fn bad_timezone_is_reported() {
    let settings = Settings {
        display_timezone: "Mars/Olympus".into(),
        ..Settings::default()
    };
    assert!(settings.timezone().is_err());
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = Settings::load(path.to_str().unwrap()).unwrap_err();
    assert!(format!("{err:#}").contains("parse settings file"));
}
