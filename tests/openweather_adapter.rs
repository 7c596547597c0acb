use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use epd_dashboard::forecast::openweather::{parse_onecall, OpenWeatherAdapter};
use epd_dashboard::forecast::{ForecastAdapter, Location, ProviderError};
use epd_dashboard::model::{Condition, DaySlot};
use epd_dashboard::units::Units;
use httpmock::prelude::*;
use serde_json::{json, Value};

fn onecall(now: DateTime<Utc>) -> Value {
    let hour = now.timestamp() - now.timestamp() % 3600;
    let noon = now
        .with_hour(12)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .unwrap();
    let hourly: Vec<Value> = (0..48)
        .map(|i| {
            json!({
                "dt": hour + i * 3600,
                "temp": 20.0 + i as f64 * 0.1,
                "pop": 0.2,
                "weather": [{"id": 500, "description": "light rain", "icon": "10d"}]
            })
        })
        .collect();
    let daily: Vec<Value> = (0..8)
        .map(|i| {
            json!({
                "dt": (noon + Duration::days(i)).timestamp(),
                "temp": {"min": 11.0, "max": 22.0},
                "summary": if i == 0 { "Expect a day of partly cloudy with rain" } else { "" },
                "weather": [{"id": 803, "description": "broken clouds", "icon": "04d"}]
            })
        })
        .collect();
    json!({
        "lat": 52.52,
        "lon": 13.40,
        "timezone": "Europe/Berlin",
        "current": {
            "dt": now.timestamp(),
            "temp": 18.5,
            "feels_like": 17.9,
            "humidity": 64,
            "wind_speed": 10.0,
            "weather": [{"id": 800, "description": "clear sky", "icon": "01d"}]
        },
        "hourly": hourly,
        "daily": daily,
        "alerts": [{
            "sender_name": "DWD",
            "event": "Heat Advisory",
            "start": now.timestamp(),
            "end": now.timestamp() + 6 * 3600,
            "description": "Heat"
        }]
    })
}

#[test]
fn maps_onecall_payload() {
    let now = Utc.with_ymd_and_hms(2024, 5, 6, 10, 20, 0).unwrap();
    let body = onecall(now).to_string();

    let forecast = parse_onecall(&body, Units::Metric, Tz::UTC, now).unwrap();

    assert_eq!(forecast.provider, "OpenWeather");
    assert_eq!(forecast.current.condition, Condition::Clear);
    assert_eq!(forecast.current.summary, "Clear sky");
    let wind = forecast.current.wind.unwrap();
    assert!((wind.value - 36.0).abs() < 1e-9);
    assert_eq!(forecast.current.humidity, Some(64.0));

    assert_eq!(forecast.hourly.len(), 7);
    assert_eq!(forecast.hourly[0].time.hour(), 10);
    assert_eq!(forecast.hourly[0].precipitation_probability, Some(20.0));
    assert_eq!(forecast.hourly[0].condition, Condition::Rain);

    assert_eq!(forecast.daily.len(), 4);
    assert_eq!(forecast.daily[0].slot, DaySlot::Today);
    assert_eq!(
        forecast.daily[0].summary,
        "Expect a day of partly cloudy with rain"
    );
    assert_eq!(forecast.daily[1].slot, DaySlot::Tomorrow);
    assert_eq!(forecast.daily[1].summary, "Broken clouds");
    assert!(forecast.daily.iter().all(|d| !d.is_night_variant));

    assert_eq!(forecast.alerts.len(), 1);
    assert_eq!(forecast.alerts[0].headline, "Heat Advisory");
    assert_eq!(
        forecast.alerts[0].id,
        format!("Heat Advisory@{}", now.timestamp())
    );
}

#[test]
fn evening_skips_to_tomorrow() {
    let now = Utc.with_ymd_and_hms(2024, 5, 6, 19, 0, 0).unwrap();
    let body = onecall(now).to_string();

    let forecast = parse_onecall(&body, Units::Imperial, Tz::UTC, now).unwrap();

    assert_eq!(forecast.daily[0].slot, DaySlot::Tomorrow);
    assert_eq!(forecast.daily[0].date, now.date_naive() + Duration::days(1));
    // Imperial wind is passed through untouched.
    assert_eq!(forecast.current.wind.unwrap().value, 10.0);
}

#[test]
fn short_hourly_series_is_a_data_error() {
    let now = Utc.with_ymd_and_hms(2024, 5, 6, 10, 0, 0).unwrap();
    let mut payload = onecall(now);
    payload["hourly"] = json!([]);

    let err = parse_onecall(&payload.to_string(), Units::Metric, Tz::UTC, now).unwrap_err();

    assert!(matches!(err, ProviderError::Data { .. }), "{err}");
}

#[test]
fn missing_current_block_is_a_data_error() {
    let err = parse_onecall("{}", Units::Metric, Tz::UTC, Utc::now()).unwrap_err();
    assert!(matches!(err, ProviderError::Data { .. }));
}

#[test]
fn fetches_over_http() {
    let server = MockServer::start();
    let body = onecall(Utc::now());
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/onecall")
            .query_param("appid", "secret")
            .query_param("units", "metric")
            .query_param("exclude", "minutely");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(body);
    });

    let timeout = std::time::Duration::from_secs(5);
    let adapter = OpenWeatherAdapter::new("secret", "en", Tz::UTC, timeout)
        .unwrap()
        .with_base_url(server.base_url());
    let forecast = adapter
        .fetch_forecast(&Location::new(52.52, 13.40), Units::Metric)
        .unwrap();

    mock.assert();
    assert_eq!(forecast.hourly.len(), 7);
    assert_eq!(forecast.daily.len(), 4);
}

#[test]
fn rejected_key_is_unavailable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/onecall");
        then.status(401)
            .json_body(json!({"cod": 401, "message": "Invalid API key"}));
    });

    let adapter = OpenWeatherAdapter::new("bad", "en", Tz::UTC, std::time::Duration::from_secs(5))
        .unwrap()
        .with_base_url(server.base_url());
    let err = adapter
        .fetch_forecast(&Location::new(0.0, 0.0), Units::Imperial)
        .unwrap_err();

    assert!(err.is_unavailable());
}
