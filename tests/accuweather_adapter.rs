use chrono::{Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use epd_dashboard::forecast::accuweather::{parse_daily, parse_hourly, AccuWeatherAdapter};
use epd_dashboard::forecast::nws::NwsAlerts;
use epd_dashboard::forecast::{select_daily, ForecastAdapter, Location};
use epd_dashboard::model::{Condition, DaySlot};
use epd_dashboard::units::Units;
use httpmock::prelude::*;
use serde_json::{json, Value};

fn hourly_body() -> Value {
    let next = Utc::now() + Duration::hours(1);
    let rows: Vec<Value> = (0..12)
        .map(|i| {
            json!({
                "DateTime": (next + Duration::hours(i)).to_rfc3339(),
                "WeatherIcon": 3,
                "Temperature": {"Value": 60.0 + i as f64, "Unit": "F"},
                "PrecipitationProbability": 5
            })
        })
        .collect();
    Value::Array(rows)
}

fn daily_body() -> Value {
    let today = Utc::now().date_naive();
    let rows: Vec<Value> = (0..5)
        .map(|i| {
            let date = (today + Duration::days(i)).and_hms_opt(7, 0, 0).unwrap();
            json!({
                "Date": format!("{}+00:00", date.format("%Y-%m-%dT%H:%M:%S")),
                "Temperature": {
                    "Minimum": {"Value": 50.0, "Unit": "F"},
                    "Maximum": {"Value": 70.0, "Unit": "F"}
                },
                "Day": {"Icon": 12, "IconPhrase": "Showers"},
                "Night": {"Icon": 33, "IconPhrase": "Clear"}
            })
        })
        .collect();
    json!({"Headline": {"Text": "Showers"}, "DailyForecasts": rows})
}

fn current_body() -> Value {
    json!([{
        "LocalObservationDateTime": Utc::now().to_rfc3339(),
        "WeatherText": "Mostly sunny",
        "WeatherIcon": 2,
        "Temperature": {"Metric": {"Value": 18.0}, "Imperial": {"Value": 64.0}},
        "RelativeHumidity": 50
    }])
}

fn mock_accuweather(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/currentconditions/v1/349727")
            .query_param("apikey", "key")
            .query_param("details", "true");
        then.status(200).json_body(current_body());
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/forecasts/v1/hourly/12hour/349727")
            .query_param("metric", "false");
        then.status(200).json_body(hourly_body());
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/forecasts/v1/daily/5day/349727")
            .query_param("metric", "false");
        then.status(200).json_body(daily_body());
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/locations/v1/cities/geoposition/search")
            .query_param("q", "40.71,-74.01");
        then.status(200)
            .json_body(json!({"Key": "349727", "LocalizedName": "New York"}));
    })
}

#[test]
fn night_half_is_used_in_the_evening() {
    let days = parse_daily(&daily_body().to_string(), Units::Imperial).unwrap();
    let today = Utc::now().date_naive();
    let evening = Tz::UTC
        .from_utc_datetime(&today.and_time(NaiveTime::from_hms_opt(20, 0, 0).unwrap()));

    let daily = select_daily(days, evening, true).unwrap();

    assert_eq!(daily[0].slot, DaySlot::Tonight);
    assert!(daily[0].is_night_variant);
    assert_eq!(daily[0].condition, Condition::ClearNight);
    assert_eq!(daily[0].summary, "Clear");
    assert_eq!(daily[1].slot, DaySlot::Tomorrow);
    assert_eq!(daily[1].condition, Condition::Showers);
}

#[test]
fn hourly_rows_keep_order() {
    let hours = parse_hourly(&hourly_body().to_string(), Units::Imperial, Tz::UTC).unwrap();
    assert_eq!(hours.len(), 12);
    assert!(hours.windows(2).all(|p| p[0].time < p[1].time));
    assert_eq!(hours[0].precipitation_probability, Some(5.0));
}

#[test]
fn fetch_resolves_location_key_once() {
    let server = MockServer::start();
    let geo = mock_accuweather(&server);
    let alerts_server = MockServer::start();
    let alerts = alerts_server.mock(|when, then| {
        when.method(GET)
            .path("/alerts/active")
            .query_param("point", "40.71,-74.01")
            .header("user-agent", "dashboard (ops@example.com)");
        then.status(200).json_body(json!({"features": [{"properties": {
            "id": "urn:oid:2",
            "event": "Flood Watch",
            "severity": "Moderate",
            "onset": Utc::now().to_rfc3339(),
            "ends": null,
            "expires": (Utc::now() + Duration::hours(6)).to_rfc3339()
        }}]}));
    });

    let nws = NwsAlerts::new("dashboard (ops@example.com)", std::time::Duration::from_secs(5))
        .unwrap()
        .with_base_url(alerts_server.base_url());
    let adapter = AccuWeatherAdapter::new("key", Tz::UTC, std::time::Duration::from_secs(5))
        .unwrap()
        .with_base_url(server.base_url())
        .with_alerts(nws);
    let location = Location::new(40.71, -74.01);

    let first = adapter.fetch_forecast(&location, Units::Imperial).unwrap();
    let second = adapter.fetch_forecast(&location, Units::Imperial).unwrap();

    geo.assert_hits(1);
    alerts.assert_hits(2);
    assert_eq!(first.provider, "AccuWeather");
    assert_eq!(first.current.temperature.value, 64.0);
    assert_eq!(first.hourly.len(), 7);
    assert_eq!(first.daily.len(), 4);
    assert_eq!(second.alerts.len(), 1);
    assert_eq!(second.alerts[0].headline, "Flood Watch");
}

#[test]
fn alert_outage_does_not_fail_forecast() {
    let server = MockServer::start();
    mock_accuweather(&server);
    let alerts_server = MockServer::start();
    alerts_server.mock(|when, then| {
        when.method(GET).path("/alerts/active");
        then.status(503);
    });

    let nws = NwsAlerts::new("dashboard", std::time::Duration::from_secs(5))
        .unwrap()
        .with_base_url(alerts_server.base_url());
    let adapter = AccuWeatherAdapter::new("key", Tz::UTC, std::time::Duration::from_secs(5))
        .unwrap()
        .with_base_url(server.base_url())
        .with_alerts(nws);

    let forecast = adapter
        .fetch_forecast(&Location::new(40.71, -74.01), Units::Imperial)
        .unwrap();

    assert!(forecast.alerts.is_empty());
}

#[test]
fn unknown_location_is_unavailable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/locations/v1/cities/geoposition/search");
        then.status(503);
    });

    let adapter = AccuWeatherAdapter::new("key", Tz::UTC, std::time::Duration::from_secs(5))
        .unwrap()
        .with_base_url(server.base_url());
    let err = adapter
        .fetch_forecast(&Location::new(40.71, -74.01), Units::Metric)
        .unwrap_err();

    assert!(err.is_unavailable());
}

#[test]
fn spent_call_budget_stops_requests() {
    let server = MockServer::start();
    let geo = server.mock(|when, then| {
        when.method(GET).path("/locations/v1/cities/geoposition/search");
        then.status(200)
            .header("RateLimit-Remaining", "0")
            .json_body(json!({"Key": "349727"}));
    });
    let current = server.mock(|when, then| {
        when.method(GET).path("/currentconditions/v1/349727");
        then.status(200).json_body(current_body());
    });

    let adapter = AccuWeatherAdapter::new("key", Tz::UTC, std::time::Duration::from_secs(5))
        .unwrap()
        .with_base_url(server.base_url());
    let location = Location::new(40.71, -74.01);

    for _ in 0..2 {
        let err = adapter
            .fetch_forecast(&location, Units::Imperial)
            .unwrap_err();
        assert!(err.is_unavailable());
        assert!(err.to_string().contains("api call budget exhausted"));
    }
    geo.assert_hits(1);
    current.assert_hits(0);
}

#[test]
fn remaining_budget_allows_requests() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/currentconditions/v1/349727");
        then.status(200)
            .header("RateLimit-Remaining", "41")
            .json_body(current_body());
    });
    mock_accuweather(&server);

    let adapter = AccuWeatherAdapter::new("key", Tz::UTC, std::time::Duration::from_secs(5))
        .unwrap()
        .with_base_url(server.base_url());

    assert!(adapter
        .fetch_forecast(&Location::new(40.71, -74.01), Units::Imperial)
        .is_ok());
}
