use chrono::{Duration, TimeZone, Utc};
use epd_dashboard::calendar::google::{
    parse_events, FileToken, GoogleCalendarConfig, GoogleCalendarSource, StaticToken,
};
use epd_dashboard::calendar::{CalendarError, CalendarSource, RawTime};
use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration as StdDuration;
use tempfile::tempdir;

fn source(server: &MockServer, token: &str) -> GoogleCalendarSource {
    GoogleCalendarSource::new(
        Box::new(StaticToken::new(token)),
        GoogleCalendarConfig::default(),
        StdDuration::from_secs(5),
    )
    .unwrap()
    .with_base_url(server.base_url())
}

#[test]
fn fetches_events_from_every_included_calendar() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/users/me/calendarList")
            .header("authorization", "Bearer tok");
        then.status(200).json_body(json!({"items": [
            {"id": "primary", "summary": "me@example.com"},
            {"id": "contacts_id", "summary": "Contacts"}
        ]}));
    });
    let events = server.mock(|when, then| {
        when.method(GET)
            .path("/calendars/primary/events")
            .header("authorization", "Bearer tok")
            .query_param("singleEvents", "true")
            .query_param("orderBy", "startTime")
            .query_param("timeMin", "2024-05-06T10:00:00Z")
            .query_param("maxResults", "20");
        then.status(200).json_body(json!({"items": [
            {"summary": "Standup",
             "start": {"dateTime": "2024-05-06T09:30:00-04:00"},
             "end": {"dateTime": "2024-05-06T09:45:00-04:00"}},
            {"summary": "Happy birthday!",
             "start": {"date": "2024-05-07"}, "end": {"date": "2024-05-08"}},
            {"summary": "Offsite",
             "start": {"date": "2024-05-08"}, "end": {"date": "2024-05-10"}}
        ]}));
    });

    let start = Utc.with_ymd_and_hms(2024, 5, 6, 10, 0, 0).unwrap();
    let raw = source(&server, "tok")
        .fetch_events(start, start + Duration::days(7))
        .unwrap();

    events.assert();
    let titles: Vec<_> = raw.iter().map(|e| e.summary.as_deref().unwrap()).collect();
    assert_eq!(titles, vec!["Standup", "Offsite"]);
    assert!(matches!(raw[1].start, RawTime::Date(_)));
}

#[test]
fn rejected_token_is_unavailable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/users/me/calendarList");
        then.status(401);
    });

    let now = Utc::now();
    let err = source(&server, "expired")
        .fetch_events(now, now + Duration::days(7))
        .unwrap_err();

    assert!(matches!(err, CalendarError::Unavailable(_)));
}

#[test]
fn missing_token_file_is_unavailable() {
    let dir = tempdir().unwrap();
    let server = MockServer::start();
    let source = GoogleCalendarSource::new(
        Box::new(FileToken::new(dir.path().join("token.txt"))),
        GoogleCalendarConfig::default(),
        StdDuration::from_secs(5),
    )
    .unwrap()
    .with_base_url(server.base_url());

    let now = Utc::now();
    let err = source.fetch_events(now, now + Duration::days(1)).unwrap_err();

    assert!(matches!(err, CalendarError::Unavailable(_)));
}

#[test]
fn token_file_is_read_per_request() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("token.txt");
    std::fs::write(&path, "rotated\n").unwrap();
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET)
            .path("/users/me/calendarList")
            .header("authorization", "Bearer rotated");
        then.status(200).json_body(json!({"items": []}));
    });

    let source = GoogleCalendarSource::new(
        Box::new(FileToken::new(&path)),
        GoogleCalendarConfig::default(),
        StdDuration::from_secs(5),
    )
    .unwrap()
    .with_base_url(server.base_url());
    let now = Utc::now();

    assert!(source
        .fetch_events(now, now + Duration::days(1))
        .unwrap()
        .is_empty());
    list.assert();
}

#[test]
fn cancelled_and_untitled_entries() {
    let body = r#"{"items":[
        {"status":"cancelled","summary":"Dropped",
         "start":{"dateTime":"2024-05-06T09:00:00Z"},"end":{"dateTime":"2024-05-06T10:00:00Z"}},
        {"start":{"dateTime":"2024-05-06T11:00:00Z"},"end":{"dateTime":"2024-05-06T12:00:00Z"}}
    ]}"#;
    let events = parse_events(body, &[]).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].summary, None);
}

#[test]
fn event_without_times_does_not_drop_the_rest() {
    let body = r#"{"items":[
        {"summary":"Broken","start":{},"end":{}},
        {"summary":"Dentist",
         "start":{"dateTime":"2024-05-06T15:00:00Z"},"end":{"dateTime":"2024-05-06T16:00:00Z"}}
    ]}"#;
    let events = parse_events(body, &[]).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].summary.as_deref(), Some("Dentist"));
}

#[test]
fn unreadable_page_is_a_data_error() {
    assert!(matches!(
        parse_events("not json", &[]),
        Err(CalendarError::Data(_))
    ));
}
