use super::{CalendarError, CalendarSource, RawEvent, RawTime};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const GOOGLE_CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Supplies OAuth access tokens. Refreshing them happens elsewhere.
pub trait TokenSource: Send + Sync {
    fn access_token(&self) -> anyhow::Result<String>;
}

pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenSource for StaticToken {
    fn access_token(&self) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

/// Re-reads the token from disk on every request so an external refresher
/// can rotate it.
pub struct FileToken {
    path: PathBuf,
}

impl FileToken {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenSource for FileToken {
    fn access_token(&self) -> anyhow::Result<String> {
        use anyhow::Context;
        let token = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read token file {}", self.path.display()))?;
        let token = token.trim();
        if token.is_empty() {
            anyhow::bail!("token file {} is empty", self.path.display());
        }
        Ok(token.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct GoogleCalendarConfig {
    pub excluded_calendars: Vec<String>,
    pub excluded_titles: Vec<String>,
    pub max_results: u32,
}

impl Default for GoogleCalendarConfig {
    fn default() -> Self {
        Self {
            excluded_calendars: vec!["Contacts".into()],
            excluded_titles: vec!["Happy birthday!".into()],
            max_results: 20,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListPage {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CalendarListEntry {
    id: String,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventsPage {
    // Decoded one at a time so a single malformed entry can be skipped.
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GoogleEvent {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    status: Option<String>,
    start: EventTime,
    end: EventTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    date_time: Option<String>,
}

impl EventTime {
    fn to_raw(&self) -> Result<RawTime, CalendarError> {
        if let Some(dt) = &self.date_time {
            return DateTime::parse_from_rfc3339(dt)
                .map(RawTime::DateTime)
                .map_err(|e| CalendarError::Data(format!("bad dateTime '{dt}': {e}")));
        }
        if let Some(date) = &self.date {
            return NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map(RawTime::Date)
                .map_err(|e| CalendarError::Data(format!("bad date '{date}': {e}")));
        }
        Err(CalendarError::Data("event time has neither date nor dateTime".into()))
    }
}

/// Parse one `events.list` response, skipping cancelled entries,
/// excluded titles and entries whose times cannot be read.
pub fn parse_events(
    body: &str,
    excluded_titles: &[String],
) -> Result<Vec<RawEvent>, CalendarError> {
    let page: EventsPage =
        serde_json::from_str(body).map_err(|e| CalendarError::Data(e.to_string()))?;
    let mut events = Vec::with_capacity(page.items.len());
    for item in page.items {
        let item: GoogleEvent = match serde_json::from_value(item) {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable calendar entry");
                continue;
            }
        };
        if item.status.as_deref() == Some("cancelled") {
            continue;
        }
        if let Some(summary) = &item.summary {
            if excluded_titles.iter().any(|t| t == summary) {
                continue;
            }
        }
        match (item.start.to_raw(), item.end.to_raw()) {
            (Ok(start), Ok(end)) => events.push(RawEvent {
                start,
                end,
                summary: item.summary,
            }),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(
                    summary = item.summary.as_deref().unwrap_or_default(),
                    error = %e,
                    "skipping calendar entry"
                );
            }
        }
    }
    Ok(events)
}

pub struct GoogleCalendarSource {
    client: Client,
    base_url: String,
    tokens: Box<dyn TokenSource>,
    config: GoogleCalendarConfig,
}

impl GoogleCalendarSource {
    pub fn new(
        tokens: Box<dyn TokenSource>,
        config: GoogleCalendarConfig,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("epd-dashboard calendar")
            .build()?;
        Ok(Self {
            client,
            base_url: GOOGLE_CALENDAR_BASE_URL.to_string(),
            tokens,
            config,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn get(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, String)],
    ) -> Result<String, CalendarError> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .map_err(|e| CalendarError::Unavailable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(CalendarError::Unavailable(format!(
                "http status {}",
                resp.status()
            )));
        }
        resp.text()
            .map_err(|e| CalendarError::Unavailable(format!("read body: {e}")))
    }

    fn calendars(&self, token: &str) -> Result<Vec<CalendarListEntry>, CalendarError> {
        let url = format!("{}/users/me/calendarList", self.base_url);
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = Vec::new();
            if let Some(next) = &page_token {
                query.push(("pageToken", next.clone()));
            }
            let body = self.get(&url, token, &query)?;
            let page: CalendarListPage =
                serde_json::from_str(&body).map_err(|e| CalendarError::Data(e.to_string()))?;
            calendars.extend(page.items);
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(calendars)
    }
}

impl CalendarSource for GoogleCalendarSource {
    fn name(&self) -> &str {
        "Google Calendar"
    }

    fn fetch_events(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>, CalendarError> {
        let token = self
            .tokens
            .access_token()
            .map_err(|e| CalendarError::Unavailable(format!("access token: {e:#}")))?;
        let time_min = window_start.to_rfc3339_opts(SecondsFormat::Secs, true);
        let time_max = window_end.to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut events = Vec::new();
        for calendar in self.calendars(&token)? {
            let name = calendar.summary.as_deref().unwrap_or(&calendar.id);
            if self.config.excluded_calendars.iter().any(|c| c == name) {
                tracing::debug!(calendar = %name, "skipping excluded calendar");
                continue;
            }
            let url = format!(
                "{}/calendars/{}/events",
                self.base_url,
                urlencoding::encode(&calendar.id)
            );
            let query = [
                ("timeMin", time_min.clone()),
                ("timeMax", time_max.clone()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", self.config.max_results.to_string()),
            ];
            let body = self.get(&url, &token, &query)?;
            let found = parse_events(&body, &self.config.excluded_titles)?;
            tracing::debug!(calendar = %name, count = found.len(), "fetched events");
            events.extend(found);
        }
        Ok(events)
    }
}
