use super::{RawEvent, RawTime};
use crate::model::{Event, EventPart, PLACEHOLDER_TITLE};
use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;
use std::ops::Range;

/// Turn raw calendar events into single-day events in `tz`.
///
/// Multi-day events are split at each local midnight, segments outside
/// `[now, now + horizon]` are dropped, and the result is sorted by start
/// with all-day entries first on ties, then by title. An entry listed by
/// more than one calendar is kept once.
pub fn normalize(
    raw_events: &[RawEvent],
    tz: Tz,
    horizon: Duration,
    now: DateTime<Utc>,
) -> Vec<Event> {
    let now_local = now.with_timezone(&tz);
    let limit = now_local + horizon;
    let window = DayWindow {
        first: now_local.date_naive(),
        last: limit.date_naive(),
    };

    let mut events: Vec<Event> = raw_events
        .iter()
        .flat_map(|raw| {
            let title = title_of(raw);
            match (raw.start, raw.end) {
                (RawTime::Date(start), RawTime::Date(end)) => {
                    split_all_day(title, start, end, tz, window)
                }
                (start, end) => {
                    split_timed(title, to_local(start, tz), to_local(end, tz), tz, window)
                }
            }
        })
        .filter(|event| event.end >= now_local && event.start <= limit)
        .collect();

    events.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| b.all_day.cmp(&a.all_day))
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.end.cmp(&b.end))
    });
    events.dedup_by(|a, b| {
        a.title == b.title && a.start == b.start && a.end == b.end && a.all_day == b.all_day
    });
    events
}

/// Local dates a segment may fall on and still pass the window filter.
#[derive(Debug, Clone, Copy)]
struct DayWindow {
    first: NaiveDate,
    last: NaiveDate,
}

impl DayWindow {
    /// Indices of the `count` days starting at `start` that lie in the window.
    fn indices(&self, start: NaiveDate, count: i64) -> Range<i64> {
        let from = (self.first - start).num_days().max(0);
        let to = ((self.last - start).num_days() + 1).min(count);
        from..to.max(from)
    }
}

fn title_of(raw: &RawEvent) -> &str {
    raw.summary
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(PLACEHOLDER_TITLE)
}

fn to_local(time: RawTime, tz: Tz) -> DateTime<Tz> {
    match time {
        RawTime::Date(date) => start_of_day(date, tz),
        RawTime::DateTime(dt) => dt.with_timezone(&tz),
    }
}

fn split_all_day(
    title: &str,
    start: NaiveDate,
    end_exclusive: NaiveDate,
    tz: Tz,
    window: DayWindow,
) -> Vec<Event> {
    let last = if end_exclusive > start {
        end_exclusive - Duration::days(1)
    } else {
        start
    };
    let count = (last - start).num_days() + 1;
    window
        .indices(start, count)
        .map(|i| {
            let day = start + Duration::days(i);
            Event {
                title: title.to_string(),
                start: start_of_day(day, tz),
                end: end_of_day(day, tz),
                all_day: true,
                part: part(i, count),
            }
        })
        .collect()
}

fn split_timed(
    title: &str,
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    tz: Tz,
    window: DayWindow,
) -> Vec<Event> {
    let end = end.max(start);
    let first_day = start.date_naive();
    let mut last_day = end.date_naive();
    // An end exactly at midnight belongs to the previous day.
    if last_day > first_day && end == start_of_day(last_day, tz) {
        last_day = last_day - Duration::days(1);
    }
    let count = (last_day - first_day).num_days() + 1;
    window
        .indices(first_day, count)
        .map(|i| {
            let day = first_day + Duration::days(i);
            Event {
                title: title.to_string(),
                start: start.max(start_of_day(day, tz)),
                end: end.min(end_of_day(day, tz)),
                all_day: false,
                part: part(i, count),
            }
        })
        .collect()
}

fn part(index: i64, count: i64) -> Option<EventPart> {
    (count > 1).then(|| EventPart {
        day: index as u32 + 1,
        of: count as u32,
    })
}

fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Tz> {
    local_instant(date.and_time(NaiveTime::MIN), tz)
}

fn end_of_day(date: NaiveDate, tz: Tz) -> DateTime<Tz> {
    start_of_day(date + Duration::days(1), tz) - Duration::seconds(1)
}

/// Map a wall-clock time onto `tz`. Ambiguous times take the earlier
/// instant; times inside a DST gap move to the first valid instant after.
fn local_instant(naive: NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => first_after_gap(naive, tz),
    }
}

/// Zone transitions never skip a whole day, so the minute scan always ends
/// inside the loop. The UTC reading only covers a corrupt zone table.
fn first_after_gap(naive: NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    (1..=24 * 60)
        .find_map(|minute| {
            tz.from_local_datetime(&(naive + Duration::minutes(minute)))
                .earliest()
        })
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike};

    fn open_window() -> DayWindow {
        DayWindow {
            first: NaiveDate::MIN,
            last: NaiveDate::MAX,
        }
    }

    #[test]
    fn gap_midnight_moves_forward() {
        // Havana skips from 00:00 to 01:00 on 2024-03-10.
        let tz: Tz = "America/Havana".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let start = start_of_day(date, tz);
        assert_eq!(start.date_naive(), date);
        assert_eq!(start.hour(), 1);
    }

    #[test]
    fn zero_length_all_day_is_one_day() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let events = split_all_day("x", d, d, chrono_tz::UTC, open_window());
        assert_eq!(events.len(), 1);
        assert!(events[0].part.is_none());
    }

    #[test]
    fn midnight_end_does_not_spill() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let start = offset.with_ymd_and_hms(2024, 1, 1, 22, 0, 0).unwrap();
        let end = offset.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let tz = chrono_tz::UTC;
        let events = split_timed(
            "late",
            start.with_timezone(&tz),
            end.with_timezone(&tz),
            tz,
            open_window(),
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].end.date_naive(), events[0].start.date_naive());
    }

    #[test]
    fn window_indices_clamp_to_event() {
        let window = DayWindow {
            first: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            last: NaiveDate::from_ymd_opt(2024, 5, 13).unwrap(),
        };
        let before = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(window.indices(before, 3).is_empty());
        assert_eq!(window.indices(before, 10), 5..10);
        assert_eq!(window.indices(before, 1000), 5..13);
        let inside = NaiveDate::from_ymd_opt(2024, 5, 8).unwrap();
        assert_eq!(window.indices(inside, 2), 0..2);
        let after = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert!(window.indices(after, 4).is_empty());
    }
}
