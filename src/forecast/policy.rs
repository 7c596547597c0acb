//! Selection rules shared by every provider adapter.

use crate::model::{
    Condition, DayPoint, DaySlot, ForecastShapeError, HourPoint, Temperature, DAILY_LEN,
    HOURLY_LEN,
};
use chrono::{DateTime, Duration, NaiveDate, Timelike};
use chrono_tz::Tz;

/// From this local hour on, the first daily cell looks at the night.
pub const EVENING_HOUR: u32 = 18;

#[derive(Debug, Clone, PartialEq)]
pub struct DayHalf {
    pub condition: Condition,
    pub summary: String,
}

/// A provider's daily entry before the day/night policy runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDay {
    pub date: NaiveDate,
    pub high: Temperature,
    pub low: Temperature,
    pub day: DayHalf,
    pub night: Option<DayHalf>,
}

/// Keep the points whose hour has not ended yet, in order, and take the
/// first seven.
pub fn select_hourly(
    mut points: Vec<HourPoint>,
    now: DateTime<Tz>,
) -> Result<Vec<HourPoint>, ForecastShapeError> {
    points.sort_by_key(|p| p.time);
    points.dedup_by_key(|p| p.time);
    let selected: Vec<HourPoint> = points
        .into_iter()
        .filter(|p| p.time + Duration::hours(1) > now)
        .take(HOURLY_LEN)
        .collect();
    if selected.len() < HOURLY_LEN {
        return Err(ForecastShapeError::HourlyLength {
            expected: HOURLY_LEN,
            actual: selected.len(),
        });
    }
    Ok(selected)
}

/// Pick exactly four daily entries.
///
/// Before 18:00 the first entry is today. From 18:00 it is tonight when the
/// provider has night forecasts, otherwise tomorrow.
pub fn select_daily(
    mut days: Vec<ProviderDay>,
    now: DateTime<Tz>,
    has_night: bool,
) -> Result<Vec<DayPoint>, ForecastShapeError> {
    let today = now.date_naive();
    days.sort_by_key(|d| d.date);
    days.dedup_by_key(|d| d.date);
    days.retain(|d| d.date >= today);

    let mut rest = days.into_iter().peekable();
    let mut out = Vec::with_capacity(DAILY_LEN);

    let starts_today = rest.peek().map_or(false, |d| d.date == today);
    if now.hour() >= EVENING_HOUR && starts_today {
        if let Some(day) = rest.next() {
            if let Some(night) = day.night.filter(|_| has_night) {
                out.push(DayPoint {
                    date: day.date,
                    high: day.high,
                    low: day.low,
                    condition: night.condition,
                    summary: night.summary,
                    is_night_variant: true,
                    slot: DaySlot::Tonight,
                });
            }
        }
    }

    out.extend(rest.take(DAILY_LEN - out.len()).map(|d| {
        let slot = slot_for(d.date, today);
        DayPoint {
            date: d.date,
            high: d.high,
            low: d.low,
            condition: d.day.condition,
            summary: d.day.summary,
            is_night_variant: false,
            slot,
        }
    }));

    if out.len() < DAILY_LEN {
        return Err(ForecastShapeError::DailyLength {
            expected: DAILY_LEN,
            actual: out.len(),
        });
    }
    Ok(out)
}

fn slot_for(date: NaiveDate, today: NaiveDate) -> DaySlot {
    match (date - today).num_days() {
        0 => DaySlot::Today,
        1 => DaySlot::Tomorrow,
        _ => DaySlot::Upcoming,
    }
}
