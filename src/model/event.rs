use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;

/// Title used when the calendar service supplies no summary.
pub const PLACEHOLDER_TITLE: &str = "(No title)";

/// Position of a split segment within its original multi-day event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventPart {
    pub day: u32,
    pub of: u32,
}

/// A calendar entry confined to one day of the display timezone.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub title: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub all_day: bool,
    pub part: Option<EventPart>,
}

impl Event {
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Time frame shown under the title: `All day`, `9:00a - 10:00a`,
    /// or the open-ended forms used by split segments.
    pub fn time_label(&self) -> String {
        if self.all_day {
            return "All day".to_string();
        }
        match self.part {
            Some(EventPart { day, of }) if of > 1 && day == 1 => {
                format!("Starting at {}", short_time(&self.start))
            }
            Some(EventPart { day, of }) if of > 1 && day == of => {
                format!("Until {}", short_time(&self.end))
            }
            Some(EventPart { of, .. }) if of > 1 => "All day".to_string(),
            _ => format!("{} - {}", short_time(&self.start), short_time(&self.end)),
        }
    }

    /// Title with the `(Day i/N)` suffix for split segments.
    pub fn display_title(&self) -> String {
        match self.part {
            Some(EventPart { day, of }) => format!("{} (Day {}/{})", self.title, day, of),
            None => self.title.clone(),
        }
    }
}

fn short_time(time: &DateTime<Tz>) -> String {
    // "9:00am" -> "9:00a"
    let mut label = time.format("%-I:%M%P").to_string();
    label.pop();
    label
}
