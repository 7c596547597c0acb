use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Whether a refresh may run at `now`.
///
/// The quiet window is `[quiet_start, quiet_end)`. A start later than the end
/// wraps past midnight; equal bounds mean there is no quiet window at all.
pub fn should_refresh(now: NaiveTime, quiet_start: NaiveTime, quiet_end: NaiveTime) -> bool {
    !in_quiet_window(now, quiet_start, quiet_end)
}

fn in_quiet_window(now: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    if start == end {
        false
    } else if start < end {
        now >= start && now < end
    } else {
        now >= start || now < end
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuietHours {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl QuietHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn should_refresh(&self, now: NaiveTime) -> bool {
        should_refresh(now, self.start, self.end)
    }
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
            .map_err(|e| serde::de::Error::custom(format!("invalid time '{s}': {e}")))
    }
}
