pub mod event;
pub mod forecast;

pub use event::{Event, EventPart, PLACEHOLDER_TITLE};
pub use forecast::{
    Alert, AlertSeverity, Condition, CurrentConditions, DayPoint, DaySlot, Forecast,
    ForecastShapeError, HourPoint, Speed, Temperature, DAILY_LEN, HOURLY_LEN,
};
