pub mod calendar;
pub mod dashboard;
pub mod forecast;
pub mod layout;
pub mod logging;
pub mod model;
pub mod quiet_hours;
pub mod render;
pub mod settings;
pub mod startup;
pub mod units;
