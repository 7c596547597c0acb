pub mod composer;
pub mod frame_cache;
pub mod panels;

pub use composer::{
    ComposeError, Composer, ComposerSettings, CycleOutcome, CycleReport, CALENDAR_UNAVAILABLE,
    WEATHER_UNAVAILABLE,
};
pub use frame_cache::FrameCache;
