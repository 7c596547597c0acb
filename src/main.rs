use anyhow::Result;
use chrono::Utc;
use epd_dashboard::dashboard::CycleOutcome;
use epd_dashboard::logging;
use epd_dashboard::settings::Settings;
use epd_dashboard::startup::build_composer;

fn main() -> Result<()> {
    let settings_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "settings.json".to_string());
    let settings = Settings::load(&settings_path)?;
    logging::init(settings.debug_logging, settings.log_file.clone());
    tracing::info!(
        path = %settings_path,
        provider = ?settings.weather_provider,
        "starting dashboard"
    );

    let mut composer = build_composer(&settings)?;
    loop {
        let report = composer.run_cycle(Utc::now())?;
        match report.outcome {
            CycleOutcome::Suppressed => tracing::debug!("cycle suppressed"),
            outcome => tracing::info!(
                ?outcome,
                weather_error = report.weather_error.is_some(),
                calendar_error = report.calendar_error.is_some(),
                sink_error = report.sink_error.is_some(),
                "cycle finished"
            ),
        }
        if settings.run_once {
            break;
        }
        std::thread::sleep(settings.refresh_interval());
    }
    Ok(())
}
