use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn filter_for(debug: bool) -> EnvFilter {
    // Without debug logging `info` is forced even if `RUST_LOG` is set.
    if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    }
}

/// Initialise logging once per process. `debug` enables the `debug` level
/// (overridable through `RUST_LOG`). When `log_file` is given, output goes
/// to that file instead of stderr.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    let filter = filter_for(debug);
    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let Some(file_name) = path.file_name() else {
                eprintln!("log file path {} has no file name", path.display());
                return;
            };
            let appender = tracing_appender::rolling::never(dir, file_name);
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(appender)
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        }
    }
}
