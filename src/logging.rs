use std::io;
use std::path::PathBuf;

use time::macros::format_description;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;

const LOG_FILE: &str = "mm.log";

/// The terminal belongs to the UI while the alternate screen is active, so
/// diagnostics go to a file. `MM_LOG_DIR` overrides the location, `RUST_LOG`
/// the filter. Returns the path of the log file being written.
pub fn init_logging() -> io::Result<PathBuf> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mm=info"));
    let writer = tracing_appender::rolling::never(&dir, LOG_FILE);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::new(format_description!(
            "[hour]:[minute]:[second].[subsecond digits:3]"
        )))
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();

    Ok(dir.join(LOG_FILE))
}

fn log_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("MM_LOG_DIR") {
        return PathBuf::from(dir);
    }

    let candidate = if cfg!(target_os = "windows") {
        std::env::var_os("LOCALAPPDATA").map(|base| PathBuf::from(base).join("mm").join("logs"))
    } else if cfg!(target_os = "macos") {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join("Library").join("Logs").join("mm"))
    } else {
        std::env::var_os("XDG_STATE_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME")
                    .map(|home| PathBuf::from(home).join(".local").join("state"))
            })
            .map(|state| state.join("mm").join("logs"))
    };

    candidate.unwrap_or_else(|| std::env::temp_dir().join("mm-logs"))
}
