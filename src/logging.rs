use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming a log file.
pub const LOG_FILE_ENV: &str = "VELOSTORE_LOG";

/// Initialize tracing.
///
/// Without `VELOSTORE_LOG` output goes to stderr. With it, each run logs to
/// its own file next to the configured one: `garage.log` becomes
/// `garage.{timestamp}.{pid}.log`, so concurrent CLI runs never share a file.
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(base) = std::env::var_os(LOG_FILE_ENV) else {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init();
        return;
    };

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let path = run_log_path(Path::new(&base), timestamp, std::process::id());
    let file = match std::fs::File::create(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("velostore: cannot create log file {}: {e}", path.display());
            return;
        }
    };

    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();
}

/// Inserts `{timestamp}.{pid}` before the extension of `base`.
fn run_log_path(base: &Path, timestamp: u64, pid: u32) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "velostore".to_string());
    let name = match base.extension() {
        Some(ext) => format!("{stem}.{timestamp}.{pid}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{timestamp}.{pid}"),
    };
    base.with_file_name(name)
}
