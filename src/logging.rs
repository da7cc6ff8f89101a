// src/logging.rs
//
// `tlog!`: stderr lines stamped with local wall-clock time, mirrored into a
// per-run log file while one is open.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::io::IoError;

/// Open log file, if any. Read by `tlog!`.
pub(crate) static LOG_FILE: Mutex<Option<File>> = Mutex::new(None);

/// Symlink kept pointing at the newest run's file
const LATEST_LOG_NAME: &str = "zlgcan.log";

fn stamp() -> String {
    chrono::Local::now().format("%H:%M:%S%.3f").to_string()
}

#[cfg(unix)]
fn link_latest(log_dir: &Path, filename: &str) {
    let link = log_dir.join(LATEST_LOG_NAME);
    let _ = std::fs::remove_file(&link);
    if let Err(e) = std::os::unix::fs::symlink(filename, &link) {
        eprintln!("{} [logging] Cannot link {}: {}", stamp(), LATEST_LOG_NAME, e);
    }
}

#[cfg(not(unix))]
fn link_latest(_log_dir: &Path, _filename: &str) {}

/// Start mirroring `tlog!` output into `<log_dir>/<YYYYmmdd-HHMMSS>-zlgcan.log`.
///
/// Returns the new file's path. A later call switches to a fresh file.
pub fn init_file_logging(log_dir: &Path) -> Result<PathBuf, IoError> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        IoError::configuration(format!("log dir {}: {}", log_dir.display(), e))
    })?;

    let filename = chrono::Local::now()
        .format("%Y%m%d-%H%M%S-zlgcan.log")
        .to_string();
    let path = log_dir.join(&filename);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| IoError::configuration(format!("log file {}: {}", path.display(), e)))?;

    link_latest(log_dir, &filename);

    if let Ok(mut slot) = LOG_FILE.lock() {
        *slot = Some(file);
    }
    // Not tlog!: the lock above must be released first
    eprintln!("{} [logging] Writing {}", stamp(), path.display());
    Ok(path)
}

/// Close the log file; `tlog!` goes back to stderr only.
pub fn stop_file_logging() {
    let closed = LOG_FILE
        .lock()
        .map(|mut slot| slot.take().is_some())
        .unwrap_or(false);
    if closed {
        eprintln!("{} [logging] Log file closed", stamp());
    }
}

macro_rules! tlog {
    ($($arg:tt)*) => {{
        use std::io::Write as _;
        let line = format!(
            "{} {}",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            format_args!($($arg)*)
        );
        eprintln!("{}", line);
        if let Ok(mut slot) = $crate::logging::LOG_FILE.lock() {
            if let Some(file) = slot.as_mut() {
                let _ = writeln!(file, "{}", line);
            }
        }
    }};
}
