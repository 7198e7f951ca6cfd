use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "tailpick.log";
const ARCHIVE_PREFIX: &str = "tailpick-";
const ARCHIVE_SUFFIX: &str = ".log";
const LOG_FILTER_ENV: &str = "TAILPICK_LOG";
const MAX_LOG_BYTES: u64 = 1_000_000;
const MAX_ARCHIVES: usize = 5;

static PANIC_HOOK_INSTALLED: OnceLock<()> = OnceLock::new();

pub fn logs_dir() -> PathBuf {
    crate::config::stable_app_data_dir().join("logs")
}

/// Routes `tracing` output to the rotating log file. stdout is left alone
/// because the CLI and serve loop write their protocol there.
pub fn init() -> Result<(), std::io::Error> {
    init_in(&logs_dir())
}

pub fn init_in(log_dir: &Path) -> Result<(), std::io::Error> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(LOG_FILE_NAME);
    rotate_if_needed(&log_path, log_dir)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();

    install_panic_hook();
    Ok(())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn rotate_if_needed(log_path: &Path, log_dir: &Path) -> Result<(), std::io::Error> {
    let meta = match fs::metadata(log_path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };

    if meta.len() < MAX_LOG_BYTES {
        return Ok(());
    }

    let archived = log_dir.join(format!("{ARCHIVE_PREFIX}{}{ARCHIVE_SUFFIX}", now_secs()));
    fs::rename(log_path, archived)?;
    prune_old_archives(log_dir)
}

fn prune_old_archives(log_dir: &Path) -> Result<(), std::io::Error> {
    let mut archives = fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(ARCHIVE_PREFIX) && n.ends_with(ARCHIVE_SUFFIX))
        })
        .collect::<Vec<_>>();

    archives.sort();
    let excess = archives.len().saturating_sub(MAX_ARCHIVES);
    for oldest in archives.drain(..excess) {
        let _ = fs::remove_file(oldest);
    }
    Ok(())
}

fn install_panic_hook() {
    let _ = PANIC_HOOK_INSTALLED.get_or_init(|| {
        let prior = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let location = panic_info
                .location()
                .map(|l| format!("{}:{}", l.file(), l.line()))
                .unwrap_or_else(|| "unknown".to_string());
            let payload = panic_info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic payload unavailable".to_string());
            tracing::error!(%location, %payload, "panic");
            prior(panic_info);
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::{
        logs_dir, prune_old_archives, rotate_if_needed, ARCHIVE_PREFIX, LOG_FILE_NAME,
        MAX_ARCHIVES,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(label: &str) -> std::path::PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "tailpick-{label}-{}-{unique}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("scratch dir should be created");
        dir
    }

    #[test]
    fn logs_dir_uses_stable_app_data_layout() {
        let dir = logs_dir();
        assert!(dir.to_string_lossy().contains("tailpick"));
    }

    #[test]
    fn oversized_log_is_archived() {
        let dir = scratch_dir("rotate");
        let log_path = dir.join(LOG_FILE_NAME);
        std::fs::write(&log_path, vec![b'x'; 1_000_001]).expect("log should be written");

        rotate_if_needed(&log_path, &dir).expect("rotation should succeed");

        assert!(!log_path.exists());
        let archived: Vec<String> = std::fs::read_dir(&dir)
            .expect("dir should list")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(archived.len(), 1);
        assert!(archived[0].starts_with(ARCHIVE_PREFIX));
        std::fs::remove_dir_all(&dir).expect("scratch dir should be removed");
    }

    #[test]
    fn pruning_keeps_newest_archives() {
        let dir = scratch_dir("prune");
        for stamp in 0..(MAX_ARCHIVES + 3) {
            std::fs::write(dir.join(format!("{ARCHIVE_PREFIX}{stamp:04}.log")), b"old")
                .expect("archive should be written");
        }

        prune_old_archives(&dir).expect("prune should succeed");

        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), MAX_ARCHIVES);
        assert!(!dir.join(format!("{ARCHIVE_PREFIX}0000.log")).exists());
        let newest = format!("{ARCHIVE_PREFIX}{:04}.log", MAX_ARCHIVES + 2);
        assert!(dir.join(newest).exists());
        std::fs::remove_dir_all(&dir).expect("scratch dir should be removed");
    }
}
