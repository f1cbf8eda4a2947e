//! Running-instance bookkeeping on top of [`super::lock`].
//!
//! The lock file holds the PID on the first line and the custom config
//! directory (empty for the default) on the second.

use anyhow::{Context, Result, bail};
use nix::sys::signal::Signal;
use std::path::{Path, PathBuf};

use super::lock::{self, LockFile};
use crate::common::utils;

/// A solpaper service process as recorded in the lock file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub pid: u32,
    pub config_dir: Option<PathBuf>,
}

impl InstanceInfo {
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            config_dir: crate::config::get_custom_config_dir(),
        }
    }

    pub fn from_lock_contents(contents: &str) -> Result<Self> {
        let mut lines = contents.lines();
        let pid = lines
            .next()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .context("Lock file is empty")?
            .parse::<u32>()
            .context("Invalid PID format in lock file")?;

        let config_dir = lines
            .next()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(PathBuf::from);

        if lines.any(|l| !l.trim().is_empty()) {
            bail!("Invalid lock file format (expected at most 2 lines)");
        }

        Ok(Self { pid, config_dir })
    }

    pub fn to_lock_contents(&self) -> String {
        match &self.config_dir {
            Some(dir) => format!("{}\n{}\n", self.pid, dir.display()),
            None => format!("{}\n\n", self.pid),
        }
    }
}

fn read_instance(lock_path: &Path) -> Option<InstanceInfo> {
    let contents = std::fs::read_to_string(lock_path).ok()?;
    InstanceInfo::from_lock_contents(&contents).ok()
}

/// The live instance, if any.
///
/// When the instance runs with a custom config directory, this process adopts
/// it so that commands act on the same configuration.
pub fn get_running_instance() -> Option<InstanceInfo> {
    let info = read_instance(&lock::get_lock_path())?;
    if !utils::is_process_running(info.pid) || info.pid == std::process::id() {
        return None;
    }
    if let Some(dir) = &info.config_dir {
        let _ = crate::config::set_config_dir(Some(dir.display().to_string()));
    }
    Some(info)
}

/// Take the service lock at `lock_path`, clearing stale or malformed locks.
///
/// Fails with a hint when another live instance holds the lock.
pub fn ensure_single_instance_at(lock_path: &Path) -> Result<LockFile> {
    for _ in 0..2 {
        if let Some(mut lock) = LockFile::try_acquire(lock_path)? {
            lock.write(&InstanceInfo::current().to_lock_contents())?;
            return Ok(lock);
        }

        match read_instance(lock_path) {
            Some(info) if utils::is_process_running(info.pid) => {
                bail!(
                    "solpaper is already running (PID: {}). Use 'solpaper reload' or 'solpaper stop'",
                    info.pid
                );
            }
            Some(info) => {
                log_warning!("Removing stale lock file (process {} no longer running)", info.pid);
            }
            None => log_warning!("Lock file format invalid, removing"),
        }
        let _ = std::fs::remove_file(lock_path);
    }

    bail!("Failed to acquire lock {} after removing a stale lock", lock_path.display())
}

pub fn ensure_single_instance() -> Result<LockFile> {
    ensure_single_instance_at(&lock::get_lock_path())
}

/// Send `signal` to the running instance. Fails when none runs.
pub fn signal_instance(signal: Signal) -> Result<InstanceInfo> {
    let info = get_running_instance().context("No solpaper instance is running")?;
    utils::send_signal(info.pid, signal)?;
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_contents_round_trip() {
        let info = InstanceInfo {
            pid: 4242,
            config_dir: Some(PathBuf::from("/home/user/.config/solpaper-test")),
        };
        let parsed = InstanceInfo::from_lock_contents(&info.to_lock_contents()).unwrap();
        assert_eq!(parsed, info);

        let info = InstanceInfo {
            pid: 7,
            config_dir: None,
        };
        assert_eq!(info.to_lock_contents(), "7\n\n");
        assert_eq!(InstanceInfo::from_lock_contents("7\n\n").unwrap(), info);
    }

    #[test]
    fn test_invalid_lock_contents() {
        assert!(InstanceInfo::from_lock_contents("").is_err());
        assert!(InstanceInfo::from_lock_contents("not-a-pid\n").is_err());
        assert!(InstanceInfo::from_lock_contents("1\n/a\n/b\n").is_err());
    }

    #[test]
    fn test_lock_held_by_live_process_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("solpaper.lock");

        let _held = ensure_single_instance_at(&path).unwrap();
        let err = ensure_single_instance_at(&path).unwrap_err();
        assert!(err.to_string().contains("already running"), "{err}");
    }

    #[test]
    fn test_lock_written_with_current_pid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("solpaper.lock");
        let _lock = ensure_single_instance_at(&path).unwrap();
        let info = read_instance(&path).unwrap();
        assert_eq!(info.pid, std::process::id());
    }
}
