//! Small helpers shared across commands and the service loop.

use std::path::Path;
use std::time::Duration;

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

/// Display a path with the home directory replaced by `~`.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(rest) = path.strip_prefix(&home)
    {
        if rest.as_os_str().is_empty() {
            return "~".to_string();
        }
        return format!("~/{}", rest.display());
    }
    path.display().to_string()
}

/// Whether a process with this PID exists (signal 0 check).
pub fn is_process_running(pid: u32) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    kill(Pid::from_raw(raw), None).is_ok()
}

/// Deliver `signal` to `pid`.
pub fn send_signal(pid: u32, signal: Signal) -> anyhow::Result<()> {
    let raw = i32::try_from(pid).map_err(|_| anyhow::anyhow!("PID {pid} is out of range"))?;
    kill(Pid::from_raw(raw), signal)
        .map_err(|e| anyhow::anyhow!("Failed to send {signal} to process {pid}: {e}"))
}

/// Human readable duration such as `2h 05m`, `4m 30s` or `12s`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_picks_largest_units() {
        assert_eq!(format_duration(Duration::from_secs(7500)), "2h 05m");
        assert_eq!(format_duration(Duration::from_secs(270)), "4m 30s");
        assert_eq!(format_duration(Duration::from_secs(12)), "12s");
        assert_eq!(format_duration(Duration::ZERO), "0s");
    }

    #[test]
    fn test_private_path_outside_home_is_unchanged() {
        let path = Path::new("/usr/share/backgrounds/dawn.png");
        assert_eq!(private_path(path), "/usr/share/backgrounds/dawn.png");
    }

    #[test]
    fn test_private_path_hides_home() {
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".config/solpaper/solpaper.toml");
            assert_eq!(private_path(&path), "~/.config/solpaper/solpaper.toml");
        }
    }

    #[test]
    fn test_current_process_is_running() {
        assert!(is_process_running(std::process::id()));
    }
}
