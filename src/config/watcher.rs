//! Hot reload: watch the config files and the active pack's manifest.
//!
//! Directories are watched rather than files, since editors commonly replace a
//! file instead of writing it in place.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::common::constants::{CONFIG_FILE_NAME, GEO_FILE_NAME, PACK_MANIFEST_NAME};
use crate::common::utils::private_path;
use crate::io::signals::SignalMessage;

/// Editors often write several events per save.
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Files whose changes trigger a reload.
type WatchedFiles = Arc<Mutex<HashSet<PathBuf>>>;

/// Keeps the underlying watcher alive. Dropping it stops watching.
pub struct ConfigWatcher {
    watcher: RecommendedWatcher,
    files: WatchedFiles,
    watched_dirs: HashSet<PathBuf>,
    debug_enabled: bool,
}

impl ConfigWatcher {
    fn watch_file(&mut self, file: PathBuf) -> Result<()> {
        if let Some(dir) = file.parent()
            && dir.is_dir()
            && self.watched_dirs.insert(dir.to_path_buf())
        {
            self.watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .with_context(|| format!("Failed to watch directory: {}", private_path(dir)))?;
        }
        if self.debug_enabled {
            log_indented!("Watching: {}", private_path(&file));
        }
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file);
        Ok(())
    }

    /// Follow a different pack after a reload switched packs.
    pub fn watch_pack(&mut self, pack_dir: &Path) -> Result<()> {
        let manifest = pack_dir.join(PACK_MANIFEST_NAME);
        let already = self
            .files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&manifest);
        if already {
            return Ok(());
        }
        self.watch_file(manifest)
    }

    pub fn watched_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<_> = self
            .files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();
        files.sort();
        files
    }
}

/// Whether an event touches a watched file, counting editor temp files named
/// after it (`solpaper.toml~`, `schedule.toml.swp`).
fn affects(event: &Event, files: &HashSet<PathBuf>) -> bool {
    event.paths.iter().any(|path| {
        files.iter().any(|watched| {
            if path == watched {
                return true;
            }
            let same_dir = path.parent() == watched.parent();
            let name = path.file_name().and_then(|n| n.to_str());
            let watched_name = watched.file_name().and_then(|n| n.to_str());
            match (name, watched_name) {
                (Some(name), Some(watched_name)) => same_dir && name.starts_with(watched_name),
                _ => false,
            }
        })
    })
}

fn forward_events(
    rx: Receiver<Event>,
    files: WatchedFiles,
    signal_sender: Sender<SignalMessage>,
    debug_enabled: bool,
) {
    let mut last_reload: Option<Instant> = None;

    for event in rx {
        let relevant = {
            let files = files.lock().unwrap_or_else(PoisonError::into_inner);
            affects(&event, &files)
        };
        if !relevant {
            continue;
        }

        if last_reload.is_some_and(|at| at.elapsed() < DEBOUNCE) {
            continue;
        }

        if debug_enabled {
            log_pipe!();
            log_info!("Configuration change detected");
            for path in &event.paths {
                log_indented!("Changed: {}", private_path(path));
            }
        }

        if signal_sender.send(SignalMessage::Reload).is_err() {
            break;
        }
        last_reload = Some(Instant::now());
    }
}

/// Start watching `config_dir` and the manifest in `pack_dir`. Changes send
/// [`SignalMessage::Reload`].
pub fn start_config_watcher(
    config_dir: &Path,
    pack_dir: &Path,
    signal_sender: Sender<SignalMessage>,
    debug_enabled: bool,
) -> Result<ConfigWatcher> {
    let (tx, rx) = std::sync::mpsc::channel();

    let watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res
                && matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                )
            {
                let _ = tx.send(event);
            }
        },
        NotifyConfig::default(),
    )
    .context("Failed to create file watcher")?;

    let files: WatchedFiles = Arc::default();
    let mut config_watcher = ConfigWatcher {
        watcher,
        files: Arc::clone(&files),
        watched_dirs: HashSet::new(),
        debug_enabled,
    };

    if debug_enabled {
        log_pipe!();
        log_debug!("Starting config watcher for hot reload:");
    }
    config_watcher.watch_file(config_dir.join(CONFIG_FILE_NAME))?;
    config_watcher.watch_file(config_dir.join(GEO_FILE_NAME))?;
    config_watcher.watch_pack(pack_dir)?;

    thread::spawn(move || forward_events(rx, files, signal_sender, debug_enabled));

    Ok(config_watcher)
}
