//! The service loop.
//!
//! Each cycle resolves the schedule for the current time, applies the active
//! image when it differs from the one on screen, and sleeps until the next
//! segment starts (bounded by `max_sleep`). Sleeping blocks on the signal
//! channel, so reload and shutdown requests interrupt it.
//!
//! Failures never stop the loop: a failed apply or reload is logged, the
//! previous wallpaper and configuration stay in place, and the step is retried
//! with exponential backoff.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_tz::Tz;
use std::path::PathBuf;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use crate::backend::{self, WallpaperBackend};
use crate::common::constants::*;
use crate::common::logger::Log;
use crate::common::utils::{format_duration, private_path};
use crate::config::{self, Config, ConfigWatcher};
use crate::geo::{self, Location, SolarCalculator};
use crate::io::signals::{SignalMessage, SignalState};
use crate::pack::{self, Pack};
use crate::schedule::{self, ScheduleResult};
use crate::time_source;

/// Everything [`Core`] needs, bundled to keep the constructor readable.
pub(crate) struct CoreParams {
    pub config: Config,
    pub config_dir: PathBuf,
    pub pack: Pack,
    pub location: Location,
    pub calculator: Box<dyn SolarCalculator>,
    pub backend: Box<dyn WallpaperBackend>,
    pub signal_state: SignalState,
    pub watcher: Option<ConfigWatcher>,
    pub debug_enabled: bool,
    pub dry_run: bool,
}

pub(crate) struct Core {
    config: Config,
    config_dir: PathBuf,
    pack: Pack,
    location: Location,
    calculator: Box<dyn SolarCalculator>,
    backend: Box<dyn WallpaperBackend>,
    signal_state: SignalState,
    watcher: Option<ConfigWatcher>,
    debug_enabled: bool,
    dry_run: bool,
    // Loop bookkeeping
    apply_failures: u32,
    reload_failures: u32,
    reload_pending: bool,
    announced_change: Option<DateTime<Tz>>,
    logged_date: Option<NaiveDate>,
}

/// Delay before retry number `failures` (1-based): 5 s doubling, capped by `ceiling`.
pub(crate) fn retry_delay(failures: u32, ceiling: Duration) -> Duration {
    let exponent = failures.saturating_sub(1).min(16);
    RETRY_BASE_DELAY
        .saturating_mul(1 << exponent)
        .min(ceiling)
        .max(MINIMUM_SLEEP)
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        Self {
            config: params.config,
            config_dir: params.config_dir,
            pack: params.pack,
            location: params.location,
            calculator: params.calculator,
            backend: params.backend,
            signal_state: params.signal_state,
            watcher: params.watcher,
            debug_enabled: params.debug_enabled,
            dry_run: params.dry_run,
            apply_failures: 0,
            reload_failures: 0,
            reload_pending: false,
            announced_change: None,
            logged_date: None,
        }
    }

    /// Run until a shutdown request or the end of a simulation.
    pub fn execute(mut self) -> Result<()> {
        log_block_start!("Using {} backend", self.backend.backend_name());
        log_indented!("Pack: {} ({})", self.pack.name(), private_path(&self.pack.dir));
        log_indented!("Location: {}", self.location);

        // The wallpaper on screen is unknown at startup, so the first cycle applies.
        let mut applied: Option<PathBuf> = None;

        while self.signal_state.is_running() && !time_source::simulation_ended() {
            let now = time_source::now();
            let sleep = self.run_cycle(&now, &mut applied);

            match self.wait(sleep) {
                Some(SignalMessage::Reload) => {
                    log_block_start!("Reload requested");
                    self.reload_pending = true;
                    self.reload_failures = 0;
                }
                Some(SignalMessage::Shutdown) => break,
                None => {}
            }
        }

        log_block_start!("Shutting down solpaper...");
        Ok(())
    }

    /// One resolve-and-apply step at `now`. Returns how long to sleep.
    ///
    /// `applied` is the image currently on screen. It is updated only after a
    /// successful apply.
    pub fn run_cycle<Z: TimeZone>(
        &mut self,
        now: &DateTime<Z>,
        applied: &mut Option<PathBuf>,
    ) -> Duration {
        let ceiling = self.config.max_sleep();
        let now = now.with_timezone(&self.location.timezone());

        let mut retry: Option<Duration> = None;
        if self.reload_pending {
            match self.reload() {
                Ok(()) => {
                    self.reload_pending = false;
                    self.reload_failures = 0;
                }
                Err(e) => {
                    self.reload_failures += 1;
                    let delay = retry_delay(self.reload_failures, ceiling);
                    log_error!("Reload failed, keeping the previous configuration: {e:#}");
                    log_indented!("Retrying in {}", format_duration(delay));
                    retry = Some(delay);
                }
            }
        }

        self.log_events_once_per_day(now.date_naive());

        let result = match schedule::resolve(
            &self.pack.model,
            &self.location,
            &now,
            self.calculator.as_ref(),
        ) {
            Ok(result) => result,
            Err(e) => {
                log_error!("Schedule resolution failed: {e}");
                return ceiling;
            }
        };

        if applied.as_deref() != Some(result.active_image.as_path()) {
            match backend::apply_image(self.backend.as_mut(), &result.active_image) {
                Ok(()) => {
                    self.apply_failures = 0;
                    self.log_applied(&result);
                    *applied = Some(result.active_image.clone());
                }
                Err(e) => {
                    self.apply_failures += 1;
                    let delay = retry_delay(self.apply_failures, ceiling);
                    log_error!("Failed to apply wallpaper: {e:#}");
                    log_indented!(
                        "Keeping the current wallpaper, retrying in {}",
                        format_duration(delay)
                    );
                    retry = Some(retry.map_or(delay, |r| r.min(delay)));
                }
            }
        }

        let until_change = result.time_until_change(&now);
        self.announce_next_change(&result, until_change);

        let sleep = until_change.min(ceiling);
        let sleep = retry.map_or(sleep, |r| r.min(sleep)).max(MINIMUM_SLEEP);

        if self.debug_enabled {
            log_debug!("Sleeping for {}", format_duration(sleep));
        }
        sleep
    }

    fn log_applied(&self, result: &ScheduleResult) {
        let name = self
            .pack
            .model
            .get(result.active_index)
            .map(|s| s.display_name())
            .unwrap_or_default();
        log_block_start!(
            "Wallpaper: {} (since {})",
            name,
            result.active_since.format("%H:%M:%S")
        );
        log_indented!("{}", private_path(&result.active_image));
        if let Some(fallback) = &result.fallback
            && self.debug_enabled
        {
            log_debug!("Polar fallback: {fallback}");
        }
    }

    fn announce_next_change(&mut self, result: &ScheduleResult, until_change: Duration) {
        if self.announced_change == Some(result.next_change_at) {
            return;
        }
        self.announced_change = Some(result.next_change_at);

        let next = self
            .pack
            .model
            .get(result.next_index)
            .map(|s| s.display_name())
            .unwrap_or_default();
        log_decorated!(
            "Next change at {} ({}) in {}",
            result.next_change_at.format("%Y-%m-%d %H:%M:%S"),
            next,
            format_duration(until_change)
        );
    }

    fn log_events_once_per_day(&mut self, date: NaiveDate) {
        if !self.debug_enabled || self.logged_date == Some(date) {
            return;
        }
        self.logged_date = Some(date);
        match self.calculator.resolve_events(date, &self.location) {
            Ok(events) => geo::log_solar_events(&events, &self.location, self.calculator.name()),
            Err(e) => log_warning!("Could not calculate solar events: {e}"),
        }
    }

    /// Block for `duration` or until a message arrives.
    fn wait(&self, duration: Duration) -> Option<SignalMessage> {
        let receiver = &self.signal_state.signal_receiver;

        if !time_source::is_simulated() {
            return match receiver.recv_timeout(duration) {
                Ok(message) => Some(message),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => {
                    log_error!("Signal channel disconnected, signals are no longer handled");
                    std::thread::sleep(duration);
                    None
                }
            };
        }

        // Simulated time advances in its own thread; poll the channel meanwhile.
        let sleeper = std::thread::spawn(move || time_source::sleep(duration));
        loop {
            match receiver.recv_timeout(SIMULATION_POLL_INTERVAL) {
                Ok(SignalMessage::Shutdown) => return Some(SignalMessage::Shutdown),
                Ok(message) => {
                    // Let the clock finish this step before the next cycle reads it.
                    let _ = sleeper.join();
                    return Some(message);
                }
                Err(RecvTimeoutError::Timeout) if sleeper.is_finished() => return None,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    let _ = sleeper.join();
                    return None;
                }
            }
        }
    }

    /// Re-read config and pack from disk. On error nothing is replaced.
    fn reload(&mut self) -> Result<()> {
        let config = config::load_from_path(&self.config_dir.join(CONFIG_FILE_NAME))?;
        let pack_dir = pack::pack_dir(&self.config_dir, config.pack_name());
        let pack = pack::load_pack(&pack_dir)?;
        let location = config.location().context("Invalid location")?;
        let backend_changed =
            config.backend() != self.config.backend() || config.command != self.config.command;
        let backend = if backend_changed {
            Some(backend::create_backend(&config, self.dry_run)?)
        } else {
            None
        };

        if pack.dir != self.pack.dir
            && let Some(watcher) = self.watcher.as_mut()
            && let Err(e) = watcher.watch_pack(&pack.dir)
        {
            log_warning!("Changes to the new pack will not be picked up: {e}");
        }

        log_decorated!("Configuration reloaded");
        if pack.dir != self.pack.dir {
            log_indented!("Switched to pack {}", pack.name());
        }
        if let Some(backend) = backend {
            log_indented!("Switched to {} backend", backend.backend_name());
            self.backend = backend;
        }

        Log::set_schedule_timezone(location.timezone());
        self.calculator = geo::calculator_for(&location);
        self.location = location;
        self.pack = pack;
        self.config = config;
        self.announced_change = None;
        self.logged_date = None;
        Ok(())
    }

    #[cfg(test)]
    fn pack_dir(&self) -> &std::path::Path {
        &self.pack.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockWallpaperBackend;
    use crate::geo::{FixedSolarTimes, SolarEvent};
    use crate::pack::PackMeta;
    use crate::schedule::{Anchor, Segment, SegmentModel};
    use serial_test::serial;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// A pack directory with `day.jpg` at sunrise and `night.jpg` at sunset.
    fn day_night_pack(dir: &Path) -> Pack {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("day.jpg"), b"").unwrap();
        fs::write(dir.join("night.jpg"), b"").unwrap();
        Pack {
            dir: dir.to_path_buf(),
            meta: PackMeta::default(),
            model: SegmentModel::new(vec![
                Segment::new(Anchor::solar(SolarEvent::Sunrise, 0), dir.join("day.jpg")),
                Segment::new(Anchor::solar(SolarEvent::Sunset, 0), dir.join("night.jpg")),
            ]),
        }
    }

    fn core_with(backend: MockWallpaperBackend, pack: Pack, config_dir: &Path) -> Core {
        Core::new(CoreParams {
            config: Config::default(),
            config_dir: config_dir.to_path_buf(),
            pack,
            location: Location::timezone_only(chrono_tz::UTC),
            calculator: Box::new(FixedSolarTimes),
            backend: Box::new(backend),
            signal_state: SignalState::detached(),
            watcher: None,
            debug_enabled: false,
            dry_run: true,
        })
    }

    fn at(hour: u32, minute: u32) -> DateTime<Tz> {
        chrono_tz::UTC
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_opt(hour, minute, 0)
                    .unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn test_applies_only_when_image_changes() {
        let dir = TempDir::new().unwrap();
        let pack = day_night_pack(&dir.path().join("pack"));
        let day = pack.dir.join("day.jpg");
        let night = pack.dir.join("night.jpg");

        let mut backend = MockWallpaperBackend::new();
        let expected_day = day.clone();
        backend
            .expect_apply()
            .withf(move |path| path == expected_day)
            .times(1)
            .returning(|_| Ok(()));
        let expected_night = night.clone();
        backend
            .expect_apply()
            .withf(move |path| path == expected_night)
            .times(1)
            .returning(|_| Ok(()));

        let mut core = core_with(backend, pack, dir.path());
        let mut applied = None;

        core.run_cycle(&at(9, 0), &mut applied);
        assert_eq!(applied.as_deref(), Some(day.as_path()));
        core.run_cycle(&at(12, 0), &mut applied);
        core.run_cycle(&at(19, 0), &mut applied);
        assert_eq!(applied.as_deref(), Some(night.as_path()));
    }

    #[test]
    fn test_sleep_is_bounded_by_next_change_and_ceiling() {
        let dir = TempDir::new().unwrap();
        let pack = day_night_pack(&dir.path().join("pack"));

        let mut backend = MockWallpaperBackend::new();
        backend.expect_apply().returning(|_| Ok(()));
        let mut core = core_with(backend, pack, dir.path());
        let mut applied = None;

        // Fixed sunset is 18:30; two minutes away.
        let sleep = core.run_cycle(&at(18, 28), &mut applied);
        assert_eq!(sleep, Duration::from_secs(120));

        // Hours away: the default ceiling applies.
        let sleep = core.run_cycle(&at(12, 0), &mut applied);
        assert_eq!(sleep, Duration::from_secs(DEFAULT_MAX_SLEEP));
    }

    #[test]
    fn test_failed_apply_keeps_wallpaper_and_backs_off() {
        let dir = TempDir::new().unwrap();
        let pack = day_night_pack(&dir.path().join("pack"));

        let mut backend = MockWallpaperBackend::new();
        backend
            .expect_apply()
            .times(3)
            .returning(|_| Err(anyhow::anyhow!("compositor went away")));
        let mut core = core_with(backend, pack, dir.path());
        let mut applied = None;

        assert_eq!(core.run_cycle(&at(9, 0), &mut applied), Duration::from_secs(5));
        assert_eq!(core.run_cycle(&at(9, 0), &mut applied), Duration::from_secs(10));
        assert_eq!(core.run_cycle(&at(9, 0), &mut applied), Duration::from_secs(20));
        assert!(applied.is_none());
    }

    #[test]
    fn test_retry_delay_is_capped() {
        let ceiling = Duration::from_secs(60);
        assert_eq!(retry_delay(1, ceiling), Duration::from_secs(5));
        assert_eq!(retry_delay(4, ceiling), Duration::from_secs(40));
        assert_eq!(retry_delay(5, ceiling), ceiling);
        assert_eq!(retry_delay(500, ceiling), ceiling);
    }

    #[test]
    fn test_failed_reload_keeps_previous_pack() {
        let dir = TempDir::new().unwrap();
        let pack = day_night_pack(&dir.path().join("pack"));
        let original = pack.dir.clone();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "max_sleep = \"soon\"\n").unwrap();

        let mut backend = MockWallpaperBackend::new();
        backend.expect_apply().returning(|_| Ok(()));
        let mut core = core_with(backend, pack, dir.path());
        core.reload_pending = true;

        let mut applied = None;
        let sleep = core.run_cycle(&at(9, 0), &mut applied);
        assert_eq!(sleep, Duration::from_secs(5));
        assert!(core.reload_pending);
        assert_eq!(core.pack_dir(), original.as_path());
        assert!(applied.is_some());
    }

    #[test]
    #[serial]
    fn test_reload_switches_pack_and_timezone() {
        let dir = TempDir::new().unwrap();
        let old_pack = day_night_pack(&dir.path().join("packs").join("old"));

        let new_dir = dir.path().join("packs").join("coastal");
        fs::create_dir_all(&new_dir).unwrap();
        fs::write(new_dir.join("sea.jpg"), b"").unwrap();
        fs::write(
            new_dir.join(PACK_MANIFEST_NAME),
            "[[segments]]\nstart = \"00:00\"\nimage = \"sea.jpg\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "pack = \"coastal\"\ntimezone = \"Asia/Tokyo\"\n",
        )
        .unwrap();

        let sea = new_dir.join("sea.jpg");
        let mut backend = MockWallpaperBackend::new();
        let expected = sea.clone();
        backend
            .expect_apply()
            .withf(move |path| path == expected)
            .times(1)
            .returning(|_| Ok(()));
        let mut core = core_with(backend, old_pack, dir.path());
        core.reload_pending = true;

        // Pretend the old pack's day image is on screen.
        let mut applied = Some(dir.path().join("packs/old/day.jpg"));
        core.run_cycle(&at(9, 0), &mut applied);

        assert!(!core.reload_pending);
        assert_eq!(core.pack_dir(), new_dir.as_path());
        assert_eq!(applied.as_deref(), Some(sea.as_path()));
        assert_eq!(core.location.timezone(), chrono_tz::Asia::Tokyo);
        assert_eq!(Log::schedule_timezone(), Some(chrono_tz::Asia::Tokyo));
    }
}
