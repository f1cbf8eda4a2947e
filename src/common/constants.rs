//! Application-wide constants and defaults.

use std::time::Duration;

// # Files and directories

/// Directory name under the platform config dir (`~/.config/solpaper`).
pub const APP_DIR_NAME: &str = "solpaper";
pub const CONFIG_FILE_NAME: &str = "solpaper.toml";
/// Optional private override for coordinates, kept next to the main config.
pub const GEO_FILE_NAME: &str = "geo.toml";
/// Packs live in `<config dir>/packs/<name>/`.
pub const PACKS_DIR_NAME: &str = "packs";
pub const PACK_MANIFEST_NAME: &str = "schedule.toml";
pub const PACK_IMAGES_DIR_NAME: &str = "images";
pub const LOCK_FILE_NAME: &str = "solpaper.lock";

// # Configuration defaults

pub const DEFAULT_PACK: &str = "default";
pub const DEFAULT_BACKEND: &str = "auto";
/// Seconds. The loop re-evaluates at least this often.
pub const DEFAULT_MAX_SLEEP: u64 = 300;
pub const MINIMUM_MAX_SLEEP: u64 = 10;
pub const MAXIMUM_MAX_SLEEP: u64 = 3600;

/// Placeholder replaced by the absolute image path in `command` templates.
pub const COMMAND_IMAGE_PLACEHOLDER: &str = "{image}";

// # Schedule limits

/// Largest accepted solar offset in either direction (one day).
pub const MAX_OFFSET_MINUTES: i64 = 24 * 60;

/// Extra days the resolver looks ahead when the three-day window holds no
/// anchor after `now`.
pub const MAX_LOOKAHEAD_DAYS: i64 = 7;

// # Service loop timing

/// Never sleep less than this between cycles.
pub const MINIMUM_SLEEP: Duration = Duration::from_secs(1);
/// First retry delay after a failed wallpaper change, doubled on each failure.
pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(5);
/// Polling granularity for signals while a simulated sleep runs on another thread.
pub const SIMULATION_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// How long `stop` waits for the running instance to exit.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(3);

/// Images smaller than this are flagged by the validator.
pub const MIN_IMAGE_WIDTH: u32 = 1920;
pub const MIN_IMAGE_HEIGHT: u32 = 1080;

/// Image extensions the validator accepts without a warning.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp", "tif", "tiff"];

// # Exit codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
