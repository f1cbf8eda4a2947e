//! Service startup: resource acquisition and the hand-off to [`Core`].
//!
//! ```no_run
//! use solpaper::Solpaper;
//!
//! # fn main() -> anyhow::Result<()> {
//! // Normal service
//! Solpaper::new(false).run()?;
//!
//! // Simulation: no lock, no header, nothing applied
//! Solpaper::new(true)
//!     .without_lock()
//!     .without_headers()
//!     .dry_run()
//!     .run()?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::backend::create_backend;
use crate::common::logger::Log;
use crate::common::utils::private_path;
use crate::config::{self, Config};
use crate::core::{Core, CoreParams};
use crate::geo::{self, Location, SolarCalculator};
use crate::io::instance;
use crate::io::signals::setup_signal_handler;
use crate::pack::{self, Pack};

/// Configuration, location and pack as loaded from disk.
pub(crate) struct Session {
    pub config_dir: PathBuf,
    pub config: Config,
    pub location: Location,
    pub calculator: Box<dyn SolarCalculator>,
    pub pack: Pack,
}

impl Session {
    /// Load everything the resolver needs, creating defaults on first run.
    pub fn load() -> Result<Self> {
        let config = config::load()?;
        let config_dir = config::get_config_dir()?;
        Self::from_config(config, config_dir)
    }

    pub fn from_config(config: Config, config_dir: PathBuf) -> Result<Self> {
        let location = config
            .location()
            .context("Invalid location in configuration")?;
        let pack_dir = pack::pack_dir(&config_dir, config.pack_name());
        let pack = pack::load_pack(&pack_dir)?;
        let calculator = geo::calculator_for(&location);
        Log::set_schedule_timezone(location.timezone());

        Ok(Self {
            config_dir,
            config,
            location,
            calculator,
            pack,
        })
    }
}

/// Builder for running the service.
pub struct Solpaper {
    debug_enabled: bool,
    create_lock: bool,
    show_headers: bool,
    dry_run: bool,
}

impl Solpaper {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            create_lock: true,
            show_headers: true,
            dry_run: false,
        }
    }

    /// Skip the single-instance lock (simulations may run next to the service).
    pub fn without_lock(mut self) -> Self {
        self.create_lock = false;
        self
    }

    /// Skip the version header when the caller already printed one.
    pub fn without_headers(mut self) -> Self {
        self.show_headers = false;
        self
    }

    /// Log wallpaper changes instead of applying them.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn run(self) -> Result<()> {
        if self.show_headers {
            log_version!();
            if self.debug_enabled {
                log_pipe!();
                log_debug!("Debug mode enabled");
            }
        }

        // Take the lock before anything touches the desktop.
        let _lock = if self.create_lock {
            Some(instance::ensure_single_instance()?)
        } else {
            None
        };

        let session = Session::load()?;
        if let Some(custom_dir) = config::get_custom_config_dir() {
            log_block_start!("Base directory: {}", private_path(&custom_dir));
        }
        session.config.log_config(&session.config_dir);

        let backend = create_backend(&session.config, self.dry_run)?;
        let signal_state = setup_signal_handler(self.debug_enabled)?;

        let watcher = match config::start_config_watcher(
            &session.config_dir,
            &session.pack.dir,
            signal_state.signal_sender.clone(),
            self.debug_enabled,
        ) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                log_warning!("Hot reload unavailable: {e}");
                log_indented!("Use 'solpaper reload' after editing the configuration");
                None
            }
        };

        let core = Core::new(CoreParams {
            config: session.config,
            config_dir: session.config_dir,
            pack: session.pack,
            location: session.location,
            calculator: session.calculator,
            backend,
            signal_state,
            watcher,
            debug_enabled: self.debug_enabled,
            dry_run: self.dry_run,
        });
        core.execute()?;

        log_end!();
        Ok(())
    }
}
