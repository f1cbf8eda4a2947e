//! Structured logging with box-drawing output.
//!
//! Every line the binary prints goes through the macros in this module so that
//! output stays visually consistent and can be silenced or redirected to a file
//! (used by `solpaper simulate --log`).
//!
//! ## Conventions
//!
//! - `log_version!` opens the output with `┏ solpaper vX.Y.Z ━━╸`.
//! - `log_block_start!` starts a new conceptual block: an empty `┃` line, then `┣ message`.
//! - `log_decorated!` continues a block with `┣ message`.
//! - `log_indented!` prints nested details as `┃   message`.
//! - `log_pipe!` prints a lone `┃`, mostly before a level macro that opens a new block.
//! - `log_end!` closes the output with `╹`.
//! - `log_info!`, `log_warning!`, `log_error!`, `log_debug!`, `log_critical!` print a
//!   colored `[LEVEL]` tag after the pipe.
//! - `log_error_exit!` ends a flow with `┗[ERROR]`.
//! - `log_warning_standalone!` and `log_error_standalone!` print the tag without any
//!   box drawing, for output that happens outside the main flow (argument errors).
//!
//! While a simulated clock is active each line is prefixed with the simulated time,
//! shown in the schedule's timezone when one was registered with
//! [`Log::set_schedule_timezone`].

use std::io::Write;
use std::sync::{OnceLock, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

static SCHEDULE_TIMEZONE: RwLock<Option<chrono_tz::Tz>> = RwLock::new(None);

// Present only while `--log` routes output into a file.
static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Line(String),
    Shutdown,
}

/// Handle for the global logger state.
pub struct Log;

impl Log {
    /// Enable or disable all output.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Register the timezone the schedule is evaluated in. A reload may replace it.
    pub fn set_schedule_timezone(tz: chrono_tz::Tz) {
        if let Ok(mut current) = SCHEDULE_TIMEZONE.write() {
            *current = Some(tz);
        }
    }

    pub fn schedule_timezone() -> Option<chrono_tz::Tz> {
        SCHEDULE_TIMEZONE.read().ok().and_then(|tz| *tz)
    }

    /// Route all further output into `file_path` until the guard is dropped.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("File logging already started"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::File::create(&file_path)?;
            while let Ok(LogMessage::Line(text)) = rx.recv() {
                file.write_all(text.as_bytes())?;
            }
            file.flush()?;
            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Timestamp prefix for simulation runs, empty otherwise.
    ///
    /// Shows `[HH:MM:SS] ` in the schedule timezone, or `[HH:MM:SSS] [HH:MM:SSL] `
    /// when the schedule timezone and the machine's local timezone disagree.
    pub fn timestamp_prefix() -> String {
        if !(crate::time_source::is_initialized() && crate::time_source::is_simulated()) {
            return String::new();
        }

        let local_now = crate::time_source::now();
        let local_str = local_now.format("%H:%M:%S").to_string();

        match Log::schedule_timezone() {
            Some(tz) => {
                let schedule_str = local_now.with_timezone(&tz).format("%H:%M:%S").to_string();
                if schedule_str == local_str {
                    format!("[{local_str}] ")
                } else {
                    format!("[{schedule_str}S] [{local_str}L] ")
                }
            }
            None => format!("[{local_str}] "),
        }
    }
}

/// Flushes and closes the log file when dropped.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Remove `ESC [ ... m` color sequences.
fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for skipped in chars.by_ref() {
                if skipped == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Write one already formatted chunk to stdout or the log file.
pub fn write_output(text: &str) {
    if let Some(tx) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Line(strip_ansi_codes(text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

/// Shared body of every logging macro: `$layout` receives the timestamp prefix and
/// the rendered message and returns the full text to write.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_line {
    ($layout:expr, $($arg:tt)+) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::timestamp_prefix();
            let message = format!($($arg)+);
            let layout: fn(&str, &str) -> String = $layout;
            $crate::common::logger::write_output(&layout(&prefix, &message));
        }
    }};
}

/// Continue the current block: `┣ message`.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}┣ {m}\n"), $($arg)+)
    };
}

/// Nested detail line: `┃   message`.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}┃   {m}\n"), $($arg)+)
    };
}

/// Blank spacer line: `┃`.
#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::__log_line!(|p, _| format!("{p}┃\n"), "")
    };
}

/// Start a new block with a spacer above it.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}┃\n{p}┣ {m}\n"), $($arg)+)
    };
}

/// Application header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::__log_line!(
            |p, m| format!("{p}┏ solpaper v{m} ━━╸\n"),
            "{}",
            env!("CARGO_PKG_VERSION")
        )
    };
}

/// Final marker: `╹`.
#[macro_export]
macro_rules! log_end {
    () => {
        $crate::__log_line!(|p, _| format!("{p}╹\n"), "")
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}┣[\x1b[33mWARNING\x1b[0m] {m}\n"), $($arg)+)
    };
}

/// Warning outside the box-drawing flow.
#[macro_export]
macro_rules! log_warning_standalone {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}[\x1b[33mWARNING\x1b[0m] {m}\n"), $($arg)+)
    };
}

/// Error outside the box-drawing flow.
#[macro_export]
macro_rules! log_error_standalone {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}[\x1b[31mERROR\x1b[0m] {m}\n"), $($arg)+)
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}┣[\x1b[31mERROR\x1b[0m] {m}\n"), $($arg)+)
    };
}

/// Error that terminates the current flow: `┗[ERROR] message`.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => {
        $crate::__log_line!(
            |p, m| format!("{p}┃\n{p}┗[\x1b[31mERROR\x1b[0m] {m}\n"),
            $($arg)+
        )
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}┣[\x1b[32mINFO\x1b[0m] {m}\n"), $($arg)+)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}┣[\x1b[36mDEBUG\x1b[0m] {m}\n"), $($arg)+)
    };
}

#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => {
        $crate::__log_line!(|p, m| format!("{p}┣[\x1b[31mCRITICAL\x1b[0m] {m}\n"), $($arg)+)
    };
}
