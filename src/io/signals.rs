//! Signal handling for the service.
//!
//! A listener thread turns process signals into [`SignalMessage`]s on a channel.
//! The service loop sleeps on that channel, so any signal wakes it immediately.

use anyhow::{Context, Result};
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR2};
use signal_hook::iterator::Signals;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMessage {
    /// Reload config and pack (SIGUSR2 or a watched file changed).
    Reload,
    /// Stop the service (SIGTERM, SIGINT, SIGHUP).
    Shutdown,
}

/// Channel ends and the running flag shared with the listener thread.
pub struct SignalState {
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
    /// Cloned into the config watcher.
    pub signal_sender: Sender<SignalMessage>,
}

impl SignalState {
    /// A channel with no OS handlers attached, for one-shot runs and tests.
    pub fn detached() -> Self {
        let (signal_sender, signal_receiver) = channel();
        Self {
            running: Arc::new(AtomicBool::new(true)),
            signal_receiver,
            signal_sender,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

fn message_for(signal: i32) -> Option<SignalMessage> {
    match signal {
        SIGUSR2 => Some(SignalMessage::Reload),
        SIGINT | SIGTERM | SIGHUP => Some(SignalMessage::Shutdown),
        _ => None,
    }
}

/// Register the handlers and start the listener thread.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let state = SignalState::detached();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running = Arc::clone(&state.running);
    let sender = state.signal_sender.clone();

    thread::spawn(move || {
        for signal in signals.forever() {
            let Some(message) = message_for(signal) else {
                continue;
            };

            if debug_enabled {
                log_pipe!();
                log_debug!("Received signal {signal}, sending {message:?}");
            }

            if message == SignalMessage::Shutdown {
                running.store(false, Ordering::SeqCst);
            }
            if sender.send(message).is_err() {
                break;
            }
        }
    });

    Ok(state)
}
