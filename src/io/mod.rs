//! Process-level plumbing: instance lock, signals.

pub mod instance;
pub mod lock;
pub mod signals;
