//! One-shot command handlers.
//!
//! Commands that only read (`status`, `schedule`, `validate`, `packs`) work
//! whether or not the service runs. `reload` and `stop` talk to the running
//! service through signals.

pub mod apply;
pub mod help;
pub mod packs;
pub mod reload;
pub mod schedule;
pub mod simulate;
pub mod status;
pub mod stop;
pub mod validate;
