// Shared plumbing used by every other module.
// The logger must come first so its macros are in scope everywhere.
#[macro_use]
pub mod logger;

pub mod constants;
pub mod utils;
