//! Logging bootstrap for processes embedding the edgenet controller.
//!
//! Library crates only emit `tracing` events; installing a subscriber is left to the binary via [`logger_init`].

mod logger;
pub use logger::*;
