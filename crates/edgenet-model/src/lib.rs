//! Data model shared by the edgenet controller crates.
//!
//! Everything here is plain data: identifiers, object metadata and the
//! lifecycle-marker set helpers. Store access and reconciliation live in
//! `edgenet-core`.

mod domain;
pub use domain::*;

mod error;
pub use error::ModelError;
