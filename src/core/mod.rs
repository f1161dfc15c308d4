//! Shared types, errors and settings.
//!
//! Everything here is used by more than one layer of the filing pipeline:
//! the field map handed to the encoder, the Vorsatz and transfer header
//! records handed to the assembler, the raw and decoded ERiC responses, and
//! the crate-wide [`ElsterError`].

mod config;
mod error;
mod types;

pub use config::*;
pub use error::*;
pub use types::*;
