//! Income tax declaration (ESt) input.
//!
//! Request models, their validation, the translation into ELSTER field
//! values and the electronic Steuernummer.

pub mod input;
pub mod mapping;
pub mod steuernummer;
pub mod validate;

pub use input::*;
pub use mapping::{check_and_generate_entries, religion_code};
pub use steuernummer::{Bundesland, generate_electronic_steuernummer, is_test_bufa, is_valid_bufa};
pub use validate::{validate_est_data, validate_form_data};
