//! # elster-transfer
//!
//! Encoder, decoder and process controller for the ELSTER transfer protocol
//! used to file German income tax declarations.
//!
//! The crate is layered:
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`core`] | Shared records, settings and [`ElsterError`] |
//! | [`xml`] | Field trees, request documents and response queries |
//! | [`est`] | Income tax input, validation and field mapping |
//! | [`eric`] | Bindings to the native ERiC library and the session wrapper |
//! | [`process`] | Process and request controllers |
//!
//! Encoding a field map needs no native library:
//!
//! ```rust
//! use elster_transfer::core::{FieldId, FieldMap, FieldValue};
//! use elster_transfer::xml::{FieldTreeNode, encode};
//!
//! let tree = FieldTreeNode::group("ESt1A", vec![
//!     FieldTreeNode::leaves("Art_Erkl", &["E0100001"]),
//!     FieldTreeNode::leaves("Allg", &["E0100201"]),
//! ]);
//! let mut fields = FieldMap::new();
//! fields.insert(FieldId::plain("E0100001"), FieldValue::Single("X".into()));
//!
//! let out = encode(&tree, &fields).unwrap();
//! assert_eq!(out.len(), 1);
//! assert_eq!(out[0].to_xml_string().unwrap(), "<ESt1A><Art_Erkl><E0100001>X</E0100001></Art_Erkl></ESt1A>");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `native` | Link against the ERiC shared library and enable [`eric::NativeEric`] |

pub mod core;
pub mod eric;
pub mod est;
pub mod process;
pub mod xml;

pub use crate::core::{ElsterError, ErrorResponse, Settings};
