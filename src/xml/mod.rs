//! ELSTER XML: field trees, request documents and response queries.

pub mod assembler;
pub mod element;
pub mod est_tree;
pub mod field_tree;
pub mod parse;
pub mod transfer_header;
pub mod xml_utils;

pub use assembler::{
    DocumentAssembler, RequestPayload, compute_valid_until_date, e10_namespace, get_belege_xml,
};
pub use element::Element;
pub use est_tree::est_trees;
pub use field_tree::{FieldGroup, FieldTreeNode, encode, encode_all};
pub use transfer_header::RequestKind;
