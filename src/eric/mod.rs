//! ERiC transport layer.
//!
//! [`EricBindings`] is the raw call surface, implemented by [`NativeEric`]
//! (feature `native`) or by a test double. [`EricSession`] wraps it in typed
//! calls with scoped buffers and certificate handles, and [`EricError`] maps
//! result codes onto the error taxonomy reported to callers.

pub mod bindings;
pub mod codes;
pub mod errors;
pub mod wrapper;

#[cfg(feature = "native")]
mod native;
#[cfg(feature = "native")]
mod sys;

pub use bindings::{
    BufferHandle, CertHandle, CryptParams, EricBindings, InstanceHandle, PrintParams, ProcessArgs,
    TransferHeaderArgs,
};
pub use codes::{ResultCategory, result_code_name};
pub use errors::{EricError, ProcessFailure, ServerErrorMessage};
#[cfg(feature = "native")]
pub use native::NativeEric;
pub use wrapper::{ERIC_DRUCKE, ERIC_SENDE, ERIC_VALIDIERE, EricSession, verify_using_stick, with_session};
