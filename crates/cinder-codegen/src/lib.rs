//! Cinder bytecode emission backend
//!
//! This crate turns fully resolved, high-level statements (field
//! assignments, array assignments, object construction blocks) into the
//! byte stream and string table the Cinder VM consumes. The VM addresses
//! fields through selector registers (current object, current field), so
//! each statement decomposes into a fixed opcode sequence; construction
//! blocks have unknown extent until closed and are finished by patching a
//! placeholder recorded at open time.
//!
//! One [`CodeEmitter`] session exists per compilation unit and owns all
//! emission state. Sessions are strictly single-threaded: calls mutate the
//! shared table and buffer in call order.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod emitter;
pub mod error;
pub mod protocol;
pub mod request;
mod scope;

pub use emitter::{CodeEmitter, FieldKind};
pub use error::{EmitError, EmitResult};
pub use protocol::{FieldValue, IndexValue};
pub use request::{compile, Request};
pub use scope::ScopeId;
