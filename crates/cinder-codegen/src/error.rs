//! Emission errors

use cinder_bytecode::StringTableError;
use thiserror::Error;

/// Result alias for emission operations
pub type EmitResult<T> = Result<T, EmitError>;

/// Errors that abort an emission session
///
/// Emission is a pure, deterministic transform: none of these are
/// retryable, and any of them leaves the session's output unusable.
#[derive(Debug, Error)]
pub enum EmitError {
    /// String interning failed (table exhausted or unrepresentable value)
    #[error("String table error: {0}")]
    Strings(#[from] StringTableError),

    /// A construction scope closed after the one-byte end index ran out
    #[error(
        "Construction scope closed at instruction count {op_count}, \
         which does not fit the one-byte end index"
    )]
    ScopeOverflow {
        /// Instruction count at resolution time
        op_count: u32,
    },

    /// A close was requested with no construction scope open
    #[error("No construction scope is open")]
    NoOpenScope,

    /// The session finished with construction scopes still open
    #[error("{count} construction scope(s) still open at finish")]
    UnclosedScope {
        /// Number of scopes left open
        count: usize,
    },

    /// A patch site was resolved twice (an internal invariant violation)
    #[error("Patch site at byte {position} resolved twice")]
    PatchAlreadyResolved {
        /// Buffer position of the placeholder byte
        position: usize,
    },
}
