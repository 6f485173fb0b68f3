//! Error types for the ledger core.

use std::io;
use thiserror::Error;

/// Result type for ledger operations.
pub type DbResult<T> = Result<T, DbError>;

/// Referential-integrity violations.
///
/// Always returned synchronously; the registry is left unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// Removal was attempted on an entity that transactions, splits, or
    /// schedules still point to.
    #[error("{kind} \"{name}\" is still referenced ({refs} references)")]
    StillReferenced {
        /// Entity kind.
        kind: &'static str,
        /// Entity name.
        name: String,
        /// Outstanding reference count.
        refs: u32,
    },

    /// Removal was attempted on an account that other accounts link to.
    #[error("account \"{name}\" is the link target of {links} account(s)")]
    StillLinked {
        /// Account name.
        name: String,
        /// Outstanding link count.
        links: u32,
    },

    /// An insert or rename collided with an existing name.
    #[error("{kind} name \"{name}\" already exists")]
    DuplicateName {
        /// Entity kind.
        kind: &'static str,
        /// The colliding name.
        name: String,
    },

    /// An ID did not name a live element.
    #[error("no {kind} with id {id}")]
    UnknownElement {
        /// Entity kind.
        kind: &'static str,
        /// The unknown ID.
        id: u64,
    },
}

impl IntegrityError {
    /// Creates an unknown element error.
    pub fn unknown(kind: &'static str, id: impl Into<u64>) -> Self {
        Self::UnknownElement {
            kind,
            id: id.into(),
        }
    }
}

/// Top-level error for ledger load/save and mutation.
#[derive(Debug, Error)]
pub enum DbError {
    /// A record failed to decode.
    #[error("decode error: {0}")]
    Decode(#[from] tally_codec::DecodeError),

    /// The stream's framing was corrupt or truncated.
    #[error("framing error: {0}")]
    Framing(#[from] tally_framing::FramingError),

    /// A referential-integrity violation.
    #[error("integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    /// A filesystem failure during load or save.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
