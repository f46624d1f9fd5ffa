//! Typed failures returned by the lifecycle engine and the ticket composer.
//! All of them are recoverable: the front-end shows the message inline and
//! lets the user correct the input.

use thiserror::Error;

use crate::models::EntityKind;

#[derive(Debug, Error)]
pub enum DeskError {
    /// A live (active or inactive) record already holds this key.
    #[error("{kind} code {key} already exists")]
    DuplicateKey { kind: EntityKind, key: String },

    /// A ticket points at a student, faculty or program that is absent or removed.
    #[error("{kind} {key} does not exist")]
    MissingReference { kind: EntityKind, key: String },

    #[error("{field} {reason}")]
    Validation { field: &'static str, reason: String },

    /// Update or status change on a key that is absent or removed.
    #[error("{kind} {key} not found")]
    NotFound { kind: EntityKind, key: String },

    /// The highest live ticket already carries the largest representable number.
    #[error("no ticket number is left after {last}")]
    SequenceExhausted { last: String },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type Result<T, E = DeskError> = std::result::Result<T, E>;

impl DeskError {
    pub(crate) fn blank(field: &'static str) -> Self {
        DeskError::Validation {
            field,
            reason: "is required".to_string(),
        }
    }

    pub(crate) fn not_found(kind: EntityKind, key: &str) -> Self {
        DeskError::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}
