#![forbid(unsafe_code)]

//! Data-integrity errors raised while building or editing models.

use pagecraft_history::{HistoryError, ValueKind};
use thiserror::Error;

/// Errors surfaced to the caller, who may recover by not applying the change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A value does not have the shape its contract or relation declares.
    #[error("invalid data at `{prop}`: expected {expected}, found {found}")]
    InvalidData {
        prop: String,
        expected: String,
        found: ValueKind,
    },

    /// A required field is absent.
    #[error("missing required field `{prop}` for `{tag}`")]
    MissingField { tag: &'static str, prop: String },

    /// The same child was added to a list relation twice.
    #[error("duplicate member in relation `{relation}`")]
    DuplicateMember { relation: String },

    /// Polymorphic child data without a `_type` tag.
    #[error("missing `_type` tag in data at `{prop}`")]
    MissingTypeTag { prop: String },

    /// The `_type` tag is not registered locally or process-wide.
    #[error("could not resolve type `{tag}` at `{prop}`")]
    UnknownType { prop: String, tag: String },

    /// A child bound to another history was offered to a relation.
    #[error("child offered to `{relation}` records into a different history")]
    ForeignHistory { relation: String },

    /// The resolved type is not accepted by the relation.
    #[error("type `{tag}` is not accepted at `{prop}`")]
    TypeMismatch { prop: String, tag: String },

    #[error(transparent)]
    History(#[from] HistoryError),
}

impl ModelError {
    pub(crate) fn invalid(
        prop: impl Into<String>,
        expected: impl Into<String>,
        found: ValueKind,
    ) -> Self {
        Self::InvalidData {
            prop: prop.into(),
            expected: expected.into(),
            found,
        }
    }
}
