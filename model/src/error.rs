//! Errors produced while building, validating, decoding or encoding a
//! document.
//!
//! Every error carries a document path (for example
//! `types/pous/pou[Main]/body/FBD`) and the offending id, name or tag so
//! that the problem can be found in the source document. Each error also
//! maps to a stable [`Problem`] code.

use plcopen_problems::Problem;
use thiserror::Error;

use crate::graph::LocalId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A choice group has zero or more than one populated alternative.
    #[error("{path}: expected exactly one alternative, found [{}]", .found.join(", "))]
    InvalidChoice { path: String, found: Vec<String> },

    /// A tag or token is not one of the alternatives known at this point.
    #[error("{path}: unknown element or token '{tag}'")]
    UnknownVariant { path: String, tag: String },

    #[error("{path}: local id {id} is used by more than one element")]
    DuplicateLocalId { path: String, id: LocalId },

    #[error("{path}: connection refers to local id {id} which is not in the body")]
    DanglingReference { path: String, id: LocalId },

    #[error("{path}: continuation '{name}' has no connector with the same name")]
    UnresolvedContinuation { path: String, name: String },

    #[error("{path}: continuation '{name}' matches more than one connector")]
    AmbiguousContinuation { path: String, name: String },

    #[error("{path}: variable '{name}' is declared more than once")]
    DuplicateVariable { path: String, name: String },

    #[error("{path}: execution order {order} is used by more than one element")]
    DuplicateExecutionOrder { path: String, order: u64 },

    #[error("function '{pou}' does not declare a return type")]
    MissingReturnType { pou: String },

    #[error("program '{pou}' declares a return type")]
    UnexpectedReturnType { pou: String },

    /// The input is not well formed, has the wrong root or is missing a
    /// required element or attribute.
    #[error("{path}: {message}")]
    MalformedWire { path: String, message: String },

    #[error("unable to write document: {0}")]
    Write(String),
}

impl Error {
    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::MalformedWire {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn unknown(path: impl Into<String>, tag: impl Into<String>) -> Self {
        Error::UnknownVariant {
            path: path.into(),
            tag: tag.into(),
        }
    }

    /// Returns the problem code for this error.
    pub fn problem(&self) -> Problem {
        match self {
            Error::InvalidChoice { .. } => Problem::InvalidChoice,
            Error::UnknownVariant { .. } => Problem::UnknownVariant,
            Error::DuplicateLocalId { .. } => Problem::DuplicateLocalId,
            Error::DanglingReference { .. } => Problem::DanglingReference,
            Error::UnresolvedContinuation { .. } => Problem::UnresolvedContinuation,
            Error::AmbiguousContinuation { .. } => Problem::AmbiguousContinuation,
            Error::DuplicateVariable { .. } => Problem::DuplicateVariable,
            Error::DuplicateExecutionOrder { .. } => Problem::DuplicateExecutionOrder,
            Error::MissingReturnType { .. } => Problem::MissingReturnType,
            Error::UnexpectedReturnType { .. } => Problem::UnexpectedReturnType,
            Error::MalformedWire { .. } => Problem::MalformedWire,
            Error::Write(_) => Problem::WriteFailed,
        }
    }

    /// Returns the document path of the error, if the error is located
    /// within the document.
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::InvalidChoice { path, .. }
            | Error::UnknownVariant { path, .. }
            | Error::DuplicateLocalId { path, .. }
            | Error::DanglingReference { path, .. }
            | Error::UnresolvedContinuation { path, .. }
            | Error::AmbiguousContinuation { path, .. }
            | Error::DuplicateVariable { path, .. }
            | Error::DuplicateExecutionOrder { path, .. }
            | Error::MalformedWire { path, .. } => Some(path),
            Error::MissingReturnType { .. }
            | Error::UnexpectedReturnType { .. }
            | Error::Write(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_when_invalid_choice_then_lists_alternatives() {
        let err = Error::InvalidChoice {
            path: "dataType[T]/baseType".to_string(),
            found: vec!["BOOL".to_string(), "INT".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "dataType[T]/baseType: expected exactly one alternative, found [BOOL, INT]"
        );
    }

    #[test]
    fn problem_when_dangling_reference_then_dangling_reference_code() {
        let err = Error::DanglingReference {
            path: "pou[Main]/body".to_string(),
            id: 99,
        };
        assert_eq!(err.problem(), Problem::DanglingReference);
        assert_eq!(err.path(), Some("pou[Main]/body"));
    }

    #[test]
    fn path_when_missing_return_type_then_none() {
        let err = Error::MissingReturnType {
            pou: "Add".to_string(),
        };
        assert!(err.path().is_none());
        assert_eq!(err.problem().code(), "P0010");
    }
}
