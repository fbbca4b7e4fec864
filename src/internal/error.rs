use thiserror::Error;

use crate::schema::types::Type;
use crate::schema::utils::join_path;

/// Unified error type for the typedata library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Two schemas or values carry irreconcilable types for the same field.
    #[error("Type Conflict: cannot merge field '{}' of type {left} with type {right}", display_path(.path))]
    TypeConflict {
        /// Dot-path of the offending field (empty for the root).
        path: String,
        /// Type found on the left-hand side.
        left: Type,
        /// Type found on the right-hand side.
        right: Type,
    },

    /// A strict lookup hit a missing path segment.
    #[error("Path Not Found: no field '{0}'")]
    PathNotFound(String),

    /// An empty path, or a segment that cannot be used as a field name.
    #[error("Malformed Path: '{0}'")]
    MalformedPath(String),

    /// A typed getter was called on a value of another kind.
    #[error("Type Mismatch: field '{}' is {actual}, expected {expected}", display_path(.field))]
    TypeMismatch {
        field: String,
        expected: Type,
        actual: Type,
    },

    /// Coercion between two types failed.
    #[error("Conversion Error: {0}")]
    ConversionError(String),

    /// A rename targeted a name that is already taken.
    #[error("Duplicate Field: '{0}' already exists")]
    DuplicateField(String),

    /// An input adapter received data it cannot represent.
    #[error("Decode Error: {0}")]
    DecodeError(String),
}

/// A specialized `Result` type for typedata operations.
pub type Result<T> = std::result::Result<T, Error>;

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}

impl Error {
    /// Builds a type conflict for `path`.
    pub(crate) fn conflict(path: &str, left: Type, right: Type) -> Self {
        tracing::debug!(path = %display_path(path), %left, %right, "type conflict");
        Error::TypeConflict {
            path: path.to_string(),
            left,
            right,
        }
    }

    /// Returns true for the `TypeConflict` kind.
    pub fn is_type_conflict(&self) -> bool {
        matches!(self, Error::TypeConflict { .. })
    }

    /// Prefixes the path carried by a conflict, lookup or mismatch error with `parent`.
    pub(crate) fn within(self, parent: &str) -> Self {
        let join = |p: String| join_path(parent, &p);
        match self {
            Error::TypeConflict { path, left, right } => Error::TypeConflict {
                path: join(path),
                left,
                right,
            },
            Error::PathNotFound(path) => Error::PathNotFound(join(path)),
            Error::TypeMismatch {
                field,
                expected,
                actual,
            } => Error::TypeMismatch {
                field: join(field),
                expected,
                actual,
            },
            other => other,
        }
    }
}
