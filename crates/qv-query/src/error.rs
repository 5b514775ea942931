//! Error types for qv-query

use crate::ir::expr::BindingIndex;
use thiserror::Error;

/// Query error type
///
/// These use the `QE` prefix (Query Error) to avoid collisions with pass
/// diagnostic codes which use plain `Q` codes (e.g. Q001-Q003).
#[derive(Error, Debug)]
pub enum QueryError {
    /// QE001: Nested association specification node has an unrecognized shape
    #[error("[QE001] Invalid nested specification at {path}: {message}")]
    InvalidSpecification { path: String, message: String },

    /// QE002: No association path from the parent binding
    #[error("[QE002] Unknown association '{association}' on '{relation}'")]
    UnknownAssociation {
        relation: String,
        association: String,
    },

    /// QE003: Validating removal found references to the removed binding
    #[error("[QE003] Cannot remove join '{alias}': binding {binding} is still referenced {count} time(s)")]
    DanglingReference {
        alias: String,
        binding: BindingIndex,
        count: usize,
    },

    /// QE004: Core error propagation
    #[error("[QE004] Core error: {0}")]
    Core(#[from] qv_core::CoreError),

    /// QE005: Deserialized query breaks alias uniqueness or index ordering
    #[error("[QE005] Invalid query: {message}")]
    InvalidQuery { message: String },
}

/// Result type alias for QueryError
pub type QueryResult<T> = Result<T, QueryError>;
