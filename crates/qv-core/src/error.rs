//! Error types for qv-core

use thiserror::Error;

/// Core error type for Quiver
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Invalid configuration value
    #[error("[C002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C003: Relation declared twice across schema files
    #[error("[C003] Duplicate relation '{name}' in {path}")]
    DuplicateRelation { name: String, path: String },

    /// C004: Association declared twice on the same relation
    #[error("[C004] Duplicate association '{association}' on relation '{relation}'")]
    DuplicateAssociation {
        relation: String,
        association: String,
    },

    /// C005: has_one / has_many association without a related key
    #[error("[C005] Association '{association}' on '{relation}' ({kind}) requires a 'related_key'")]
    MissingRelatedKey {
        relation: String,
        association: String,
        kind: String,
    },

    /// C006: Association targets a relation the catalog does not declare
    #[error("[C006] Association '{association}' on '{relation}' targets unknown relation '{related}'")]
    UnknownRelatedRelation {
        relation: String,
        association: String,
        related: String,
    },

    /// C007: IO error with file path context
    #[error("[C007] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C008: YAML parse error
    #[error("[C008] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
