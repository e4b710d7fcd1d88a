//! Error types for query building.

use thiserror::Error;

/// Errors that can occur while building or compiling a query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Malformed attribute map passed to `has_many`
    #[error("Validation error: {0}")]
    Validation(String),

    /// Variable name already registered in this builder
    #[error("Variable '${0}' is already assigned to a thing")]
    DuplicateVariable(String),

    /// Relationship reached compilation without any role players
    #[error("Relationship '${0}' has no role players")]
    MalformedRelationship(String),

    /// Role player variable is not registered in this builder
    #[error("Relationship '${relationship}' refers to unknown variable '${target}'")]
    UnresolvedVariable { relationship: String, target: String },
}
