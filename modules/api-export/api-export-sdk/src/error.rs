//! Error types returned by export collaborators.

use thiserror::Error;

/// The string is not one of the supported export extensions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported export format: {0}")]
pub struct ParseFormatError(pub String);

/// Errors from the resource metadata provider.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The resource type is not registered.
    #[error("metadata not found for resource type '{resource_type}'")]
    NotFound { resource_type: String },
}

/// Errors from a query provider.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The repository does not implement the requested method.
    #[error("repository method '{method}' is not supported")]
    UnsupportedMethod { method: String },

    /// The underlying store failed.
    #[error("query construction failed: {0}")]
    Internal(String),
}

/// Errors from the permission service.
///
/// Denial is expressed as `Ok(false)`, never as an error.
#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("permission service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// A pre-paginate transformer refused or failed to modify the query.
#[derive(Debug, Error)]
#[error("transformer '{transformer}' failed: {message}")]
pub struct TransformError {
    pub transformer: String,
    pub message: String,
}

impl TransformError {
    #[must_use]
    pub fn new(transformer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            transformer: transformer.into(),
            message: message.into(),
        }
    }
}

/// Errors from the export engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine cannot produce this format for the resource.
    #[error("invalid export format: {format}")]
    InvalidFormat { format: String },

    /// The resource has no exportable representation.
    #[error("no export found for resource type '{resource_type}'")]
    ExportNotFound { resource_type: String },

    /// Anything else (query execution, encoder setup, ...).
    #[error("export failed: {0}")]
    Other(String),
}
