use api_export_sdk::{EngineError, MetadataError, QueryError, TransformError};
use thiserror::Error;

/// Failures of the export pipeline, mapped to HTTP problems by the REST layer.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Access denied")]
    AccessDenied,

    #[error("Resource type '{resource_type}' is not registered")]
    ResourceNotFound { resource_type: String },

    #[error("Invalid export format: {format}")]
    InvalidFormat { format: String },

    #[error("No export available for resource type '{resource_type}'")]
    ExportTargetNotFound { resource_type: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Any other failure; the cause is logged, never sent to the client.
    #[error("Export failed: {0}")]
    Unclassified(#[source] anyhow::Error),
}

impl DomainError {
    #[must_use]
    pub fn resource_not_found(resource_type: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource_type: resource_type.into(),
        }
    }

    #[must_use]
    pub fn invalid_format(format: impl Into<String>) -> Self {
        Self::InvalidFormat {
            format: format.into(),
        }
    }

    #[must_use]
    pub fn export_target_not_found(resource_type: impl Into<String>) -> Self {
        Self::ExportTargetNotFound {
            resource_type: resource_type.into(),
        }
    }

    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unclassified(cause: impl Into<anyhow::Error>) -> Self {
        Self::Unclassified(cause.into())
    }
}

impl From<MetadataError> for DomainError {
    fn from(e: MetadataError) -> Self {
        match e {
            MetadataError::NotFound { resource_type } => Self::resource_not_found(resource_type),
        }
    }
}

impl From<EngineError> for DomainError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::InvalidFormat { format } => Self::invalid_format(format),
            EngineError::ExportNotFound { resource_type } => {
                Self::export_target_not_found(resource_type)
            }
            other @ EngineError::Other(_) => Self::unclassified(other),
        }
    }
}

impl From<QueryError> for DomainError {
    fn from(e: QueryError) -> Self {
        Self::unclassified(e)
    }
}

impl From<TransformError> for DomainError {
    fn from(e: TransformError) -> Self {
        Self::unclassified(e)
    }
}
