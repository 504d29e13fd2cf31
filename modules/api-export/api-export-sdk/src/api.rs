//! Collaborator contracts of the export pipeline.
//!
//! The module never talks to an ORM, a permission voter or a file encoder
//! directly; the host application provides implementations of these traits
//! when it wires the module.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::SecurityContext;
use crate::error::{EngineError, MetadataError, PermissionError, QueryError, TransformError};
use crate::models::{ExportFormat, HeaderStyle, Permission, QueryRequest, ResourceMetadata};
use crate::query::ResourceQuery;

/// Resolves resource metadata by resource type.
pub trait ResourceMetadataProvider: Send + Sync {
    /// # Errors
    ///
    /// [`MetadataError::NotFound`] if the resource type is not registered.
    fn get(&self, resource_type: &str) -> Result<ResourceMetadata, MetadataError>;

    /// Every registered resource, used to build the export routes.
    fn all(&self) -> Vec<ResourceMetadata>;
}

/// Maps the `repository` key of a [`ResourceMetadata`] to its query provider.
pub trait RepositoryResolver: Send + Sync {
    fn repository(&self, key: &str) -> Option<Arc<dyn QueryProvider>>;
}

/// Builds queries for one resource type.
#[async_trait]
pub trait QueryProvider: Send + Sync {
    /// Whether [`QueryMethod::Translated`](crate::QueryMethod::Translated) is available.
    fn supports_translation(&self) -> bool {
        false
    }

    /// Build a query. The returned query may carry a result window; the
    /// export pipeline clears it.
    ///
    /// # Errors
    ///
    /// - [`QueryError::UnsupportedMethod`] for an unknown repository method
    /// - [`QueryError::Internal`] for store failures
    async fn create_query(
        &self,
        ctx: &SecurityContext,
        request: &QueryRequest,
    ) -> Result<ResourceQuery, QueryError>;
}

/// Permission voter.
#[async_trait]
pub trait PermissionService: Send + Sync {
    /// Check `permission` for the caller, optionally on a resource type.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError`] when the decision could not be made.
    /// A denial is `Ok(false)`.
    async fn is_granted(
        &self,
        ctx: &SecurityContext,
        permission: Permission,
        resource_type: Option<&str>,
    ) -> Result<bool, PermissionError>;
}

/// Mutates a query before pagination bounds are finalized (tenant scoping,
/// soft-delete filters, ...).
///
/// Instances are shared by all requests and must not keep per-request state.
pub trait PrePaginateTransformer: Send + Sync {
    /// # Errors
    ///
    /// Returns [`TransformError`] if the query cannot be transformed; the
    /// export is aborted.
    fn pre_paginate(&self, query: &mut ResourceQuery) -> Result<(), TransformError>;
}

/// Encoded export output that has not been produced yet.
///
/// `save` runs on a blocking thread and writes straight into the response
/// body; it should write incrementally rather than buffer the whole file.
pub trait ExportWriter: Send + 'static {
    /// # Errors
    ///
    /// Any I/O error from `out` (including a closed client connection) or
    /// from the encoder.
    fn save(self: Box<Self>, out: &mut dyn Write) -> std::io::Result<()>;
}

/// Result of [`ExportEngine::export_query`].
pub struct ExportedArtifact {
    pub mime_type: String,
    pub writer: Box<dyn ExportWriter>,
}

impl ExportedArtifact {
    #[must_use]
    pub fn new(mime_type: impl Into<String>, writer: Box<dyn ExportWriter>) -> Self {
        Self {
            mime_type: mime_type.into(),
            writer,
        }
    }
}

impl fmt::Debug for ExportedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedArtifact")
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// Converts query results into a file of the requested format.
#[async_trait]
pub trait ExportEngine: Send + Sync {
    /// # Errors
    ///
    /// - [`EngineError::InvalidFormat`] if `format` is not supported for the resource
    /// - [`EngineError::ExportNotFound`] if the resource has no exportable representation
    /// - [`EngineError::Other`] for any other failure
    async fn export_query(
        &self,
        metadata: &ResourceMetadata,
        query: ResourceQuery,
        fields: &[String],
        format: ExportFormat,
        header_style: HeaderStyle,
    ) -> Result<ExportedArtifact, EngineError>;
}

/// Message translator.
///
/// Implementations must not fail on a missing key; returning the key itself
/// is the expected fallback.
pub trait Translator: Send + Sync {
    fn trans(
        &self,
        key: &str,
        params: &[(&str, &str)],
        domain: &str,
        locale: Option<&str>,
    ) -> String;
}
