#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! API Export SDK
//!
//! This crate provides the public contract of the `api_export` module:
//!
//! - [`ExportFormat`], [`HeaderStyle`], [`SortEntry`], [`ResourceMetadata`] - Export models
//! - [`SecurityContext`] - Caller identity passed through the export pipeline
//! - [`ResourceQuery`] - The unbounded query handed from repository to export engine
//! - [`api`] - Collaborator traits ([`QueryProvider`], [`PermissionService`],
//!   [`PrePaginateTransformer`], [`ExportEngine`], [`Translator`], ...)
//! - [`error`] - Collaborator error types
//!
//! ## Usage
//!
//! An application plugs its ORM, permission voter and encoders in by
//! implementing the traits from [`api`]:
//!
//! ```ignore
//! use api_export_sdk::{ExportEngine, ExportedArtifact, EngineError};
//!
//! struct CsvEngine;
//!
//! #[async_trait::async_trait]
//! impl ExportEngine for CsvEngine {
//!     async fn export_query(
//!         &self,
//!         metadata: &ResourceMetadata,
//!         query: ResourceQuery,
//!         fields: &[String],
//!         format: ExportFormat,
//!         header_style: HeaderStyle,
//!     ) -> Result<ExportedArtifact, EngineError> {
//!         // run the query, wrap the rows in a writer
//!     }
//! }
//! ```

pub mod api;
pub mod context;
pub mod error;
pub mod models;
pub mod query;

// Re-export main types at crate root
pub use api::{
    ExportEngine, ExportWriter, ExportedArtifact, PermissionService, PrePaginateTransformer,
    QueryProvider, RepositoryResolver, ResourceMetadataProvider, Translator,
};
pub use context::SecurityContext;
pub use error::{
    EngineError, MetadataError, ParseFormatError, PermissionError, QueryError, TransformError,
};
pub use models::{
    ExportFormat, HeaderStyle, Permission, QueryMethod, QueryRequest, ResourceMetadata,
    SortDirection, SortEntry,
};
pub use query::{QueryFilter, ResourceQuery, ResultWindow};
