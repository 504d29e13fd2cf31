//! API Export Module
//!
//! Streams any registered resource collection as a CSV / HTML / ODS / XLS /
//! XLSX file. A request for `/{organization}/<plural>.<ext>` is interpreted,
//! authorized, turned into an unbounded query that runs through the
//! pre-paginate transformer chain, handed to the export engine, and the
//! encoded file is streamed back as an attachment.
//!
//! Query building, permission decisions, resource metadata and file encoding
//! are provided by the host through the traits in [`api_export_sdk::api`].
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod config;
pub mod domain;
pub mod guess;
pub mod module;

pub use config::ApiExportConfig;
pub use module::{ApiExportDeps, ApiExportModule};
