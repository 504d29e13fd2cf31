use std::sync::Arc;

use api_export_sdk::{
    ExportEngine, ExportFormat, ExportedArtifact, PermissionService, QueryMethod, QueryRequest,
    RepositoryResolver, ResourceMetadata, ResourceMetadataProvider, ResourceQuery,
    SecurityContext, Translator,
};
use tracing::{debug, field::Empty, info};

use super::authz::AuthorizationGate;
use super::error::DomainError;
use super::filename::{Clock, export_filename};
use super::params::{ExportRequestParams, RawExportInput, interpret};
use super::transformers::TransformerRegistry;
use super::translator::messages;
use crate::guess::{ExportActionConfig, ExportRoute};

// ============================================================================
// Service Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Root alias used when the route does not configure one.
    pub default_alias: String,
    /// Capacity of the pipe between the export writer and the response body.
    pub stream_buffer_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_alias: "o".to_owned(),
            stream_buffer_bytes: 64 * 1024,
        }
    }
}

/// Collaborators provided by the host application.
#[derive(Clone)]
pub struct ExportDeps {
    pub metadata: Arc<dyn ResourceMetadataProvider>,
    pub repositories: Arc<dyn RepositoryResolver>,
    pub permissions: Arc<dyn PermissionService>,
    pub engine: Arc<dyn ExportEngine>,
    pub translator: Arc<dyn Translator>,
    pub clock: Arc<dyn Clock>,
}

/// Everything the REST layer needs to stream an export.
#[derive(Debug)]
pub struct PreparedExport {
    pub filename: String,
    pub artifact: ExportedArtifact,
    pub params: ExportRequestParams,
}

// ============================================================================
// Service Implementation
// ============================================================================

pub struct ExportService {
    metadata: Arc<dyn ResourceMetadataProvider>,
    repositories: Arc<dyn RepositoryResolver>,
    engine: Arc<dyn ExportEngine>,
    translator: Arc<dyn Translator>,
    clock: Arc<dyn Clock>,
    gate: AuthorizationGate,
    transformers: TransformerRegistry,
    config: ServiceConfig,
}

impl ExportService {
    #[must_use]
    pub fn new(deps: ExportDeps, transformers: TransformerRegistry, config: ServiceConfig) -> Self {
        Self {
            metadata: deps.metadata,
            repositories: deps.repositories,
            engine: deps.engine,
            translator: deps.translator,
            clock: deps.clock,
            gate: AuthorizationGate::new(deps.permissions),
            transformers,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    #[must_use]
    pub fn translator(&self) -> &dyn Translator {
        self.translator.as_ref()
    }

    /// Run the export pipeline up to the point where bytes can be streamed.
    ///
    /// Nothing is built for an unauthorized caller: the permission checks
    /// happen before the request is interpreted or the repository touched.
    ///
    /// # Errors
    ///
    /// - [`DomainError::ResourceNotFound`] if the route's resource type has no metadata
    /// - [`DomainError::AccessDenied`] if the caller may not export this resource
    /// - [`DomainError::InvalidRequest`] for a malformed sort
    /// - [`DomainError::InvalidFormat`] / [`DomainError::ExportTargetNotFound`] from the engine
    /// - [`DomainError::Unclassified`] for any other failure
    #[tracing::instrument(
        skip(self, ctx, route, input),
        fields(
            resource_type = %route.resource_type,
            format = %format,
            request_id = Empty
        )
    )]
    pub async fn prepare_export(
        &self,
        ctx: &SecurityContext,
        route: &ExportRoute,
        format: ExportFormat,
        input: &RawExportInput,
    ) -> Result<PreparedExport, DomainError> {
        let metadata = self.metadata.get(&route.resource_type)?;
        self.gate
            .authorize_export(ctx, &metadata.resource_type)
            .await?;

        let params = interpret(input, &metadata, format)?;

        let query = self
            .build_query(ctx, &metadata, &route.config, &params)
            .await?;

        let label = self.translator.trans(
            &metadata.plural_label,
            &[],
            messages::ENTITIES_DOMAIN,
            ctx.locale(),
        );
        let filename =
            export_filename(&label, self.clock.now(), format).map_err(DomainError::unclassified)?;

        info!(
            filename = %filename,
            fields = params.fields().len(),
            header_style = ?params.header_style(),
            "Exporting resource collection"
        );

        let artifact = self
            .engine
            .export_query(
                &metadata,
                query,
                params.fields(),
                format,
                params.header_style(),
            )
            .await?;

        Ok(PreparedExport {
            filename,
            artifact,
            params,
        })
    }

    async fn build_query(
        &self,
        ctx: &SecurityContext,
        metadata: &ResourceMetadata,
        config: &ExportActionConfig,
        params: &ExportRequestParams,
    ) -> Result<ResourceQuery, DomainError> {
        let repository = self
            .repositories
            .repository(&metadata.repository)
            .ok_or_else(|| {
                DomainError::unclassified(anyhow::anyhow!(
                    "no repository registered under '{}'",
                    metadata.repository
                ))
            })?;

        let method = match &config.repository_method {
            Some(name) => QueryMethod::Custom(name.clone()),
            None if repository.supports_translation() => QueryMethod::Translated,
            None => QueryMethod::Standard,
        };
        let request = QueryRequest {
            resource_type: metadata.resource_type.clone(),
            method,
            alias: config
                .alias
                .clone()
                .unwrap_or_else(|| self.config.default_alias.clone()),
            index_by: config.index_by.clone(),
        };
        debug!(method = ?request.method, alias = %request.alias, "Creating export query");

        let mut query = repository.create_query(ctx, &request).await?;
        query.set_sort(params.sort().to_vec());
        self.transformers.apply(&mut query)?;
        query.clear_result_window();

        Ok(query)
    }
}
