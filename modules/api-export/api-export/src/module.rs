use std::sync::Arc;

use api_export_sdk::{
    ExportEngine, PermissionService, RepositoryResolver, ResourceMetadataProvider, Translator,
};
use tracing::{debug, info, warn};

use crate::config::ApiExportConfig;
use crate::domain::filename::{Clock, SystemClock};
use crate::domain::service::{ExportDeps, ExportService, ServiceConfig};
use crate::domain::transformers::{TenantScopeTransformer, TransformerRegistry, ViewTransformer};
use crate::domain::translator::CatalogTranslator;
use crate::guess::ExportRouteTable;

/// Priority of the built-in tenant scope transformer; it runs before
/// host transformers registered at the default priority of 0.
pub const TENANT_SCOPE_PRIORITY: i32 = 100;

/// Collaborators and extensions supplied by the host at startup.
pub struct ApiExportDeps {
    pub metadata: Arc<dyn ResourceMetadataProvider>,
    pub repositories: Arc<dyn RepositoryResolver>,
    pub permissions: Arc<dyn PermissionService>,
    pub engine: Arc<dyn ExportEngine>,
    /// Defaults to a [`CatalogTranslator`] over the configured translations.
    pub translator: Option<Arc<dyn Translator>>,
    /// Defaults to [`SystemClock`].
    pub clock: Option<Arc<dyn Clock>>,
    /// `(priority, transformer)` pairs added to the pre-paginate chain.
    pub transformers: Vec<(i32, Arc<dyn ViewTransformer>)>,
}

impl ApiExportDeps {
    #[must_use]
    pub fn new(
        metadata: Arc<dyn ResourceMetadataProvider>,
        repositories: Arc<dyn RepositoryResolver>,
        permissions: Arc<dyn PermissionService>,
        engine: Arc<dyn ExportEngine>,
    ) -> Self {
        Self {
            metadata,
            repositories,
            permissions,
            engine,
            translator: None,
            clock: None,
            transformers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn with_transformer(mut self, priority: i32, transformer: Arc<dyn ViewTransformer>) -> Self {
        self.transformers.push((priority, transformer));
        self
    }
}

struct RestState {
    routes: Arc<ExportRouteTable>,
    route_prefix: String,
    organization_param: String,
}

/// Main module struct for resource exports
pub struct ApiExportModule {
    // Read-mostly after init.
    service: arc_swap::ArcSwapOption<ExportService>,
    rest: arc_swap::ArcSwapOption<RestState>,
}

impl Default for ApiExportModule {
    fn default() -> Self {
        Self {
            service: arc_swap::ArcSwapOption::from(None),
            rest: arc_swap::ArcSwapOption::from(None),
        }
    }
}

impl Clone for ApiExportModule {
    fn clone(&self) -> Self {
        Self {
            service: arc_swap::ArcSwapOption::new(self.service.load_full()),
            rest: arc_swap::ArcSwapOption::new(self.rest.load_full()),
        }
    }
}

impl ApiExportModule {
    /// Build the export service and the route table.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, a rejected transformer, or two
    /// exported resources sharing a plural name.
    pub fn init(&self, cfg: &ApiExportConfig, deps: ApiExportDeps) -> anyhow::Result<()> {
        info!("Initializing api-export module");
        cfg.validate()?;

        let mut builder = TransformerRegistry::builder();
        if cfg.tenant_scoping {
            builder = builder.register(TENANT_SCOPE_PRIORITY, Arc::new(TenantScopeTransformer));
        }
        for (priority, transformer) in deps.transformers {
            builder = builder.register(priority, transformer);
        }
        let registry = builder.build()?;
        debug!(
            transformers = ?registry.names().collect::<Vec<_>>(),
            "Pre-paginate transformer chain"
        );

        let resources = deps.metadata.all();
        let routes = ExportRouteTable::build(&resources, &cfg.resources, &cfg.organization_param)?;
        for resource_type in cfg.resources.keys() {
            if !routes.routes().any(|r| &r.resource_type == resource_type) {
                warn!(
                    resource_type = %resource_type,
                    "export options configured for a resource without an export action"
                );
            }
        }

        let translator: Arc<dyn Translator> = match deps.translator {
            Some(translator) => translator,
            None => Arc::new(CatalogTranslator::with_builtin_messages(
                cfg.translations.clone(),
                cfg.default_locale.clone(),
            )),
        };
        let clock: Arc<dyn Clock> = match deps.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };

        let service = ExportService::new(
            ExportDeps {
                metadata: deps.metadata,
                repositories: deps.repositories,
                permissions: deps.permissions,
                engine: deps.engine,
                translator,
                clock,
            },
            registry,
            ServiceConfig {
                default_alias: cfg.default_alias.clone(),
                stream_buffer_bytes: cfg.stream_buffer_bytes,
            },
        );

        info!(
            routes = routes.len(),
            route_prefix = %cfg.route_prefix,
            "ExportService initialized successfully"
        );
        self.service.store(Some(Arc::new(service)));
        self.rest.store(Some(Arc::new(RestState {
            routes: Arc::new(routes),
            route_prefix: cfg.route_prefix.clone(),
            organization_param: cfg.organization_param.clone(),
        })));
        Ok(())
    }

    /// Mount the export route on `router`.
    ///
    /// # Errors
    ///
    /// Fails if [`init`](Self::init) has not run.
    pub fn register_rest(&self, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering api-export REST routes");

        let service = self
            .service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))?;
        let rest = self
            .rest
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Routes not initialized"))?;

        let router = crate::api::rest::routes::register_routes(
            router,
            service,
            Arc::clone(&rest.routes),
            &rest.route_prefix,
            &rest.organization_param,
        );

        info!("API export REST routes registered successfully");
        Ok(router)
    }

    #[must_use]
    pub fn service(&self) -> Option<Arc<ExportService>> {
        self.service.load_full()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn register_rest_requires_init() {
        let module = ApiExportModule::default();

        let err = module.register_rest(axum::Router::new()).unwrap_err();
        assert_eq!(err.to_string(), "Service not initialized");
        assert!(module.service().is_none());
    }
}
