#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! In-memory collaborators for the HTTP tests.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use api_export::{ApiExportConfig, ApiExportDeps, ApiExportModule};
use api_export::domain::filename::Clock;
use api_export_sdk::{
    EngineError, ExportEngine, ExportFormat, ExportWriter, ExportedArtifact, HeaderStyle,
    MetadataError, Permission, PermissionError, PermissionService, QueryError, QueryFilter,
    QueryProvider, QueryRequest, RepositoryResolver, ResourceMetadata, ResourceMetadataProvider,
    ResourceQuery, ResultWindow, SecurityContext, SortEntry,
};
use async_trait::async_trait;
use axum::{Extension, Router};
use parking_lot::Mutex;
use time::OffsetDateTime;
use time::macros::datetime;
use uuid::{Uuid, uuid};

pub const CSV_BODY: &str = "id,name\n1,Alpha\n2,Beta\n";

pub const TENANT_ID: Uuid = uuid!("00000000-0000-0000-0000-0000000000aa");
pub const SUBJECT_ID: Uuid = uuid!("11111111-0000-0000-0000-000000000001");

/// Authenticated caller of [`TENANT_ID`].
pub fn member_ctx() -> SecurityContext {
    SecurityContext::builder()
        .subject_id(SUBJECT_ID)
        .subject_tenant_id(TENANT_ID)
        .build()
}

pub fn order_metadata() -> ResourceMetadata {
    ResourceMetadata {
        resource_type: "App\\Entity\\Order".to_owned(),
        name: "order".to_owned(),
        plural_name: "orders".to_owned(),
        plural_label: "Orders".to_owned(),
        default_sort: vec![SortEntry::asc("name"), SortEntry::desc("createdAt")],
        repository: "orders".to_owned(),
        actions: vec!["list".to_owned(), "export".to_owned()],
    }
}

fn customer_metadata() -> ResourceMetadata {
    ResourceMetadata {
        resource_type: "App\\Entity\\Customer".to_owned(),
        name: "customer".to_owned(),
        plural_name: "customers".to_owned(),
        plural_label: "Customers".to_owned(),
        default_sort: Vec::new(),
        repository: "customers".to_owned(),
        actions: vec!["list".to_owned()],
    }
}

struct Metadata(Vec<ResourceMetadata>);

impl ResourceMetadataProvider for Metadata {
    fn get(&self, resource_type: &str) -> Result<ResourceMetadata, MetadataError> {
        self.0
            .iter()
            .find(|m| m.resource_type == resource_type)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound {
                resource_type: resource_type.to_owned(),
            })
    }

    fn all(&self) -> Vec<ResourceMetadata> {
        self.0.clone()
    }
}

#[derive(Default)]
pub struct SpyRepository {
    pub requests: Mutex<Vec<QueryRequest>>,
}

#[async_trait]
impl QueryProvider for SpyRepository {
    async fn create_query(
        &self,
        ctx: &SecurityContext,
        request: &QueryRequest,
    ) -> Result<ResourceQuery, QueryError> {
        self.requests.lock().push(request.clone());
        let mut query = ResourceQuery::new(request, ctx.clone());
        query.set_result_window(Some(0), Some(25));
        Ok(query)
    }
}

struct Repositories(Arc<SpyRepository>);

impl RepositoryResolver for Repositories {
    fn repository(&self, key: &str) -> Option<Arc<dyn QueryProvider>> {
        (key == "orders" || key == "customers").then(|| Arc::clone(&self.0) as Arc<dyn QueryProvider>)
    }
}

pub struct SpyPermissions {
    pub allow: bool,
    pub calls: Mutex<Vec<Permission>>,
}

#[async_trait]
impl PermissionService for SpyPermissions {
    async fn is_granted(
        &self,
        _ctx: &SecurityContext,
        permission: Permission,
        _resource_type: Option<&str>,
    ) -> Result<bool, PermissionError> {
        self.calls.lock().push(permission);
        Ok(self.allow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOutcome {
    Csv,
    BrokenWriter,
    InvalidFormat,
    NotFound,
    Fail,
}

/// What the engine received.
#[derive(Debug, Clone)]
pub struct EngineCall {
    pub sort: Vec<SortEntry>,
    pub filters: Vec<QueryFilter>,
    pub window: ResultWindow,
    pub fields: Vec<String>,
    pub format: ExportFormat,
    pub header_style: HeaderStyle,
}

pub struct SpyEngine {
    pub outcome: EngineOutcome,
    pub calls: Mutex<Vec<EngineCall>>,
}

struct StaticWriter(&'static str);

impl ExportWriter for StaticWriter {
    fn save(self: Box<Self>, out: &mut dyn Write) -> std::io::Result<()> {
        for line in self.0.split_inclusive('\n') {
            out.write_all(line.as_bytes())?;
        }
        Ok(())
    }
}

/// Writes the header row, then fails.
struct BrokenWriter;

impl ExportWriter for BrokenWriter {
    fn save(self: Box<Self>, out: &mut dyn Write) -> std::io::Result<()> {
        out.write_all(b"id,name\n")?;
        out.flush()?;
        Err(std::io::Error::other("encoder crashed"))
    }
}

#[async_trait]
impl ExportEngine for SpyEngine {
    async fn export_query(
        &self,
        metadata: &ResourceMetadata,
        query: ResourceQuery,
        fields: &[String],
        format: ExportFormat,
        header_style: HeaderStyle,
    ) -> Result<ExportedArtifact, EngineError> {
        self.calls.lock().push(EngineCall {
            sort: query.sort().to_vec(),
            filters: query.filters().to_vec(),
            window: query.result_window(),
            fields: fields.to_vec(),
            format,
            header_style,
        });
        match self.outcome {
            EngineOutcome::Csv => Ok(ExportedArtifact::new(
                "text/csv",
                Box::new(StaticWriter(CSV_BODY)),
            )),
            EngineOutcome::BrokenWriter => {
                Ok(ExportedArtifact::new("text/csv", Box::new(BrokenWriter)))
            }
            EngineOutcome::InvalidFormat => Err(EngineError::InvalidFormat {
                format: format.to_string(),
            }),
            EngineOutcome::NotFound => Err(EngineError::ExportNotFound {
                resource_type: metadata.resource_type.clone(),
            }),
            EngineOutcome::Fail => Err(EngineError::Other("query timed out".to_owned())),
        }
    }
}

struct FixedClock(OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

pub struct TestApp {
    pub router: Router,
    pub repository: Arc<SpyRepository>,
    pub permissions: Arc<SpyPermissions>,
    pub engine: Arc<SpyEngine>,
}

impl TestApp {
    pub fn permission_calls(&self) -> usize {
        self.permissions.calls.lock().len()
    }

    pub fn engine_calls(&self) -> Vec<EngineCall> {
        self.engine.calls.lock().clone()
    }
}

pub struct AppOptions {
    pub allow: bool,
    pub outcome: EngineOutcome,
    pub config: ApiExportConfig,
    /// `None` leaves the request without a security context.
    pub ctx: Option<SecurityContext>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            allow: true,
            outcome: EngineOutcome::Csv,
            config: ApiExportConfig::default(),
            ctx: Some(member_ctx()),
        }
    }
}

/// Wire the module with spies and mount it on an empty router.
pub fn build_app(opts: AppOptions) -> TestApp {
    let repository = Arc::new(SpyRepository::default());
    let permissions = Arc::new(SpyPermissions {
        allow: opts.allow,
        calls: Mutex::new(Vec::new()),
    });
    let engine = Arc::new(SpyEngine {
        outcome: opts.outcome,
        calls: Mutex::new(Vec::new()),
    });

    let deps = ApiExportDeps::new(
        Arc::new(Metadata(vec![order_metadata(), customer_metadata()])),
        Arc::new(Repositories(Arc::clone(&repository))),
        permissions.clone(),
        engine.clone(),
    )
    .with_clock(Arc::new(FixedClock(datetime!(2024-03-05 14:07:09 UTC))));

    let module = ApiExportModule::default();
    module.init(&opts.config, deps).unwrap();

    let mut router = module.register_rest(Router::new()).unwrap();
    if let Some(ctx) = opts.ctx {
        // Stands in for the gateway's authentication middleware.
        router = router.layer(Extension(ctx));
    }

    TestApp {
        router,
        repository,
        permissions,
        engine,
    }
}

pub fn french_catalog() -> api_export::domain::translator::Catalog {
    HashMap::from([(
        "fr".to_owned(),
        HashMap::from([(
            "entities".to_owned(),
            HashMap::from([("Orders".to_owned(), "Commandes".to_owned())]),
        )]),
    )])
}
