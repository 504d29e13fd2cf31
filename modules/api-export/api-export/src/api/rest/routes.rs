use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Router};
use utoipa::OpenApi;

use crate::api::rest::{error, handlers};
use crate::domain::service::ExportService;
use crate::guess::ExportRouteTable;

/// OpenAPI description of the export endpoint, relative to the route prefix.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::export),
    components(schemas(error::Problem)),
    tags((name = "API Export", description = "Streamed exports of resource collections"))
)]
pub struct ExportApiDoc;

/// Path of the export route: `{prefix}/{<organization>}/{file}`.
///
/// `{file}` is `<plural>.<ext>` and is resolved against the route table by
/// the handler.
#[must_use]
pub fn export_path(route_prefix: &str, organization_param: &str) -> String {
    format!("{route_prefix}/{{{organization_param}}}/{{file}}")
}

#[allow(clippy::needless_pass_by_value)] // Arcs are moved into the Extension layers
pub fn register_routes(
    router: Router,
    service: Arc<ExportService>,
    routes: Arc<ExportRouteTable>,
    route_prefix: &str,
    organization_param: &str,
) -> Router {
    // GET {prefix}/{organization}/{plural}.{ext}
    router
        .route(
            &export_path(route_prefix, organization_param),
            get(handlers::export),
        )
        .layer(Extension(service))
        .layer(Extension(routes))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn path_includes_prefix_and_placeholders() {
        assert_eq!(export_path("", "organization"), "/{organization}/{file}");
        assert_eq!(export_path("/api", "org"), "/api/{org}/{file}");
    }

    #[test]
    fn openapi_documents_the_export_endpoint() {
        let doc = serde_json::to_value(ExportApiDoc::openapi()).unwrap();

        let op = &doc["paths"]["/{organization}/{file}"]["get"];
        assert!(op.is_object());
        let names: Vec<&str> = op["parameters"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p["name"].as_str())
            .collect();
        assert!(names.contains(&"header-type"));
        assert!(doc["components"]["schemas"]["Problem"].is_object());
    }
}
