use std::io::{self, Write};
use std::sync::Arc;

use api_export_sdk::{ExportWriter, SecurityContext};
use axum::body::{Body, Bytes};
use axum::extract::{Extension, Path, Query};
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use futures_util::{StreamExt, future, stream};
use http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};
use tokio::sync::oneshot;
use tokio_util::io::{ReaderStream, SyncIoBridge};
use tracing::{Span, debug, error, field::Empty, info};

use crate::api::rest::dto::ExportQuery;
use crate::api::rest::error::{Problem, domain_error_to_problem};
use crate::domain::error::DomainError;
use crate::domain::filename::content_disposition;
use crate::domain::service::ExportService;
use crate::guess::ExportRouteTable;

pub const EXPORT_CACHE_CONTROL: &str = "private, no-cache, must-revalidate";

/// Correlation header copied into the span and into problem responses.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Export a resource collection as a file.
#[utoipa::path(
    get,
    path = "/{organization}/{file}",
    params(
        ("organization" = String, Path, description = "Organization the export runs for"),
        ("file" = String, Path, description = "`<plural name>.<csv|html|ods|xls|xlsx>`"),
        ExportQuery
    ),
    responses(
        (status = 200, description = "Exported file, streamed"),
        (status = 400, description = "Invalid format, malformed request or export failure", body = Problem, content_type = "application/problem+json"),
        (status = 403, description = "Caller may not export this resource", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Unknown resource, extension or export target", body = Problem, content_type = "application/problem+json")
    ),
    tag = "API Export"
)]
#[tracing::instrument(
    skip_all,
    fields(
        organization = %organization,
        file = %file,
        request_id = Empty
    )
)]
pub async fn export(
    ctx: Option<Extension<SecurityContext>>,
    Extension(svc): Extension<Arc<ExportService>>,
    Extension(routes): Extension<Arc<ExportRouteTable>>,
    Path((organization, file)): Path<(String, String)>,
    Query(query): Query<ExportQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, Problem> {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);
    if let Some(id) = &request_id {
        Span::current().record("request_id", id.as_str());
    }

    let ctx = ctx.map_or_else(SecurityContext::anonymous, |Extension(ctx)| ctx);
    let to_problem = |e: DomainError| {
        let problem =
            domain_error_to_problem(e, svc.translator(), ctx.locale()).with_instance(uri.path());
        match &request_id {
            Some(id) => problem.with_trace_id(id.as_str()),
            None => problem,
        }
    };

    let Some((route, format)) = routes.resolve(&file) else {
        debug!("no export route matches");
        let problem = Problem::new(
            StatusCode::NOT_FOUND,
            "Not Found",
            format!("No export available at '{file}'"),
        )
        .with_instance(uri.path());
        return Err(problem);
    };

    let input = query.into_input(&headers);
    let prepared = svc
        .prepare_export(&ctx, route, format, &input)
        .await
        .map_err(&to_problem)?;

    let content_type = HeaderValue::from_str(&prepared.artifact.mime_type)
        .map_err(|e| to_problem(DomainError::unclassified(e)))?;
    let disposition = HeaderValue::from_str(&content_disposition(&prepared.filename))
        .map_err(|e| to_problem(DomainError::unclassified(e)))?;

    info!(
        resource_type = %route.resource_type,
        filename = %prepared.filename,
        "Streaming export"
    );

    let body = stream_body(
        prepared.artifact.writer,
        svc.config().stream_buffer_bytes,
        prepared.filename,
    );

    Ok((
        [
            (CONTENT_TYPE, content_type),
            (CONTENT_DISPOSITION, disposition),
            (CACHE_CONTROL, HeaderValue::from_static(EXPORT_CACHE_CONTROL)),
        ],
        body,
    )
        .into_response())
}

/// Run the writer on the blocking pool and stream its output as the body.
///
/// The status line is already sent when the writer runs. A writer failure
/// ends the body with an error item so the transport aborts the response
/// instead of terminating it cleanly.
fn stream_body(writer: Box<dyn ExportWriter>, buffer_bytes: usize, filename: String) -> Body {
    let (reader, pipe) = tokio::io::duplex(buffer_bytes.max(1));
    let mut out = SyncIoBridge::new(pipe);
    let (failure_tx, failure_rx) = oneshot::channel::<io::Error>();
    let span = Span::current();

    tokio::task::spawn_blocking(move || {
        span.in_scope(|| {
            let result = writer
                .save(&mut out)
                .and_then(|()| out.flush())
                .and_then(|()| out.shutdown());
            match result {
                Ok(()) => debug!(filename = %filename, "Export stream completed"),
                Err(e) => {
                    error!(filename = %filename, error = %e, "Export stream aborted");
                    if failure_tx.send(e).is_err() {
                        debug!("response body already dropped");
                    }
                }
            }
        });
    });

    // Resolves after the writer finished; a dropped sender means success.
    let failure = stream::once(failure_rx)
        .filter_map(|received| future::ready(received.ok().map(Err::<Bytes, io::Error>)));

    Body::from_stream(ReaderStream::new(reader).chain(failure))
}
