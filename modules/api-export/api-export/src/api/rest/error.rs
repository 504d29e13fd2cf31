use api_export_sdk::Translator;
use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use http::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::error::DomainError;
use crate::domain::translator::messages;

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// RFC 9457 problem details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Problem {
    #[serde(rename = "type")]
    pub type_url: String,
    pub title: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl Problem {
    #[must_use]
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank".to_owned(),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
            instance: String::new(),
            trace_id: None,
        }
    }

    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, [(CONTENT_TYPE, PROBLEM_CONTENT_TYPE)], Json(self)).into_response()
    }
}

/// Convert domain errors to HTTP Problem responses.
///
/// Client-facing messages for format and unclassified failures are
/// translated in the caller's locale; the unclassified cause is only logged.
pub fn domain_error_to_problem(
    err: DomainError,
    translator: &dyn Translator,
    locale: Option<&str>,
) -> Problem {
    match err {
        DomainError::AccessDenied => Problem::new(
            StatusCode::FORBIDDEN,
            "Forbidden",
            "You are not allowed to export this resource",
        ),

        DomainError::InvalidFormat { format } => Problem::new(
            StatusCode::BAD_REQUEST,
            "Invalid Format",
            translator.trans(
                messages::INVALID_FORMAT,
                &[("format", format.as_str())],
                messages::EXCEPTIONS_DOMAIN,
                locale,
            ),
        ),

        DomainError::ExportTargetNotFound { .. } => {
            Problem::new(StatusCode::NOT_FOUND, "Not Found", "")
        }

        DomainError::ResourceNotFound { resource_type } => Problem::new(
            StatusCode::NOT_FOUND,
            "Resource Not Found",
            format!("Unknown resource type: {resource_type}"),
        ),

        DomainError::InvalidRequest { message } => {
            Problem::new(StatusCode::BAD_REQUEST, "Invalid Request", message)
        }

        DomainError::Unclassified(cause) => {
            error!(error = ?cause, "export failed");
            Problem::new(
                StatusCode::BAD_REQUEST,
                "Export Failed",
                translator.trans(messages::ERROR, &[], messages::EXCEPTIONS_DOMAIN, locale),
            )
        }
    }
}
