use axum::http::HeaderMap;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::params::{RawExportInput, headers};

/// Export query parameters. Each one is overridden by its `x-*` header.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// Comma-separated `field[:asc|desc]` list. Header: `x-sort`.
    #[serde(default)]
    pub sort: Option<String>,

    /// Comma-separated list of fields to export. Header: `x-fields`.
    #[serde(default)]
    pub fields: Option<String>,

    /// `label` (default) for translated column headers, anything else for raw names.
    /// Header: `x-header-type`.
    #[serde(default, rename = "header-type")]
    pub header_type: Option<String>,
}

impl ExportQuery {
    /// Combine with the request headers. Non-UTF-8 header values count as absent.
    #[must_use]
    pub fn into_input(self, request_headers: &HeaderMap) -> RawExportInput {
        let header = |name: &str| {
            request_headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned)
        };

        RawExportInput {
            sort_header: header(headers::SORT),
            sort_param: self.sort,
            fields_header: header(headers::FIELDS),
            fields_param: self.fields,
            header_type_header: header(headers::HEADER_TYPE),
            header_type_param: self.header_type,
        }
    }
}
