//! Request interpretation: turns raw header/query values into [`ExportRequestParams`].

use api_export_sdk::{ExportFormat, HeaderStyle, ResourceMetadata, SortDirection, SortEntry};

use super::error::DomainError;

/// Header names read by the export action.
pub mod headers {
    pub const SORT: &str = "x-sort";
    pub const FIELDS: &str = "x-fields";
    pub const HEADER_TYPE: &str = "x-header-type";
}

/// Query parameter names read by the export action.
pub mod query_params {
    pub const SORT: &str = "sort";
    pub const FIELDS: &str = "fields";
    pub const HEADER_TYPE: &str = "header-type";
}

const LABEL_HEADER_TYPE: &str = "label";

/// Raw request values, one header and one query parameter per setting.
///
/// `None` means "not present"; `Some("")` is a present but empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExportInput {
    pub sort_header: Option<String>,
    pub sort_param: Option<String>,
    pub fields_header: Option<String>,
    pub fields_param: Option<String>,
    pub header_type_header: Option<String>,
    pub header_type_param: Option<String>,
}

impl RawExportInput {
    #[must_use]
    pub fn sort(&self) -> Option<&str> {
        pick(self.sort_header.as_deref(), self.sort_param.as_deref())
    }

    #[must_use]
    pub fn fields(&self) -> Option<&str> {
        pick(self.fields_header.as_deref(), self.fields_param.as_deref())
    }

    #[must_use]
    pub fn header_type(&self) -> Option<&str> {
        pick(
            self.header_type_header.as_deref(),
            self.header_type_param.as_deref(),
        )
    }
}

/// A present header wins over the query parameter, even when empty.
fn pick<'a>(header: Option<&'a str>, param: Option<&'a str>) -> Option<&'a str> {
    header.or(param)
}

/// Interpreted export request. Built once per request, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequestParams {
    resource_type: String,
    sort: Vec<SortEntry>,
    fields: Vec<String>,
    header_style: HeaderStyle,
    format: ExportFormat,
}

impl ExportRequestParams {
    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    #[must_use]
    pub fn sort(&self) -> &[SortEntry] {
        &self.sort
    }

    /// Requested fields; empty means every field.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn header_style(&self) -> HeaderStyle {
        self.header_style
    }

    #[must_use]
    pub fn format(&self) -> ExportFormat {
        self.format
    }
}

/// Build the export parameters for one request.
///
/// # Errors
///
/// [`DomainError::InvalidRequest`] if a sort entry has an unknown direction.
pub fn interpret(
    input: &RawExportInput,
    metadata: &ResourceMetadata,
    format: ExportFormat,
) -> Result<ExportRequestParams, DomainError> {
    let mut sort = parse_sort(input.sort().unwrap_or_default())?;
    if sort.is_empty() {
        sort.clone_from(&metadata.default_sort);
    }

    Ok(ExportRequestParams {
        resource_type: metadata.resource_type.clone(),
        sort,
        fields: parse_fields(input.fields()),
        header_style: parse_header_style(input.header_type()),
        format,
    })
}

/// Parse `field[:direction], ...`.
///
/// # Errors
///
/// [`DomainError::InvalidRequest`] for a direction other than `asc`/`desc`
/// or an entry without a field name.
pub fn parse_sort(raw: &str) -> Result<Vec<SortEntry>, DomainError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (field, direction) = match entry.split_once(':') {
                Some((field, dir)) => {
                    let dir = dir.trim();
                    let direction = SortDirection::parse(dir).ok_or_else(|| {
                        DomainError::invalid_request(format!(
                            "invalid sort direction '{dir}' for field '{}'",
                            field.trim()
                        ))
                    })?;
                    (field.trim(), direction)
                }
                None => (entry, SortDirection::Asc),
            };
            if field.is_empty() {
                return Err(DomainError::invalid_request(format!(
                    "sort entry '{entry}' has no field name"
                )));
            }
            Ok(SortEntry::new(field, direction))
        })
        .collect()
}

/// Split a comma-separated field list. Absent or empty input is "all fields".
#[must_use]
pub fn parse_fields(raw: Option<&str>) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    for field in raw.unwrap_or_default().split(',').map(str::trim) {
        if !field.is_empty() && !fields.iter().any(|f| f == field) {
            fields.push(field.to_owned());
        }
    }
    fields
}

#[must_use]
pub fn parse_header_style(raw: Option<&str>) -> HeaderStyle {
    match raw {
        None | Some("" | LABEL_HEADER_TYPE) => HeaderStyle::Label,
        Some(_) => HeaderStyle::Raw,
    }
}
