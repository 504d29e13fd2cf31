//! Export models shared between the module and its collaborators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseFormatError;

/// Output format of an export, identified by its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Html,
    Ods,
    Xls,
    Xlsx,
}

impl ExportFormat {
    /// Every format a route accepts, in declaration order.
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Csv,
        ExportFormat::Html,
        ExportFormat::Ods,
        ExportFormat::Xls,
        ExportFormat::Xlsx,
    ];

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Html => "html",
            Self::Ods => "ods",
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
        }
    }

    /// Route requirement for the `ext` placeholder: `csv|html|ods|xls|xlsx`.
    #[must_use]
    pub fn requirement_pattern() -> String {
        Self::ALL
            .iter()
            .map(|f| f.extension())
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension() == s)
            .ok_or_else(|| ParseFormatError(s.to_owned()))
    }
}

/// How column headers are rendered in the exported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderStyle {
    /// Human-readable, translated field labels.
    #[default]
    Label,
    /// Raw field identifiers.
    Raw,
}

impl HeaderStyle {
    #[must_use]
    pub fn uses_labels(self) -> bool {
        matches!(self, Self::Label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Case-insensitive parse of `asc` / `desc`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

/// One `field:direction` sort criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortEntry {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortEntry {
    #[must_use]
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

impl fmt::Display for SortEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.direction)
    }
}

/// Description of an exportable resource type, owned by the metadata service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    /// Resource type identifier (the entity class).
    pub resource_type: String,
    /// Singular name, e.g. `invoice`.
    pub name: String,
    /// Plural name used in route paths, e.g. `invoices`.
    pub plural_name: String,
    /// Translation key of the plural display label, e.g. `Invoices`.
    pub plural_label: String,
    /// Sort applied when the request does not supply one.
    #[serde(default)]
    pub default_sort: Vec<SortEntry>,
    /// Key of the query provider that builds queries for this resource.
    pub repository: String,
    /// Declared action names (`export`, `list`, ...).
    #[serde(default)]
    pub actions: Vec<String>,
}

impl ResourceMetadata {
    #[must_use]
    pub fn has_action(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }
}

/// Permission checked by the export pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// May view instances of a resource type.
    View,
    /// May perform export actions at all.
    Export,
}

impl Permission {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which repository method builds the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMethod {
    /// Plain query builder.
    Standard,
    /// Query builder joining translated columns.
    Translated,
    /// Repository-specific named method.
    Custom(String),
}

/// Arguments for [`QueryProvider::create_query`](crate::QueryProvider::create_query).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub resource_type: String,
    pub method: QueryMethod,
    /// Root alias of the query, `o` unless the route says otherwise.
    pub alias: String,
    /// Optional field used to key the result set.
    pub index_by: Option<String>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn format_parses_allowed_extensions_only() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("xlsx".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert!("pdf".parse::<ExportFormat>().is_err());
        assert!("CSV".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn requirement_pattern_lists_every_format() {
        assert_eq!(ExportFormat::requirement_pattern(), "csv|html|ods|xls|xlsx");
    }

    #[test]
    fn sort_entry_displays_as_field_colon_direction() {
        assert_eq!(SortEntry::asc("name").to_string(), "name:asc");
        assert_eq!(SortEntry::desc("createdAt").to_string(), "createdAt:desc");
    }

    #[test]
    fn sort_direction_parse_is_case_insensitive() {
        assert_eq!(SortDirection::parse("DESC"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::parse("Asc"), Some(SortDirection::Asc));
        assert_eq!(SortDirection::parse("up"), None);
    }

    #[test]
    fn metadata_deserializes_with_defaults() {
        let meta: ResourceMetadata = serde_json::from_value(serde_json::json!({
            "resource_type": "App\\Entity\\Invoice",
            "name": "invoice",
            "plural_name": "invoices",
            "plural_label": "Invoices",
            "repository": "invoice"
        }))
        .unwrap();

        assert!(meta.default_sort.is_empty());
        assert!(!meta.has_action("export"));
    }
}
