//! Route metadata guessing for the export action.
//!
//! Resources declare which actions they expose. For every `export` action
//! the missing route attributes (defaults, `ext` requirement, methods, path,
//! controller) are filled in once at startup, and the resulting routes are
//! collected into an [`ExportRouteTable`] that the handler resolves
//! `{plural}.{ext}` requests against.

use std::collections::{BTreeMap, HashMap};

use api_export_sdk::{ExportFormat, ResourceMetadata};
use http::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const EXPORT_ACTION: &str = "export";

/// Handler id recorded as the controller of guessed export routes.
pub const EXPORT_CONTROLLER: &str = "api_export::api::rest::handlers::export";

/// Route attribute names.
pub mod route_keys {
    pub const ACTION: &str = "_action";
    pub const ACTION_CLASS: &str = "_action_class";
    pub const EXT: &str = "ext";
}

/// Per-resource export options, usually taken from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportActionConfig {
    /// Repository method building the query, instead of the standard/translated one.
    #[serde(default)]
    pub repository_method: Option<String>,
    /// Root alias of the query.
    #[serde(default)]
    pub alias: Option<String>,
    /// Field keying the result set.
    #[serde(default)]
    pub index_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Export(ExportActionConfig),
    Other(String),
}

impl ActionKind {
    /// Kind of a declared action name; unknown names stay untouched by guessing.
    #[must_use]
    pub fn from_name(name: &str, config: ExportActionConfig) -> Self {
        if name == EXPORT_ACTION {
            Self::Export(config)
        } else {
            Self::Other(name.to_owned())
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Export(_) => EXPORT_ACTION,
            Self::Other(name) => name,
        }
    }
}

/// Route attributes of one resource action.
///
/// `defaults` and `requirements` drive request resolution in
/// [`ExportRouteTable`]. `methods`, `path` and `controller` are descriptive:
/// the module mounts a single `GET {prefix}/{organization}/{file}` route and
/// does not read them, so a preset value changes what is reported, not
/// what is served.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionMetadata {
    pub defaults: BTreeMap<String, String>,
    pub requirements: BTreeMap<String, String>,
    pub methods: Vec<Method>,
    pub path: Option<String>,
    pub controller: Option<String>,
}

/// Fill in the route attributes the action did not set.
pub fn guess_action_config(
    kind: &ActionKind,
    action: &mut ActionMetadata,
    resource: &ResourceMetadata,
    organization_param: &str,
) {
    match kind {
        ActionKind::Export(_) => guess_export(action, resource, organization_param),
        ActionKind::Other(_) => {}
    }
}

fn guess_export(action: &mut ActionMetadata, resource: &ResourceMetadata, organization_param: &str) {
    action
        .defaults
        .insert(route_keys::ACTION.to_owned(), EXPORT_ACTION.to_owned());
    action
        .defaults
        .insert(route_keys::ACTION_CLASS.to_owned(), resource.resource_type.clone());
    action
        .requirements
        .insert(route_keys::EXT.to_owned(), ExportFormat::requirement_pattern());

    if action.methods.is_empty() {
        action.methods = vec![Method::GET];
    }
    if action.path.is_none() {
        action.path = Some(format!(
            "/{{{organization_param}}}/{}.{{{}}}",
            resource.plural_name,
            route_keys::EXT
        ));
    }
    if action.controller.is_none() {
        action.controller = Some(EXPORT_CONTROLLER.to_owned());
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("plural name '{plural_name}' is exported by both '{first}' and '{second}'")]
    DuplicatePluralName {
        plural_name: String,
        first: String,
        second: String,
    },
}

/// A resolved export route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRoute {
    pub resource_type: String,
    pub plural_name: String,
    pub action: ActionMetadata,
    pub config: ExportActionConfig,
}

impl ExportRoute {
    fn accepts(&self, ext: &str) -> bool {
        self.action
            .requirements
            .get(route_keys::EXT)
            .is_some_and(|pattern| pattern.split('|').any(|allowed| allowed == ext))
    }
}

/// Export routes keyed by plural name.
#[derive(Debug, Clone, Default)]
pub struct ExportRouteTable {
    by_plural: HashMap<String, ExportRoute>,
}

impl ExportRouteTable {
    /// Build the table from every resource declaring the `export` action.
    ///
    /// # Errors
    ///
    /// [`RouteTableError::DuplicatePluralName`] if two exported resources
    /// share a plural name.
    pub fn build(
        resources: &[ResourceMetadata],
        configs: &HashMap<String, ExportActionConfig>,
        organization_param: &str,
    ) -> Result<Self, RouteTableError> {
        let mut by_plural: HashMap<String, ExportRoute> = HashMap::new();

        for resource in resources.iter().filter(|r| r.has_action(EXPORT_ACTION)) {
            let config = configs
                .get(&resource.resource_type)
                .cloned()
                .unwrap_or_default();
            let kind = ActionKind::Export(config.clone());
            let mut action = ActionMetadata::default();
            guess_action_config(&kind, &mut action, resource, organization_param);

            if let Some(existing) = by_plural.get(&resource.plural_name) {
                return Err(RouteTableError::DuplicatePluralName {
                    plural_name: resource.plural_name.clone(),
                    first: existing.resource_type.clone(),
                    second: resource.resource_type.clone(),
                });
            }
            by_plural.insert(
                resource.plural_name.clone(),
                ExportRoute {
                    resource_type: resource.resource_type.clone(),
                    plural_name: resource.plural_name.clone(),
                    action,
                    config,
                },
            );
        }

        Ok(Self { by_plural })
    }

    /// Resolve the `{plural}.{ext}` path segment.
    #[must_use]
    pub fn resolve(&self, file: &str) -> Option<(&ExportRoute, ExportFormat)> {
        let (plural, ext) = file.rsplit_once('.')?;
        let route = self.by_plural.get(plural)?;
        if !route.accepts(ext) {
            return None;
        }
        let format = ext.parse().ok()?;
        Some((route, format))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_plural.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_plural.is_empty()
    }

    pub fn routes(&self) -> impl Iterator<Item = &ExportRoute> {
        self.by_plural.values()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn resource(resource_type: &str, plural: &str, actions: &[&str]) -> ResourceMetadata {
        ResourceMetadata {
            resource_type: resource_type.to_owned(),
            name: resource_type.to_lowercase(),
            plural_name: plural.to_owned(),
            plural_label: plural.to_owned(),
            default_sort: Vec::new(),
            repository: plural.to_owned(),
            actions: actions.iter().map(|a| (*a).to_owned()).collect(),
        }
    }

    #[test]
    fn export_action_gets_defaults() {
        let mut action = ActionMetadata::default();
        let kind = ActionKind::from_name("export", ExportActionConfig::default());

        guess_action_config(
            &kind,
            &mut action,
            &resource("Invoice", "invoices", &["export"]),
            "organization",
        );

        assert_eq!(action.defaults["_action"], "export");
        assert_eq!(action.defaults["_action_class"], "Invoice");
        assert_eq!(action.requirements["ext"], "csv|html|ods|xls|xlsx");
        assert_eq!(action.methods, [Method::GET]);
        assert_eq!(action.path.as_deref(), Some("/{organization}/invoices.{ext}"));
        assert_eq!(action.controller.as_deref(), Some(EXPORT_CONTROLLER));
    }

    #[test]
    fn preset_attributes_are_kept() {
        let mut action = ActionMetadata {
            methods: vec![Method::POST],
            path: Some("/custom/invoices.{ext}".to_owned()),
            controller: Some("custom::handler".to_owned()),
            ..Default::default()
        };

        guess_action_config(
            &ActionKind::Export(ExportActionConfig::default()),
            &mut action,
            &resource("Invoice", "invoices", &["export"]),
            "organization",
        );

        assert_eq!(action.methods, [Method::POST]);
        assert_eq!(action.path.as_deref(), Some("/custom/invoices.{ext}"));
        assert_eq!(action.controller.as_deref(), Some("custom::handler"));
        assert_eq!(action.defaults["_action"], "export");
    }

    #[test]
    fn other_actions_are_untouched() {
        let mut action = ActionMetadata::default();
        let kind = ActionKind::from_name("list", ExportActionConfig::default());
        assert_eq!(kind.name(), "list");

        guess_action_config(
            &kind,
            &mut action,
            &resource("Invoice", "invoices", &["list"]),
            "organization",
        );

        assert_eq!(action, ActionMetadata::default());
    }

    #[test]
    fn table_resolves_plural_and_extension() {
        let table = ExportRouteTable::build(
            &[
                resource("Invoice", "invoices", &["export"]),
                resource("Order", "orders", &["list"]),
            ],
            &HashMap::new(),
            "organization",
        )
        .unwrap();

        assert_eq!(table.len(), 1);
        let (route, format) = table.resolve("invoices.xlsx").unwrap();
        assert_eq!(route.resource_type, "Invoice");
        assert_eq!(format, ExportFormat::Xlsx);
        assert_eq!(
            route.action.path.as_deref(),
            Some("/{organization}/invoices.{ext}")
        );

        assert!(table.resolve("invoices.pdf").is_none());
        assert!(table.resolve("orders.csv").is_none());
        assert!(table.resolve("invoices").is_none());
    }

    #[test]
    fn table_carries_resource_config() {
        let configs = HashMap::from([(
            "Invoice".to_owned(),
            ExportActionConfig {
                repository_method: Some("createExportQuery".to_owned()),
                ..Default::default()
            },
        )]);
        let table = ExportRouteTable::build(
            &[resource("Invoice", "invoices", &["export"])],
            &configs,
            "organization",
        )
        .unwrap();

        let (route, _) = table.resolve("invoices.csv").unwrap();
        assert_eq!(
            route.config.repository_method.as_deref(),
            Some("createExportQuery")
        );
    }

    #[test]
    fn duplicate_plural_names_are_rejected() {
        let err = ExportRouteTable::build(
            &[
                resource("Invoice", "documents", &["export"]),
                resource("Quote", "documents", &["export"]),
            ],
            &HashMap::new(),
            "organization",
        )
        .unwrap_err();

        assert!(matches!(err, RouteTableError::DuplicatePluralName { .. }));
    }
}
