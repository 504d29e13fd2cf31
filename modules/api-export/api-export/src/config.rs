use std::collections::HashMap;
use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::domain::translator::Catalog;
use crate::guess::ExportActionConfig;

/// Environment variable prefix, e.g. `APP__API_EXPORT__ROUTE_PREFIX=/api`.
pub const ENV_PREFIX: &str = "APP__API_EXPORT__";

/// Configuration for the `api_export` module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiExportConfig {
    /// Path prefix the export routes are mounted under (e.g. `/api`).
    #[serde(default)]
    pub route_prefix: String,

    /// Name of the organization path placeholder.
    #[serde(default = "default_organization_param")]
    pub organization_param: String,

    #[serde(default = "default_alias")]
    pub default_alias: String,

    /// Capacity in bytes of the pipe between encoder and response body.
    #[serde(default = "default_stream_buffer_bytes")]
    pub stream_buffer_bytes: usize,

    /// Register the built-in tenant scope transformer.
    #[serde(default = "default_tenant_scoping")]
    pub tenant_scoping: bool,

    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// locale -> domain -> key -> message, merged over the built-in messages.
    #[serde(default)]
    pub translations: Catalog,

    /// Per resource type export options.
    #[serde(default)]
    pub resources: HashMap<String, ExportActionConfig>,
}

impl Default for ApiExportConfig {
    fn default() -> Self {
        Self {
            route_prefix: String::new(),
            organization_param: default_organization_param(),
            default_alias: default_alias(),
            stream_buffer_bytes: default_stream_buffer_bytes(),
            tenant_scoping: default_tenant_scoping(),
            default_locale: default_locale(),
            translations: Catalog::new(),
            resources: HashMap::new(),
        }
    }
}

impl ApiExportConfig {
    /// Load defaults, then the optional YAML file, then `APP__API_EXPORT__*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or holds unknown or
    /// ill-typed keys.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let cfg = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(cfg)
    }

    /// Check the values that end up in the route path.
    ///
    /// # Errors
    ///
    /// Describes the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.route_prefix.is_empty()
            && (!self.route_prefix.starts_with('/') || self.route_prefix.ends_with('/'))
        {
            anyhow::bail!(
                "route_prefix must be empty or start with '/' without a trailing '/', got '{}'",
                self.route_prefix
            );
        }
        let param_ok = !self.organization_param.is_empty()
            && self
                .organization_param
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !param_ok || self.organization_param == "file" {
            anyhow::bail!(
                "organization_param '{}' is not a valid path placeholder name",
                self.organization_param
            );
        }
        if self.stream_buffer_bytes == 0 {
            anyhow::bail!("stream_buffer_bytes must be greater than zero");
        }
        Ok(())
    }
}

fn default_organization_param() -> String {
    "organization".to_owned()
}

fn default_alias() -> String {
    "o".to_owned()
}

fn default_stream_buffer_bytes() -> usize {
    64 * 1024
}

fn default_tenant_scoping() -> bool {
    true
}

fn default_locale() -> String {
    crate::domain::translator::DEFAULT_LOCALE.to_owned()
}
