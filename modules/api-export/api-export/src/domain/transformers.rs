//! Pre-paginate transformer registration.
//!
//! Transformers are registered once at startup with a priority. The
//! registry validates them and fixes the order in which they run on every
//! export query: higher priority first, registration order among equals.

use std::collections::HashSet;
use std::sync::Arc;

use api_export_sdk::{PrePaginateTransformer, QueryFilter, ResourceQuery, TransformError};
use thiserror::Error;
use tracing::debug;

/// A view transformer offered for registration.
///
/// Only transformers exposing the pre-paginate capability take part in
/// exports; the registry rejects the others.
pub trait ViewTransformer: Send + Sync {
    /// Unique name, used in logs and errors.
    fn name(&self) -> &str;

    fn as_pre_paginate(&self) -> Option<&dyn PrePaginateTransformer> {
        None
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("transformer '{name}' does not implement pre-paginate")]
    MissingCapability { name: String },

    #[error("transformer '{name}' is registered more than once")]
    DuplicateName { name: String },
}

struct Registration {
    priority: i32,
    transformer: Arc<dyn ViewTransformer>,
}

#[derive(Default)]
pub struct TransformerRegistryBuilder {
    registrations: Vec<Registration>,
}

impl TransformerRegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn register(mut self, priority: i32, transformer: Arc<dyn ViewTransformer>) -> Self {
        self.registrations.push(Registration {
            priority,
            transformer,
        });
        self
    }

    /// Validate and freeze the registrations.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::MissingCapability`] for a transformer without pre-paginate support
    /// - [`RegistryError::DuplicateName`] if two transformers share a name
    pub fn build(mut self) -> Result<TransformerRegistry, RegistryError> {
        let mut seen = HashSet::new();
        for reg in &self.registrations {
            let name = reg.transformer.name();
            if reg.transformer.as_pre_paginate().is_none() {
                return Err(RegistryError::MissingCapability {
                    name: name.to_owned(),
                });
            }
            if !seen.insert(name.to_owned()) {
                return Err(RegistryError::DuplicateName {
                    name: name.to_owned(),
                });
            }
        }

        // Stable sort keeps registration order among equal priorities.
        self.registrations
            .sort_by(|a, b| b.priority.cmp(&a.priority));

        Ok(TransformerRegistry {
            transformers: self
                .registrations
                .into_iter()
                .map(|r| r.transformer)
                .collect(),
        })
    }
}

/// Ordered, immutable transformer chain shared by all requests.
#[derive(Clone, Default)]
pub struct TransformerRegistry {
    transformers: Vec<Arc<dyn ViewTransformer>>,
}

impl TransformerRegistry {
    #[must_use]
    pub fn builder() -> TransformerRegistryBuilder {
        TransformerRegistryBuilder::new()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Names in execution order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.transformers.iter().map(|t| t.name())
    }

    /// Run every transformer on `query`, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// The first [`TransformError`] returned by a transformer.
    pub fn apply(&self, query: &mut ResourceQuery) -> Result<(), TransformError> {
        for transformer in &self.transformers {
            // Capability checked in `build`.
            let Some(pre_paginate) = transformer.as_pre_paginate() else {
                continue;
            };
            debug!(transformer = transformer.name(), "running pre-paginate transformer");
            pre_paginate.pre_paginate(query)?;
        }
        Ok(())
    }
}

/// Property holding the owning tenant of a record.
pub const OWNER_TENANT_ID: &str = "owner_tenant_id";

/// Restricts export queries to the caller's tenant.
///
/// A caller without a tenant (nil id) cannot be scoped and is refused.
#[derive(Debug, Default, Clone, Copy)]
pub struct TenantScopeTransformer;

impl TenantScopeTransformer {
    pub const NAME: &'static str = "tenant_scope";
}

impl ViewTransformer for TenantScopeTransformer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn as_pre_paginate(&self) -> Option<&dyn PrePaginateTransformer> {
        Some(self)
    }
}

impl PrePaginateTransformer for TenantScopeTransformer {
    fn pre_paginate(&self, query: &mut ResourceQuery) -> Result<(), TransformError> {
        let tenant_id = query.security_context().subject_tenant_id();
        if tenant_id.is_nil() {
            return Err(TransformError::new(
                Self::NAME,
                "caller has no tenant to scope the export to",
            ));
        }
        query.add_filter(QueryFilter::in_values(
            OWNER_TENANT_ID,
            [tenant_id.to_string()],
        ));
        Ok(())
    }
}
