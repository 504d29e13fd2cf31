use std::sync::Arc;

use api_export_sdk::{Permission, PermissionService, SecurityContext};
use tracing::{error, warn};

use super::error::DomainError;

/// Permission checks guarding the export action.
///
/// The caller needs `view` on the resource type and the global `export`
/// permission. Errors from the permission service deny access.
#[derive(Clone)]
pub struct AuthorizationGate {
    permissions: Arc<dyn PermissionService>,
}

impl AuthorizationGate {
    #[must_use]
    pub fn new(permissions: Arc<dyn PermissionService>) -> Self {
        Self { permissions }
    }

    /// # Errors
    ///
    /// [`DomainError::AccessDenied`] if either check fails.
    pub async fn authorize_export(
        &self,
        ctx: &SecurityContext,
        resource_type: &str,
    ) -> Result<(), DomainError> {
        self.require(ctx, Permission::View, Some(resource_type))
            .await?;
        self.require(ctx, Permission::Export, None).await
    }

    async fn require(
        &self,
        ctx: &SecurityContext,
        permission: Permission,
        resource_type: Option<&str>,
    ) -> Result<(), DomainError> {
        match self
            .permissions
            .is_granted(ctx, permission, resource_type)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(
                    subject_id = %ctx.subject_id(),
                    permission = %permission,
                    resource_type = resource_type.unwrap_or("*"),
                    "export denied"
                );
                Err(DomainError::AccessDenied)
            }
            Err(e) => {
                error!(
                    error = %e,
                    permission = %permission,
                    "permission check failed, denying export"
                );
                Err(DomainError::AccessDenied)
            }
        }
    }
}
