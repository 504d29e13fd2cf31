use secrecy::SecretString;
use uuid::Uuid;

/// Caller identity for one export request.
///
/// Inserted into the request extensions by the gateway's authentication
/// middleware and read by the export handler. It is handed to the permission
/// service and stored on the [`ResourceQuery`](crate::ResourceQuery) so that
/// transformers can scope the query to the caller.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SecurityContext {
    /// The authenticated user or service making the request.
    subject_id: Uuid,
    /// Subject type classification (e.g., "user", "service").
    subject_type: Option<String>,
    /// Subject's home tenant. Nil for anonymous callers.
    subject_tenant_id: Uuid,
    /// Token capability restrictions. `["*"]` means unrestricted.
    #[serde(default)]
    token_scopes: Vec<String>,
    /// Preferred locale for translated labels and messages (e.g. `"fr"`).
    #[serde(default)]
    locale: Option<String>,
    /// Original bearer token. Never serialized.
    #[serde(skip)]
    bearer_token: Option<SecretString>,
}

impl SecurityContext {
    /// Create a new `SecurityContext` builder
    #[must_use]
    pub fn builder() -> SecurityContextBuilder {
        SecurityContextBuilder::default()
    }

    /// Context for a caller without any identity.
    #[must_use]
    pub fn anonymous() -> Self {
        SecurityContextBuilder::default().build()
    }

    #[must_use]
    pub fn subject_id(&self) -> Uuid {
        self.subject_id
    }

    #[must_use]
    pub fn subject_type(&self) -> Option<&str> {
        self.subject_type.as_deref()
    }

    #[must_use]
    pub fn subject_tenant_id(&self) -> Uuid {
        self.subject_tenant_id
    }

    #[must_use]
    pub fn token_scopes(&self) -> &[String] {
        &self.token_scopes
    }

    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    #[must_use]
    pub fn bearer_token(&self) -> Option<&SecretString> {
        self.bearer_token.as_ref()
    }

    /// `true` when no subject was authenticated.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.subject_id.is_nil()
    }
}

#[derive(Default)]
pub struct SecurityContextBuilder {
    subject_id: Option<Uuid>,
    subject_type: Option<String>,
    subject_tenant_id: Option<Uuid>,
    token_scopes: Vec<String>,
    locale: Option<String>,
    bearer_token: Option<SecretString>,
}

impl SecurityContextBuilder {
    #[must_use]
    pub fn subject_id(mut self, subject_id: Uuid) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    #[must_use]
    pub fn subject_type(mut self, subject_type: &str) -> Self {
        self.subject_type = Some(subject_type.to_owned());
        self
    }

    #[must_use]
    pub fn subject_tenant_id(mut self, subject_tenant_id: Uuid) -> Self {
        self.subject_tenant_id = Some(subject_tenant_id);
        self
    }

    #[must_use]
    pub fn token_scopes(mut self, scopes: Vec<String>) -> Self {
        self.token_scopes = scopes;
        self
    }

    #[must_use]
    pub fn locale(mut self, locale: &str) -> Self {
        self.locale = Some(locale.to_owned());
        self
    }

    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<SecretString>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityContext {
        SecurityContext {
            subject_id: self.subject_id.unwrap_or_default(),
            subject_type: self.subject_type,
            subject_tenant_id: self.subject_tenant_id.unwrap_or_default(),
            token_scopes: self.token_scopes,
            locale: self.locale,
            bearer_token: self.bearer_token,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn builder_sets_all_fields() {
        let subject_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap();
        let tenant_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440002").unwrap();

        let ctx = SecurityContext::builder()
            .subject_id(subject_id)
            .subject_type("user")
            .subject_tenant_id(tenant_id)
            .token_scopes(vec!["export".to_owned()])
            .locale("fr")
            .bearer_token("token-123".to_owned())
            .build();

        assert_eq!(ctx.subject_id(), subject_id);
        assert_eq!(ctx.subject_type(), Some("user"));
        assert_eq!(ctx.subject_tenant_id(), tenant_id);
        assert_eq!(ctx.token_scopes(), &["export"]);
        assert_eq!(ctx.locale(), Some("fr"));
        assert_eq!(
            ctx.bearer_token().map(ExposeSecret::expose_secret),
            Some("token-123")
        );
        assert!(!ctx.is_anonymous());
    }

    #[test]
    fn anonymous_has_nil_identity() {
        let ctx = SecurityContext::anonymous();

        assert!(ctx.is_anonymous());
        assert!(ctx.subject_tenant_id().is_nil());
        assert!(ctx.token_scopes().is_empty());
        assert!(ctx.locale().is_none());
    }

    #[test]
    fn bearer_token_is_not_serialized() {
        let ctx = SecurityContext::builder()
            .subject_id(Uuid::new_v4())
            .bearer_token("secret-token".to_owned())
            .build();

        let serialized = serde_json::to_string(&ctx).unwrap();
        assert!(!serialized.contains("secret-token"));

        let restored: SecurityContext = serde_json::from_str(&serialized).unwrap();
        assert_eq!(restored.subject_id(), ctx.subject_id());
        assert!(restored.bearer_token().is_none());
    }
}
