//! Tenant ("domain") model and the request-scoped tenant context.

use serde::Serialize;
use std::sync::Arc;
use time::OffsetDateTime;

/// Prefix of the per-tenant URL space used for login/logout redirects.
pub const URL_CONTEXT_PREFIX: &str = "/v/";

/// A tenant record.
///
/// The name is the primary key: it is externally visible, immutable once the
/// tenant is created, and doubles as the isolated data namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tenant {
    name: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    primary: bool,
    version: i32,
}

impl Tenant {
    /// Construct a tenant with default attributes (`primary = true`,
    /// `version = 1`, creation time = now). Does not persist it.
    #[must_use]
    pub fn create(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: OffsetDateTime::now_utc(),
            primary: true,
            version: 1,
        }
    }

    /// Mark the tenant as canonical (`true`) or as an alias (`false`).
    #[must_use]
    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: OffsetDateTime) -> Self {
        self.created_at = created_at;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    #[must_use]
    pub fn version(&self) -> i32 {
        self.version
    }

    /// URL space of this tenant, e.g. `/v/acme.com`. Derived, never stored.
    #[must_use]
    pub fn url_context(&self) -> String {
        format!("{URL_CONTEXT_PREFIX}{}", self.name)
    }
}

/// The tenant bound to a single request.
///
/// Carried explicitly (request extensions, function arguments) for the
/// lifetime of one request. Never stored in process-wide state, so concurrent
/// requests for different tenants cannot observe each other's binding.
#[derive(Debug, Clone)]
pub struct TenantContext {
    tenant: Arc<Tenant>,
}

impl TenantContext {
    #[must_use]
    pub fn new(tenant: Arc<Tenant>) -> Self {
        Self { tenant }
    }

    #[must_use]
    pub fn tenant(&self) -> &Tenant {
        &self.tenant
    }

    /// Data namespace for all storage access made on behalf of this request.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.tenant.name()
    }
}
