//! Tenant lookup.

use crate::{
    errors::DomainAuthError,
    tenant::{Tenant, TenantContext},
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Key-value lookup of tenant records by exact name.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Look up a tenant by exact (case-sensitive) name.
    ///
    /// A miss is `Ok(None)`, not an error.
    ///
    /// # Errors
    /// Returns [`DomainAuthError::Store`] when the backing store cannot be
    /// queried.
    async fn find(&self, name: &str) -> Result<Option<Arc<Tenant>>, DomainAuthError>;

    /// Resolve the identifier into the tenant context for one request.
    ///
    /// # Errors
    /// Returns [`DomainAuthError::TenantNotFound`] carrying the identifier
    /// when no tenant matches, or the store error from [`TenantStore::find`].
    async fn resolve(&self, identifier: &str) -> Result<TenantContext, DomainAuthError> {
        if let Some(tenant) = self.find(identifier).await? {
            Ok(TenantContext::new(tenant))
        } else {
            tracing::info!(domain = %identifier, "Domain not found");
            Err(DomainAuthError::tenant_not_found(identifier))
        }
    }

    /// Build a tenant record with default attributes. Nothing is persisted.
    fn create(&self, identifier: &str) -> Tenant {
        Tenant::create(identifier)
    }
}

/// In-process tenant store.
#[derive(Debug, Default)]
pub struct InMemoryTenantStore {
    tenants: DashMap<String, Arc<Tenant>>,
}

impl InMemoryTenantStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a tenant under its name, returning the record it replaced.
    pub fn insert(&self, tenant: Tenant) -> Option<Arc<Tenant>> {
        self.tenants
            .insert(tenant.name().to_owned(), Arc::new(tenant))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tenants.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

impl FromIterator<Tenant> for InMemoryTenantStore {
    fn from_iter<I: IntoIterator<Item = Tenant>>(iter: I) -> Self {
        let store = Self::new();
        for tenant in iter {
            store.insert(tenant);
        }
        store
    }
}

#[async_trait]
impl TenantStore for InMemoryTenantStore {
    async fn find(&self, name: &str) -> Result<Option<Arc<Tenant>>, DomainAuthError> {
        Ok(self
            .tenants
            .get(name)
            .map(|entry| Arc::clone(entry.value())))
    }
}
