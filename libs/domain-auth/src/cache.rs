//! Time-bounded cache of remote domain-admin verification results.

use moka::future::Cache;
use std::future::Future;
use std::time::Duration;

/// Default expiry of a cached verification result.
pub const DEFAULT_ADMIN_CACHE_TTL: Duration = Duration::from_secs(600);

/// Default upper bound on cached entries.
pub const DEFAULT_ADMIN_CACHE_MAX_ENTRIES: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AdminCacheKey {
    tenant: String,
    user: String,
}

impl AdminCacheKey {
    fn new(tenant: &str, user: &str) -> Self {
        Self {
            tenant: tenant.to_owned(),
            user: user.to_owned(),
        }
    }
}

/// Shared cache of `(tenant, user) -> is domain admin`.
///
/// Entries are keyed per tenant so a verification for one tenant never
/// answers for another. Both positive and negative results are cached for the
/// full TTL. Writes are last-writer-wins; a result may be stale by up to the
/// TTL.
#[derive(Clone)]
pub struct AdminVerificationCache {
    cache: Cache<AdminCacheKey, bool>,
    ttl: Duration,
}

impl AdminVerificationCache {
    #[must_use]
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache, ttl }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached result, or `None` if absent or expired.
    pub async fn get(&self, tenant: &str, user: &str) -> Option<bool> {
        self.cache.get(&AdminCacheKey::new(tenant, user)).await
    }

    pub async fn insert(&self, tenant: &str, user: &str, is_admin: bool) {
        self.cache
            .insert(AdminCacheKey::new(tenant, user), is_admin)
            .await;
    }

    pub async fn invalidate(&self, tenant: &str, user: &str) {
        self.cache.invalidate(&AdminCacheKey::new(tenant, user)).await;
    }

    /// Return the cached result, or run `verify` and cache what it returns.
    ///
    /// Concurrent misses for the same key wait on a single `verify` future,
    /// so a cold key costs at most one verification.
    pub async fn get_or_verify<F>(&self, tenant: &str, user: &str, verify: F) -> bool
    where
        F: Future<Output = bool>,
    {
        let entry = self
            .cache
            .entry(AdminCacheKey::new(tenant, user))
            .or_insert_with(verify)
            .await;

        if !entry.is_fresh() {
            tracing::debug!(domain = %tenant, user = %user, "Domain admin cache hit");
        }

        entry.into_value()
    }
}

impl Default for AdminVerificationCache {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_CACHE_TTL, DEFAULT_ADMIN_CACHE_MAX_ENTRIES)
    }
}

impl std::fmt::Debug for AdminVerificationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminVerificationCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_cache_miss_when_no_entry_exists() {
        let cache = AdminVerificationCache::default();
        assert_eq!(cache.get("acme.com", "alice@acme.com").await, None);
    }

    #[tokio::test]
    async fn test_negative_results_are_cached() {
        let cache = AdminVerificationCache::default();
        cache.insert("acme.com", "bob@acme.com", false).await;
        assert_eq!(cache.get("acme.com", "bob@acme.com").await, Some(false));
    }

    #[tokio::test]
    async fn test_entries_are_scoped_per_tenant() {
        let cache = AdminVerificationCache::default();
        cache.insert("acme.com", "admin@acme.com", true).await;

        assert_eq!(cache.get("acme.com", "admin@acme.com").await, Some(true));
        assert_eq!(cache.get("globex.com", "admin@acme.com").await, None);
    }

    #[tokio::test]
    async fn test_get_or_verify_runs_verification_once() {
        let cache = AdminVerificationCache::default();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let result = cache
                .get_or_verify("acme.com", "admin@acme.com", async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    true
                })
                .await;
            assert!(result);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_are_coalesced() {
        let cache = AdminVerificationCache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    cache
                        .get_or_verify("acme.com", "admin@acme.com", async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            true
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = AdminVerificationCache::new(Duration::from_millis(300), 100);
        cache.insert("acme.com", "admin@acme.com", true).await;
        assert_eq!(cache.get("acme.com", "admin@acme.com").await, Some(true));

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(cache.get("acme.com", "admin@acme.com").await, None);
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let cache = AdminVerificationCache::default();
        cache.insert("acme.com", "admin@acme.com", true).await;
        cache.invalidate("acme.com", "admin@acme.com").await;
        assert_eq!(cache.get("acme.com", "admin@acme.com").await, None);
    }
}
