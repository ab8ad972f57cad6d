use crate::{
    cache::AdminVerificationCache,
    directory::{DirectoryError, RemoteDirectoryClient},
    tenant::Tenant,
    user::CurrentUser,
};
use std::sync::Arc;
use std::time::Duration;

/// Default bound on a single remote directory call.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// What a protected operation demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessRequirement {
    /// The caller's e-mail domain must equal the tenant name.
    #[default]
    DomainAccount,
    /// The caller must be a domain admin (or an allowed superuser).
    DomainAdmin,
}

impl AccessRequirement {
    #[must_use]
    pub fn from_require_admin(require_admin: bool) -> Self {
        if require_admin {
            Self::DomainAdmin
        } else {
            Self::DomainAccount
        }
    }

    #[must_use]
    pub fn requires_admin(self) -> bool {
        self == Self::DomainAdmin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No authenticated user.
    Unauthenticated,
    /// The user identity is not of the form `local@domain`.
    MalformedIdentity,
    /// The user belongs to a different domain.
    ForeignDomain,
    /// Admin required, and neither superuser bypass nor directory verification
    /// succeeded.
    NotDomainAdmin,
}

impl DenialReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::MalformedIdentity => "malformed_identity",
            Self::ForeignDomain => "foreign_domain",
            Self::NotDomainAdmin => "not_domain_admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Granted,
    Denied(DenialReason),
}

impl Decision {
    #[must_use]
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

/// Decides whether a user may act within a tenant.
///
/// The only I/O is the directory verification behind the admin cache; all
/// other inputs are passed in explicitly.
pub struct DomainAuthorizer {
    allow_superuser_admins: bool,
    cache: AdminVerificationCache,
    directory: Arc<dyn RemoteDirectoryClient>,
    remote_timeout: Duration,
}

impl DomainAuthorizer {
    #[must_use]
    pub fn new(directory: Arc<dyn RemoteDirectoryClient>, cache: AdminVerificationCache) -> Self {
        Self {
            allow_superuser_admins: false,
            cache,
            directory,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    /// Let platform superusers pass admin checks without directory
    /// verification.
    #[must_use]
    pub fn with_superuser_admins(mut self, allow: bool) -> Self {
        self.allow_superuser_admins = allow;
        self
    }

    #[must_use]
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    #[must_use]
    pub fn allows_superuser_admins(&self) -> bool {
        self.allow_superuser_admins
    }

    #[must_use]
    pub fn cache(&self) -> &AdminVerificationCache {
        &self.cache
    }

    /// Decide access of `user` to `tenant` under `requirement`.
    pub async fn authorize(
        &self,
        tenant: &Tenant,
        user: Option<&CurrentUser>,
        requirement: AccessRequirement,
    ) -> Decision {
        match requirement {
            AccessRequirement::DomainAdmin => {
                tracing::info!(
                    domain = %tenant.name(),
                    user = user.map_or("-", CurrentUser::email),
                    mode = "ADMIN USER",
                    "Authorizing domain request"
                );
                if self.is_domain_admin(tenant, user).await {
                    Decision::Granted
                } else if user.is_none() {
                    Decision::Denied(DenialReason::Unauthenticated)
                } else {
                    Decision::Denied(DenialReason::NotDomainAdmin)
                }
            }
            AccessRequirement::DomainAccount => Self::authorize_member(tenant, user),
        }
    }

    fn authorize_member(tenant: &Tenant, user: Option<&CurrentUser>) -> Decision {
        let Some(user) = user else {
            tracing::info!(domain = %tenant.name(), mode = "USER", "Authorizing domain request without a user");
            return Decision::Denied(DenialReason::Unauthenticated);
        };

        tracing::info!(
            domain = %tenant.name(),
            user = %user.email(),
            mode = "USER",
            "Authorizing domain request"
        );

        match user.split_identity() {
            Ok((_, user_domain)) if user_domain == tenant.name() => Decision::Granted,
            Ok(_) => Decision::Denied(DenialReason::ForeignDomain),
            Err(err) => {
                tracing::warn!(user = %user.email(), error = %err, "Rejecting malformed user identity");
                Decision::Denied(DenialReason::MalformedIdentity)
            }
        }
    }

    /// True for allowed superusers and for users the tenant's directory
    /// verifies as admins. No user means `false` with no remote call.
    pub async fn is_domain_admin(&self, tenant: &Tenant, user: Option<&CurrentUser>) -> bool {
        let Some(user) = user else {
            return false;
        };

        if self.allow_superuser_admins && user.is_superuser() {
            tracing::debug!(domain = %tenant.name(), user = %user.email(), "Superuser admin bypass");
            return true;
        }

        self.is_remote_domain_admin(tenant, user).await
    }

    /// Directory-verified admin check, cached per `(tenant, user)`.
    ///
    /// Any remote failure, including a timeout, yields `false`; the result is
    /// cached either way.
    pub async fn is_remote_domain_admin(&self, tenant: &Tenant, user: &CurrentUser) -> bool {
        self.cache
            .get_or_verify(tenant.name(), user.email(), self.verify_remote(tenant, user))
            .await
    }

    async fn verify_remote(&self, tenant: &Tenant, user: &CurrentUser) -> bool {
        let call = self.directory.list_members(tenant, user.email(), 1);
        let result = match tokio::time::timeout(self.remote_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DirectoryError::Timeout),
        };

        match result {
            Ok(()) => {
                tracing::info!(domain = %tenant.name(), user = %user.email(), "Verified domain admin");
                true
            }
            Err(err) => {
                tracing::warn!(
                    domain = %tenant.name(),
                    user = %user.email(),
                    error = %err,
                    "Domain admin verification failed"
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for DomainAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainAuthorizer")
            .field("allow_superuser_admins", &self.allow_superuser_admins)
            .field("cache", &self.cache)
            .field("remote_timeout", &self.remote_timeout)
            .finish_non_exhaustive()
    }
}
