//! Request guards: tenant binding followed by account verification.
//!
//! Guards are framework-neutral. [`crate::axum_ext`] wires them into axum
//! routers; [`GuardChain::evaluate`] runs both steps directly.

use crate::{
    authorizer::{AccessRequirement, Decision, DenialReason, DomainAuthorizer},
    config::RedirectConfig,
    denial::AccessDeniedPage,
    errors::DomainAuthError,
    store::TenantStore,
    tenant::TenantContext,
    user::CurrentUser,
};
use std::sync::Arc;

/// Route parameter read by [`TenantBinding`] unless configured otherwise.
pub const DEFAULT_TENANT_PATH_PARAM: &str = "domain";

/// Resolves the tenant identifier of a request into its [`TenantContext`].
#[derive(Clone)]
pub struct TenantBinding {
    store: Arc<dyn TenantStore>,
    path_param: Arc<str>,
}

impl TenantBinding {
    #[must_use]
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self {
            store,
            path_param: Arc::from(DEFAULT_TENANT_PATH_PARAM),
        }
    }

    #[must_use]
    pub fn with_path_param(mut self, name: &str) -> Self {
        self.path_param = Arc::from(name);
        self
    }

    /// Name of the route parameter carrying the identifier.
    #[must_use]
    pub fn path_param(&self) -> &str {
        &self.path_param
    }

    /// Bind a request to the tenant named `identifier`.
    ///
    /// # Errors
    /// [`DomainAuthError::TenantNotFound`] when no tenant has that exact name;
    /// the wrapped handler must not run.
    pub async fn bind(&self, identifier: &str) -> Result<TenantContext, DomainAuthError> {
        self.store.resolve(identifier).await
    }
}

impl std::fmt::Debug for TenantBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantBinding")
            .field("path_param", &self.path_param)
            .finish_non_exhaustive()
    }
}

/// Rejection produced by [`AccountRequired`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDenial {
    pub reason: DenialReason,
    pub page: AccessDeniedPage,
}

#[cfg(feature = "axum-ext")]
impl axum::response::IntoResponse for AccountDenial {
    fn into_response(self) -> axum::response::Response {
        self.page.into_response()
    }
}

/// Requires the caller to be a member, or with `require_admin(true)` an
/// admin, of the bound tenant.
#[derive(Debug, Clone)]
pub struct AccountRequired {
    authorizer: Arc<DomainAuthorizer>,
    requirement: AccessRequirement,
    redirects: Arc<RedirectConfig>,
}

impl AccountRequired {
    /// Member-only guard; identical to `.require_admin(false)`.
    #[must_use]
    pub fn new(authorizer: Arc<DomainAuthorizer>, redirects: Arc<RedirectConfig>) -> Self {
        Self {
            authorizer,
            requirement: AccessRequirement::default(),
            redirects,
        }
    }

    #[must_use]
    pub fn require_admin(mut self, require_admin: bool) -> Self {
        self.requirement = AccessRequirement::from_require_admin(require_admin);
        self
    }

    #[must_use]
    pub fn requirement(&self) -> AccessRequirement {
        self.requirement
    }

    /// Check `user` against the tenant bound in `context`.
    ///
    /// # Errors
    /// Returns an [`AccountDenial`] carrying the access-denied page for the
    /// tenant when the decision is a denial.
    pub async fn check(
        &self,
        context: &TenantContext,
        user: Option<&CurrentUser>,
    ) -> Result<(), AccountDenial> {
        let tenant = context.tenant();
        match self.authorizer.authorize(tenant, user, self.requirement).await {
            Decision::Granted => Ok(()),
            Decision::Denied(reason) => {
                tracing::info!(
                    domain = %tenant.name(),
                    reason = reason.as_str(),
                    "Domain access denied"
                );
                Err(AccountDenial {
                    reason,
                    page: AccessDeniedPage::for_tenant(tenant, &self.redirects),
                })
            }
        }
    }
}

/// Result of running a full [`GuardChain`].
#[derive(Debug)]
pub enum AuthorizationOutcome {
    /// The handler may run with this context.
    Granted(TenantContext),
    /// No tenant with the identifier exists.
    DeniedNotFound { identifier: String },
    /// The tenant exists but rejected the caller.
    DeniedUnauthorized {
        context: TenantContext,
        reason: DenialReason,
        page: AccessDeniedPage,
    },
    /// The tenant store could not be queried.
    Failed(DomainAuthError),
}

impl AuthorizationOutcome {
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }
}

/// Tenant binding, then account verification. Binding always runs first.
#[derive(Debug, Clone)]
pub struct GuardChain {
    binding: TenantBinding,
    account: AccountRequired,
}

impl GuardChain {
    #[must_use]
    pub fn new(binding: TenantBinding, account: AccountRequired) -> Self {
        Self { binding, account }
    }

    #[must_use]
    pub fn binding(&self) -> &TenantBinding {
        &self.binding
    }

    #[must_use]
    pub fn account(&self) -> &AccountRequired {
        &self.account
    }

    pub async fn evaluate(
        &self,
        identifier: &str,
        user: Option<&CurrentUser>,
    ) -> AuthorizationOutcome {
        let context = match self.binding.bind(identifier).await {
            Ok(context) => context,
            Err(DomainAuthError::TenantNotFound { identifier }) => {
                return AuthorizationOutcome::DeniedNotFound { identifier };
            }
            Err(err) => return AuthorizationOutcome::Failed(err),
        };

        match self.account.check(&context, user).await {
            Ok(()) => AuthorizationOutcome::Granted(context),
            Err(AccountDenial { reason, page }) => AuthorizationOutcome::DeniedUnauthorized {
                context,
                reason,
                page,
            },
        }
    }
}
