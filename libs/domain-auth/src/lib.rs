#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Domain-scoped request authorization.
//!
//! Every protected request is bound to a tenant ("domain") resolved from the
//! request path. Access is granted when the authenticated user's e-mail domain
//! matches the tenant, or, for admin routes, when the user is verified as a
//! domain admin by the tenant's directory (or is a platform superuser and the
//! configuration allows that bypass).
//!
//! ```ignore
//! let auth = domain_auth::build_domain_auth(&config)?;
//!
//! let member_routes = auth
//!     .guards(AccessRequirement::DomainAccount)
//!     .route_layers(Router::new().route("/v/{domain}/", get(home)));
//! ```

// Core modules
pub mod errors;
pub mod tenant;
pub mod user;

pub mod authorizer;
pub mod cache;
pub mod denial;
pub mod directory;
pub mod guard;
pub mod store;

pub mod config;
pub mod config_error;

#[cfg(feature = "axum-ext")]
pub mod axum_ext;

// Core exports
pub use errors::DomainAuthError;
pub use tenant::{Tenant, TenantContext};
pub use user::{CurrentUser, IdentityError};

pub use authorizer::{AccessRequirement, Decision, DenialReason, DomainAuthorizer};
pub use cache::AdminVerificationCache;
pub use denial::AccessDeniedPage;
pub use directory::{
    DirectoryError, DisabledDirectoryClient, HttpDirectoryClient, RemoteDirectoryClient,
};
pub use guard::{
    AccountDenial, AccountRequired, AuthorizationOutcome, GuardChain, TenantBinding,
};
pub use store::{InMemoryTenantStore, TenantStore};

pub use config::{
    AdminCacheConfig, DirectoryConfig, DomainAuth, DomainAuthConfig, RedirectConfig,
    TenantConfig, build_domain_auth, build_domain_auth_with,
};
pub use config_error::ConfigError;
