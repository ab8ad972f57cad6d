//! Remote directory membership checks.
//!
//! The directory answers one question: can the acting user list the members
//! of the tenant's directory? Only domain admins can, so a successful listing
//! is taken as proof of admin rights. Any failure means "not verified".

mod http;

pub use http::HttpDirectoryClient;

use crate::tenant::Tenant;
use async_trait::async_trait;
use thiserror::Error;

/// Failures of a remote directory call. Never surfaced past the authorizer.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory client is not configured")]
    NotConfigured,

    #[error("invalid directory credentials: {0}")]
    InvalidCredentials(String),

    #[error("invalid directory endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("token exchange failed: {0}")]
    Token(String),

    #[error("directory returned HTTP {status}")]
    Status { status: u16 },

    #[error("directory transport error: {0}")]
    Transport(String),

    #[error("directory response invalid: {0}")]
    InvalidResponse(String),

    #[error("directory call timed out")]
    Timeout,
}

/// Contract of the tenant directory service.
#[async_trait]
pub trait RemoteDirectoryClient: Send + Sync {
    /// List up to `max_results` members of the tenant's directory, acting as
    /// `acting_user`. The payload is irrelevant; success is the answer.
    ///
    /// Implementations must be idempotent and side-effect free on the
    /// directory.
    ///
    /// # Errors
    /// Returns a [`DirectoryError`] on any transport, authentication or API
    /// failure.
    async fn list_members(
        &self,
        tenant: &Tenant,
        acting_user: &str,
        max_results: u32,
    ) -> Result<(), DirectoryError>;
}

/// Directory client for deployments without directory credentials.
/// Every call fails, so remote admin verification always yields `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledDirectoryClient;

#[async_trait]
impl RemoteDirectoryClient for DisabledDirectoryClient {
    async fn list_members(
        &self,
        _tenant: &Tenant,
        _acting_user: &str,
        _max_results: u32,
    ) -> Result<(), DirectoryError> {
        Err(DirectoryError::NotConfigured)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_client_always_fails() {
        let client = DisabledDirectoryClient;
        let result = client
            .list_members(&Tenant::create("acme.com"), "admin@acme.com", 1)
            .await;
        assert!(matches!(result, Err(DirectoryError::NotConfigured)));
    }

    #[test]
    fn test_status_error_renders() {
        let err = DirectoryError::Status { status: 500 };
        assert_eq!(err.to_string(), "directory returned HTTP 500");
    }
}
