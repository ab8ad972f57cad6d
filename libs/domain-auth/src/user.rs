//! The authenticated user, as established by the authentication layer.

use thiserror::Error;

/// Identity of the authenticated caller.
///
/// Produced by whatever authenticates the request upstream and handed to the
/// guards explicitly; nothing in this crate looks the user up from ambient
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    email: String,
    superuser: bool,
}

/// Reasons an identity cannot be split into local and domain parts.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity has no '@' separator")]
    MissingSeparator,

    #[error("identity has more than one '@' separator")]
    MultipleSeparators,

    #[error("identity has an empty local or domain part")]
    EmptyPart,
}

impl CurrentUser {
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            superuser: false,
        }
    }

    /// Mark the user as a platform-wide superuser.
    #[must_use]
    pub fn with_superuser(mut self, superuser: bool) -> Self {
        self.superuser = superuser;
        self
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.superuser
    }

    /// Split the identity into `(local, domain)`.
    ///
    /// # Errors
    /// Returns an [`IdentityError`] unless the identity contains exactly one
    /// `@` with non-empty text on both sides.
    pub fn split_identity(&self) -> Result<(&str, &str), IdentityError> {
        let (local, domain) = self
            .email
            .split_once('@')
            .ok_or(IdentityError::MissingSeparator)?;

        if domain.contains('@') {
            return Err(IdentityError::MultipleSeparators);
        }
        if local.is_empty() || domain.is_empty() {
            return Err(IdentityError::EmptyPart);
        }

        Ok((local, domain))
    }
}
