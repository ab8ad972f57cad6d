use crate::directory::DirectoryError;
use thiserror::Error;

/// Errors that can occur while building the domain authorization stack
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid tenant path parameter: {0}")]
    InvalidPathParam(String),

    #[error("invalid admin cache configuration: {0}")]
    InvalidCache(String),

    #[error("invalid directory configuration: {0}")]
    InvalidDirectory(String),

    #[error("duplicate tenant: {0}")]
    DuplicateTenant(String),

    #[error("directory client error: {0}")]
    Directory(#[from] DirectoryError),
}
