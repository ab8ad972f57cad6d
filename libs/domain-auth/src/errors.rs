use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainAuthError {
    #[error("Domain '{identifier}' not found")]
    TenantNotFound { identifier: String },

    #[error("Tenant store unavailable: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainAuthError {
    #[must_use]
    pub fn tenant_not_found(identifier: impl Into<String>) -> Self {
        Self::TenantNotFound {
            identifier: identifier.into(),
        }
    }
}

#[cfg(feature = "axum-ext")]
impl axum::response::IntoResponse for DomainAuthError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        use axum::response::Json;
        use serde_json::json;

        let status = match self {
            DomainAuthError::TenantNotFound { .. } => StatusCode::NOT_FOUND,
            DomainAuthError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainAuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
