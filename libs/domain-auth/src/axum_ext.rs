//! Axum extractors and middleware for domain authorization

use crate::{
    errors::DomainAuthError,
    guard::{AccountRequired, GuardChain, TenantBinding},
    tenant::TenantContext,
    user::CurrentUser,
};
use axum::{
    Router,
    extract::{
        FromRequestParts, MatchedPath, RawPathParams, Request, State,
        rejection::RawPathParamsRejection,
    },
    http::request::Parts,
    middleware::{Next, from_fn_with_state},
    response::{IntoResponse, Response},
};

/// Extractor for the tenant bound by [`tenant_binding`]
#[derive(Debug, Clone)]
pub struct BoundTenant(pub TenantContext);

impl<S> FromRequestParts<S> for BoundTenant
where
    S: Send + Sync,
{
    type Rejection = DomainAuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .map(BoundTenant)
            .ok_or(DomainAuthError::Internal(
                "TenantContext not found - tenant binding not configured".to_owned(),
            ))
    }
}

/// Resolves the tenant named by the route parameter and stores its
/// [`TenantContext`] in the request extensions.
///
/// Unknown tenants get a 404 and the rest of the stack never runs.
pub async fn tenant_binding(
    State(binding): State<TenantBinding>,
    params: Result<RawPathParams, RawPathParamsRejection>,
    mut request: Request,
    next: Next,
) -> Response {
    let identifier = match params {
        Ok(params) => params
            .iter()
            .find(|(name, _)| *name == binding.path_param())
            .map(|(_, value)| value.to_owned()),
        // Undecodable identifiers cannot name a tenant.
        Err(RawPathParamsRejection::InvalidUtf8InPathParam(_)) => {
            let identifier = raw_path_segment(&request, binding.path_param())
                .unwrap_or_else(|| request.uri().path().to_owned());
            tracing::info!(domain = %identifier, "Domain identifier is not valid UTF-8");
            return DomainAuthError::tenant_not_found(identifier).into_response();
        }
        Err(_) => None,
    };

    let Some(identifier) = identifier else {
        tracing::error!(
            path_param = binding.path_param(),
            path = %request.uri().path(),
            "Tenant binding applied to a route without the tenant parameter"
        );
        return DomainAuthError::Internal(format!(
            "route has no '{}' path parameter",
            binding.path_param()
        ))
        .into_response();
    };

    match binding.bind(&identifier).await {
        Ok(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Still percent-encoded path segment at the position of `{param}` in the
/// matched route.
fn raw_path_segment(request: &Request, param: &str) -> Option<String> {
    let matched = request.extensions().get::<MatchedPath>()?;
    let placeholder = format!("{{{param}}}");
    let index = matched
        .as_str()
        .split('/')
        .position(|segment| segment == placeholder)?;
    request
        .uri()
        .path()
        .split('/')
        .nth(index)
        .map(str::to_owned)
}

/// Verifies the caller against the bound tenant.
///
/// Reads the [`TenantContext`] inserted by [`tenant_binding`] and the
/// [`CurrentUser`] inserted by the authentication layer, if any.
pub async fn account_required(
    State(guard): State<AccountRequired>,
    request: Request,
    next: Next,
) -> Response {
    let Some(context) = request.extensions().get::<TenantContext>().cloned() else {
        return DomainAuthError::Internal(
            "TenantContext not found - tenant binding must run before the account guard"
                .to_owned(),
        )
        .into_response();
    };
    let user = request.extensions().get::<CurrentUser>().cloned();

    match guard.check(&context, user.as_ref()).await {
        Ok(()) => next.run(request).await,
        Err(denial) => denial.into_response(),
    }
}

impl GuardChain {
    /// Protect every route of `router` with this chain.
    ///
    /// Layers added later wrap earlier ones, so the binding is added last to
    /// run first.
    #[must_use]
    pub fn route_layers<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
            .route_layer(from_fn_with_state(self.account().clone(), account_required))
            .route_layer(from_fn_with_state(self.binding().clone(), tenant_binding))
    }
}
