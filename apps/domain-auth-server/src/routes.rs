use crate::authn;
use axum::{Extension, Json, Router, middleware::from_fn, routing::get};
use domain_auth::{AccessRequirement, CurrentUser, DomainAuth, axum_ext::BoundTenant};
use serde_json::{Value, json};

/// Demo application: a member area and an admin area per domain.
pub fn router(auth: &DomainAuth) -> Router {
    let param = auth.tenant_binding().path_param().to_owned();

    let member = auth
        .guards(AccessRequirement::DomainAccount)
        .route_layers(Router::new().route(&format!("/v/{{{param}}}/"), get(home)));
    let admin = auth
        .guards(AccessRequirement::DomainAdmin)
        .route_layers(Router::new().route(&format!("/v/{{{param}}}/admin"), get(admin_home)));

    Router::new()
        .route("/health", get(health))
        .merge(member)
        .merge(admin)
        .layer(from_fn(authn::trusted_headers))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn home(
    BoundTenant(context): BoundTenant,
    Extension(user): Extension<CurrentUser>,
) -> Json<Value> {
    Json(json!({
        "domain": context.tenant().name(),
        "namespace": context.namespace(),
        "user": user.email(),
    }))
}

async fn admin_home(
    BoundTenant(context): BoundTenant,
    Extension(user): Extension<CurrentUser>,
) -> Json<Value> {
    Json(json!({
        "domain": context.tenant().name(),
        "admin": user.email(),
        "superuser": user.is_superuser(),
    }))
}
