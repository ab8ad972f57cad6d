//! Trusted-header authentication.
//!
//! Meant to sit behind an authenticating proxy that strips client-supplied
//! copies of these headers. Requests without the e-mail header proceed
//! anonymously.

use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use domain_auth::CurrentUser;

pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const SUPERUSER_HEADER: &str = "x-user-superuser";

fn user_from_headers(headers: &HeaderMap) -> Option<CurrentUser> {
    let email = headers
        .get(USER_EMAIL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())?;

    let superuser = headers
        .get(SUPERUSER_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1");

    Some(CurrentUser::new(email).with_superuser(superuser))
}

pub async fn trusted_headers(mut request: Request, next: Next) -> Response {
    if let Some(user) = user_from_headers(request.headers()) {
        tracing::debug!(user = %user.email(), superuser = user.is_superuser(), "Authenticated via trusted headers");
        request.extensions_mut().insert(user);
    }
    next.run(request).await
}
