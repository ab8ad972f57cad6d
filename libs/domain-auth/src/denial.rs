//! Access-denied page shown when a resolved tenant rejects the caller.

use crate::{config::RedirectConfig, tenant::Tenant};
use url::form_urlencoded;

/// Content of the access-denied page: the tenant's display name plus login
/// and logout targets that return the user to the tenant's URL space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDeniedPage {
    domain_name: String,
    login_url: String,
    logout_url: String,
}

impl AccessDeniedPage {
    #[must_use]
    pub fn for_tenant(tenant: &Tenant, redirects: &RedirectConfig) -> Self {
        let context = tenant.url_context();
        Self {
            domain_name: tenant.name().to_owned(),
            login_url: redirect_url(&redirects.login_path, &redirects.continue_param, &context),
            logout_url: redirect_url(
                &redirects.logout_path,
                &redirects.continue_param,
                &context,
            ),
        }
    }

    #[must_use]
    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    #[must_use]
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    #[must_use]
    pub fn logout_url(&self) -> &str {
        &self.logout_url
    }

    #[must_use]
    pub fn render(&self) -> String {
        let domain = escape_html(&self.domain_name);
        let login = escape_html(&self.login_url);
        let logout = escape_html(&self.logout_url);

        format!(
            "<!DOCTYPE html>\n\
             <html>\n\
             <head><title>Access denied</title></head>\n\
             <body>\n\
             <h1>Access denied</h1>\n\
             <p>Your account does not have access to <strong>{domain}</strong>.</p>\n\
             <p><a href=\"{login}\">Sign in with a {domain} account</a> \
             or <a href=\"{logout}\">sign out</a>.</p>\n\
             </body>\n\
             </html>\n"
        )
    }
}

#[cfg(feature = "axum-ext")]
impl axum::response::IntoResponse for AccessDeniedPage {
    fn into_response(self) -> axum::response::Response {
        (
            axum::http::StatusCode::FORBIDDEN,
            axum::response::Html(self.render()),
        )
            .into_response()
    }
}

fn redirect_url(path: &str, param: &str, context: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    let param: String = form_urlencoded::byte_serialize(param.as_bytes()).collect();
    let value: String = form_urlencoded::byte_serialize(context.as_bytes()).collect();
    format!("{path}{separator}{param}={value}")
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
