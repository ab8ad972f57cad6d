use super::{DirectoryError, RemoteDirectoryClient};
use crate::{config::DirectoryConfig, tenant::Tenant};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of a signed delegation assertion.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Directory client speaking the OAuth2 JWT-bearer flow.
///
/// Each call signs an assertion delegating the service identity to the acting
/// user, exchanges it for an access token, then lists at most `max_results`
/// users of the tenant's directory. Only a domain admin's delegated token is
/// allowed to list users, so a 2xx response is the admin signal.
pub struct HttpDirectoryClient {
    /// Shared HTTP client (pooled connections, bounded timeout)
    http: reqwest::Client,

    token_uri: Url,

    /// `{base_url}/users`
    users_url: Url,

    client_email: String,

    scope: String,

    signing_key: EncodingKey,
}

impl HttpDirectoryClient {
    /// Build a client from directory configuration.
    ///
    /// # Errors
    /// Returns [`DirectoryError::InvalidCredentials`] if the private key is not
    /// an RSA PEM, [`DirectoryError::InvalidEndpoint`] if a URL does not parse,
    /// or [`DirectoryError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &DirectoryConfig) -> Result<Self, DirectoryError> {
        let signing_key =
            EncodingKey::from_rsa_pem(config.oauth_private_key.expose_secret().as_bytes())
                .map_err(|e| {
                    DirectoryError::InvalidCredentials(format!("oauth_private_key: {e}"))
                })?;

        let token_uri = Url::parse(&config.token_uri)
            .map_err(|e| DirectoryError::InvalidEndpoint(format!("token_uri: {e}")))?;
        let users_url = users_endpoint(&config.base_url)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            token_uri,
            users_url,
            client_email: config.oauth_client_email.clone(),
            scope: config.scope.clone(),
            signing_key,
        })
    }

    /// Sign a JWT assertion acting as `subject`.
    fn assertion(&self, subject: &str) -> Result<String, DirectoryError> {
        let iat = OffsetDateTime::now_utc().unix_timestamp();
        let claims = AssertionClaims {
            iss: &self.client_email,
            sub: subject,
            scope: &self.scope,
            aud: self.token_uri.as_str(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| DirectoryError::InvalidCredentials(format!("assertion signing: {e}")))
    }

    /// Exchange a delegation assertion for an access token.
    async fn access_token(&self, subject: &str) -> Result<String, DirectoryError> {
        let assertion = self.assertion(subject)?;

        let response = self
            .http
            .post(self.token_uri.clone())
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Token(format!("HTTP {}", status.as_u16())));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DirectoryError::InvalidResponse(format!("token response: {e}")))?;

        Ok(token.access_token)
    }
}

#[async_trait]
impl RemoteDirectoryClient for HttpDirectoryClient {
    async fn list_members(
        &self,
        tenant: &Tenant,
        acting_user: &str,
        max_results: u32,
    ) -> Result<(), DirectoryError> {
        let token = self.access_token(acting_user).await?;
        let max_results = max_results.to_string();

        let response = self
            .http
            .get(self.users_url.clone())
            .query(&[
                ("domain", tenant.name()),
                ("maxResults", max_results.as_str()),
            ])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DirectoryError::Status {
                status: status.as_u16(),
            })
        }
    }
}

impl std::fmt::Debug for HttpDirectoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDirectoryClient")
            .field("token_uri", &self.token_uri.as_str())
            .field("users_url", &self.users_url.as_str())
            .field("client_email", &self.client_email)
            .finish_non_exhaustive()
    }
}

fn users_endpoint(base_url: &str) -> Result<Url, DirectoryError> {
    let base = if base_url.ends_with('/') {
        Url::parse(base_url)
    } else {
        Url::parse(&format!("{base_url}/"))
    }
    .map_err(|e| DirectoryError::InvalidEndpoint(format!("base_url: {e}")))?;

    base.join("users")
        .map_err(|e| DirectoryError::InvalidEndpoint(format!("base_url: {e}")))
}

fn map_transport_error(e: &reqwest::Error) -> DirectoryError {
    if e.is_timeout() {
        DirectoryError::Timeout
    } else {
        DirectoryError::Transport(e.to_string())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};
    use secrecy::SecretString;

    const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/directory_test_key.pem");
    const PUBLIC_KEY: &str = include_str!("../../tests/fixtures/directory_test_key.pub.pem");

    fn config() -> DirectoryConfig {
        DirectoryConfig {
            oauth_client_email: "svc@project.iam.example.com".to_owned(),
            oauth_private_key: SecretString::from(PRIVATE_KEY.to_owned()),
            token_uri: "https://oauth.example.com/token".to_owned(),
            base_url: "https://directory.example.com/admin/directory/v1".to_owned(),
            scope: "directory.user.readonly".to_owned(),
            timeout_seconds: 5,
        }
    }

    #[test]
    fn test_users_endpoint_appends_segment() {
        let url = users_endpoint("https://directory.example.com/admin/directory/v1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://directory.example.com/admin/directory/v1/users"
        );

        let url = users_endpoint("https://directory.example.com/v1/").unwrap();
        assert_eq!(url.as_str(), "https://directory.example.com/v1/users");
    }

    #[test]
    fn test_users_endpoint_rejects_garbage() {
        assert!(matches!(
            users_endpoint("not a url"),
            Err(DirectoryError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_new_rejects_non_pem_key() {
        let mut config = config();
        config.oauth_private_key = SecretString::from("definitely not a key".to_owned());
        assert!(matches!(
            HttpDirectoryClient::new(&config),
            Err(DirectoryError::InvalidCredentials(_))
        ));
    }

    #[test]
    fn test_assertion_delegates_to_acting_user() {
        let client = HttpDirectoryClient::new(&config()).unwrap();
        let assertion = client.assertion("admin@acme.com").unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&["https://oauth.example.com/token"]);
        validation.set_issuer(&["svc@project.iam.example.com"]);

        let key = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap();
        let decoded = decode::<serde_json::Value>(&assertion, &key, &validation).unwrap();

        assert_eq!(decoded.claims["sub"], "admin@acme.com");
        assert_eq!(decoded.claims["scope"], "directory.user.readonly");
        let iat = decoded.claims["iat"].as_i64().unwrap();
        let exp = decoded.claims["exp"].as_i64().unwrap();
        assert_eq!(exp - iat, ASSERTION_LIFETIME_SECS);
    }

    #[test]
    fn test_debug_hides_signing_key() {
        let client = HttpDirectoryClient::new(&config()).unwrap();
        let rendered = format!("{client:?}");
        assert!(rendered.contains("svc@project.iam.example.com"));
        assert!(!rendered.contains("PRIVATE KEY"));
    }
}
