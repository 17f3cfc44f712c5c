//! Authorization-code exchange.
//!
//! After a callback passes every check, the authorization code is exchanged
//! for an access token by POSTing a form to the shop's token endpoint:
//!
//! ```text
//! POST https://{shop}/admin/oauth/access_token
//! Content-Type: application/x-www-form-urlencoded
//!
//! client_id=...&client_secret=...&code=...
//! ```
//!
//! The exchange is abstracted behind [`TokenExchanger`] so applications and
//! tests can substitute their own transport. [`HttpTokenExchanger`] is the
//! reqwest-backed default. Exchanges are attempted exactly once; any retry
//! policy belongs to a custom exchanger.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::oauth::OAuthError;
use crate::auth::{AccessToken, AuthScopes};
use crate::config::{ApiKey, ApiSecretKey};

/// Path of the token endpoint on a shop.
pub const ACCESS_TOKEN_PATH: &str = "/admin/oauth/access_token";

/// Exchanges an authorization code for an access token.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Performs a single exchange attempt for `shop`.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::TokenExchangeFailed`] on transport errors,
    /// non-success responses, unparseable bodies, or a missing token.
    async fn exchange(
        &self,
        api_key: &ApiKey,
        api_secret_key: &ApiSecretKey,
        code: &str,
        shop: &str,
    ) -> Result<AccessToken, OAuthError>;
}

/// Form body for the token request.
#[derive(Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

/// Successful token endpoint response.
#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// [`TokenExchanger`] that talks to Shopify over HTTPS with reqwest.
///
/// # Example
///
/// ```rust,ignore
/// use shopify_oauth::auth::oauth::{HttpTokenExchanger, TokenExchanger};
///
/// let exchanger = HttpTokenExchanger::new();
/// let token = exchanger
///     .exchange(&api_key, &api_secret, "auth-code", "my-store.myshopify.com")
///     .await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct HttpTokenExchanger {
    client: reqwest::Client,
    endpoint_override: Option<String>,
}

impl HttpTokenExchanger {
    /// Creates an exchanger that posts to `https://{shop}`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an exchanger that posts to `base_url` regardless of the shop.
    ///
    /// Intended for pointing the exchange at a mock server.
    #[must_use]
    pub fn with_endpoint(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint_override: Some(base_url.into()),
        }
    }

    /// Uses a preconfigured reqwest client (timeouts, proxies, ...).
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn token_url(&self, shop: &str) -> String {
        self.endpoint_override.as_deref().map_or_else(
            || format!("https://{shop}{ACCESS_TOKEN_PATH}"),
            |base| format!("{}{ACCESS_TOKEN_PATH}", base.trim_end_matches('/')),
        )
    }
}

#[async_trait]
impl TokenExchanger for HttpTokenExchanger {
    async fn exchange(
        &self,
        api_key: &ApiKey,
        api_secret_key: &ApiSecretKey,
        code: &str,
        shop: &str,
    ) -> Result<AccessToken, OAuthError> {
        let request_body = TokenExchangeRequest {
            client_id: api_key.as_ref(),
            client_secret: api_secret_key.as_ref(),
            code,
        };

        let response = self
            .client
            .post(self.token_url(shop))
            .form(&request_body)
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed {
                status: 0,
                message: format!("Network error: {e}"),
            })?;

        let status = response.status().as_u16();

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(OAuthError::TokenExchangeFailed {
                status,
                message: error_body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed {
                status,
                message: format!("Failed to read token response: {e}"),
            })?;

        parse_token_response(status, &body)
    }
}

/// Parses a token endpoint body into an [`AccessToken`].
///
/// # Errors
///
/// Returns [`OAuthError::TokenExchangeFailed`] if the body is not JSON or has
/// no non-empty `access_token`.
pub fn parse_token_response(status: u16, body: &str) -> Result<AccessToken, OAuthError> {
    let response: AccessTokenResponse =
        serde_json::from_str(body).map_err(|e| OAuthError::TokenExchangeFailed {
            status,
            message: format!("Failed to parse token response: {e}"),
        })?;

    let token = response
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| OAuthError::TokenExchangeFailed {
            status,
            message: "Token response did not include an access_token".to_string(),
        })?;

    let scope = response
        .scope
        .as_deref()
        .and_then(|scope| scope.parse::<AuthScopes>().ok())
        .unwrap_or_default();

    let expires = response
        .expires_in
        .and_then(chrono::Duration::try_seconds)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));

    Ok(AccessToken::new(token, scope, expires))
}
