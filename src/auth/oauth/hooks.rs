//! Application hooks invoked by the flow.
//!
//! Each hook is an async trait method returning a `Result`; returning `Ok`
//! continues the flow and returning `Err` routes the request to the
//! [`ErrorHook`]. The flow never times hooks out unless
//! [`AuthConfigBuilder::hook_timeout`](crate::AuthConfigBuilder::hook_timeout)
//! is set, so a hook that never completes holds its request indefinitely.

use async_trait::async_trait;

use crate::auth::oauth::{AuthRequest, FlowResponse, OAuthError};
use crate::auth::AccessToken;

/// Resolves which shop a start request is for.
#[async_trait]
pub trait ShopResolver: Send + Sync {
    /// Returns the shop hostname for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::ShopResolution`] if no shop can be determined.
    async fn resolve_shop(&self, request: &AuthRequest) -> Result<String, OAuthError>;
}

/// Default [`ShopResolver`]: reads the `shop` query parameter.
#[derive(Clone, Copy, Debug, Default)]
pub struct QueryShopResolver;

#[async_trait]
impl ShopResolver for QueryShopResolver {
    async fn resolve_shop(&self, request: &AuthRequest) -> Result<String, OAuthError> {
        request
            .query_param("shop")
            .filter(|shop| !shop.is_empty())
            .ok_or_else(|| OAuthError::ShopResolution {
                reason: "Missing 'shop' query parameter".to_string(),
            })
    }
}

/// Runs before the user is sent to Shopify's permission screen.
///
/// Typical uses are rate limiting or showing a consent page. Returning `Ok`
/// lets the redirect proceed.
#[async_trait]
pub trait PrePermissionHook: Send + Sync {
    /// Called with the shop and the authorize URL about to be used.
    ///
    /// # Errors
    ///
    /// Any error aborts the start request and is passed to the error hook.
    async fn before_permission(&self, shop: &str, redirect_url: &str) -> Result<(), OAuthError>;
}

/// Runs once a token has been obtained. Required.
///
/// This is where the application persists the token.
#[async_trait]
pub trait PostAuthHook: Send + Sync {
    /// Called with the callback request, the shop and the new token.
    ///
    /// # Errors
    ///
    /// Any error (conventionally [`OAuthError::Hook`]) fails the callback.
    async fn after_auth(
        &self,
        request: &AuthRequest,
        shop: &str,
        token: &AccessToken,
    ) -> Result<(), OAuthError>;
}

/// The single sink for every failure of the flow.
#[async_trait]
pub trait ErrorHook: Send + Sync {
    /// Decides the response for a failed request.
    ///
    /// Returning [`FlowResponse::PassThrough`] hands the request on to the
    /// rest of the pipeline.
    async fn on_error(&self, error: &OAuthError, request: &AuthRequest) -> FlowResponse;
}

/// Default [`ErrorHook`]: logs the error and redirects to the fail path.
#[derive(Clone, Debug)]
pub struct RedirectToFailPath {
    fail_path: String,
}

impl RedirectToFailPath {
    /// Creates the hook for `fail_path`.
    #[must_use]
    pub fn new(fail_path: impl Into<String>) -> Self {
        Self {
            fail_path: fail_path.into(),
        }
    }
}

#[async_trait]
impl ErrorHook for RedirectToFailPath {
    async fn on_error(&self, error: &OAuthError, request: &AuthRequest) -> FlowResponse {
        tracing::error!(path = request.path(), error = %error, "OAuth flow failed");
        FlowResponse::redirect(self.fail_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_query_shop_resolver_reads_shop_param() {
        let request = AuthRequest::new("/auth", "shop=test.myshopify.com");
        let shop = QueryShopResolver.resolve_shop(&request).await.unwrap();
        assert_eq!(shop, "test.myshopify.com");
    }

    #[tokio::test]
    async fn test_query_shop_resolver_rejects_missing_or_empty_shop() {
        for query in ["", "shop="] {
            let request = AuthRequest::new("/auth", query);
            let result = QueryShopResolver.resolve_shop(&request).await;
            tokio_test::assert_err!(result.clone());
            assert!(matches!(result, Err(OAuthError::ShopResolution { .. })));
        }
    }

    #[tokio::test]
    async fn test_default_error_hook_redirects_to_fail_path() {
        let hook = RedirectToFailPath::new("/install");
        let request = AuthRequest::new("/auth/callback", "");
        let response = hook.on_error(&OAuthError::InvalidHmac, &request).await;
        assert_eq!(response, FlowResponse::redirect("/install"));
    }
}
