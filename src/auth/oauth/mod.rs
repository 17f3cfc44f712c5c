//! OAuth 2.0 authorization-code flow for Shopify apps.
//!
//! The flow sits in front of an application's request pipeline and owns two
//! paths:
//!
//! 1. **Start** (`/auth` by default): resolves the shop, stores a fresh nonce
//!    in the [`StateStore`] and redirects the merchant to Shopify's authorize
//!    URL.
//!
//! 2. **Callback** (`/auth/callback` by default): verifies the callback
//!    (required parameters, state, HMAC, shop hostname), exchanges the code
//!    for an [`AccessToken`](crate::AccessToken), hands it to the
//!    [`PostAuthHook`] and redirects to the success path.
//!
//! Every other path passes through.
//!
//! # Security Features
//!
//! - **HMAC Validation**: Callbacks are verified using HMAC-SHA256 signatures
//! - **CSRF Protection**: The `state` parameter must match a nonce issued for
//!   the same shop within the last five minutes, and is consumed on use
//! - **Constant-Time Comparison**: Signature and state comparisons use
//!   constant-time algorithms to prevent timing attacks
//! - **Key Rotation Support**: Old API secret keys can be configured so
//!   in-flight flows survive a secret rotation
//! - **Hostname Validation**: Only `*.myshopify.com` shops are accepted
//!
//! # Example
//!
//! ```rust,ignore
//! use shopify_oauth::{AuthConfig, ApiKey, ApiSecretKey, HostUrl, AccessToken};
//! use shopify_oauth::auth::oauth::{
//!     AuthFlowController, AuthRequest, FlowResponse, OAuthError, PostAuthHook,
//! };
//!
//! struct SaveToken;
//!
//! #[async_trait::async_trait]
//! impl PostAuthHook for SaveToken {
//!     async fn after_auth(
//!         &self,
//!         _request: &AuthRequest,
//!         shop: &str,
//!         token: &AccessToken,
//!     ) -> Result<(), OAuthError> {
//!         // persist token for shop
//!         Ok(())
//!     }
//! }
//!
//! let config = AuthConfig::builder()
//!     .api_key(ApiKey::new("your-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("your-secret").unwrap())
//!     .host(HostUrl::new("https://your-app.com").unwrap())
//!     .scopes("read_products,write_orders".parse().unwrap())
//!     .after_auth(SaveToken)
//!     .build()
//!     .unwrap();
//!
//! let controller = AuthFlowController::new(config);
//! let outcome = controller.handle(&AuthRequest::from_target(request_target)).await;
//! ```
//!
//! # Online vs Offline Access Tokens
//!
//! - **Offline tokens** ([`AccessMode::Offline`](crate::AccessMode), the
//!   default): app-level, do not expire.
//! - **Online tokens** ([`AccessMode::Online`](crate::AccessMode)): tied to the
//!   admin user who authorized the app and expire, typically after 24 hours.

mod authorize_url;
mod callback_params;
mod controller;
mod error;
pub mod hmac;
pub mod hooks;
pub mod hostname;
pub mod nonce;
mod request;
pub mod state_store;
mod token_exchange;

pub use authorize_url::{build_authorize_url, AUTHORIZE_PATH};
pub use callback_params::{CallbackParams, REQUIRED_PARAMS, SIGNATURE_PARAMS};
pub use controller::AuthFlowController;
pub use error::OAuthError;
pub use hmac::{compute_signature, constant_time_compare, validate_hmac, verify};
pub use hooks::{
    ErrorHook, PostAuthHook, PrePermissionHook, QueryShopResolver, RedirectToFailPath,
    ShopResolver,
};
pub use hostname::is_valid_shop_hostname;
pub use nonce::{BestEffortNonceGenerator, NonceGenerator, NonceStrategy, SecureNonceGenerator};
pub use request::{AuthRequest, FlowOutcome, FlowResponse, FlowState};
pub use state_store::{Clock, StateStore, SystemClock};
pub use token_exchange::{
    parse_token_response, HttpTokenExchanger, TokenExchanger, ACCESS_TOKEN_PATH,
};
