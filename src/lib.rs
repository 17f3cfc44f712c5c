//! # Shopify OAuth Flow
//!
//! The OAuth 2.0 authorization-code handshake a Shopify app performs to obtain
//! an access token for a merchant's shop, packaged as a framework-neutral
//! request handler.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`AuthConfig`] and [`AuthConfigBuilder`]
//! - Validated newtypes for API credentials and the app's base URL
//! - OAuth scope handling with implied scope support
//! - Nonce generation and a bounded, expiring store of pending authorizations
//! - Callback HMAC verification with secret rotation support
//! - Code-for-token exchange over HTTPS
//! - A controller that ties these together behind application hooks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shopify_oauth::{AuthConfig, ApiKey, ApiSecretKey, HostUrl, AccessMode};
//! use shopify_oauth::auth::oauth::{AuthFlowController, AuthRequest, FlowResponse};
//!
//! let config = AuthConfig::builder()
//!     .api_key(ApiKey::new("your-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("your-api-secret").unwrap())
//!     .host(HostUrl::new("https://your-app.com").unwrap())
//!     .scopes("read_products,write_orders".parse().unwrap())
//!     .access_mode(AccessMode::Offline)
//!     .after_auth(TokenStore::default())
//!     .build()
//!     .unwrap();
//!
//! let controller = AuthFlowController::new(config);
//!
//! // In your server's request handler:
//! let outcome = controller.handle(&AuthRequest::from_target(target)).await;
//! match outcome.response {
//!     FlowResponse::PassThrough => next(request).await,
//!     FlowResponse::Redirect { location } => redirect(302, location),
//!     FlowResponse::Respond { status, body } => respond(status, body),
//! }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: All newtypes validate on construction
//! - **Thread-safe**: All types are `Send + Sync`
//! - **Async-first**: Designed for use with Tokio async runtime
//! - **Secrets stay secret**: The API secret and access tokens are masked in
//!   `Debug` output and never logged

pub mod auth;
pub mod config;
pub mod error;

// Re-export public types at crate root for convenience
pub use auth::{AccessToken, AuthScopes};
pub use config::{AccessMode, ApiKey, ApiSecretKey, AuthConfig, AuthConfigBuilder, HostUrl};
pub use error::ConfigError;

// Re-export OAuth flow types for convenience
pub use auth::oauth::{
    AuthFlowController, AuthRequest, FlowOutcome, FlowResponse, FlowState, OAuthError,
};
