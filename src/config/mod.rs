//! Configuration for the OAuth flow.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`AuthConfig`]: The immutable configuration the flow runs with
//! - [`AuthConfigBuilder`]: A builder for constructing [`AuthConfig`] instances
//! - [`ApiKey`]: A validated API key newtype
//! - [`ApiSecretKey`]: A validated API secret key newtype with masked debug output
//! - [`HostUrl`]: The validated public base URL of the application
//! - [`AccessMode`]: Whether to request online or offline tokens
//!
//! # Example
//!
//! ```rust,ignore
//! use shopify_oauth::{AuthConfig, ApiKey, ApiSecretKey, HostUrl};
//!
//! let config = AuthConfig::builder()
//!     .api_key(ApiKey::new("my-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .host(HostUrl::new("https://myapp.example.com").unwrap())
//!     .scopes("read_products,write_orders".parse().unwrap())
//!     .after_auth(MyTokenStore::default())
//!     .build()
//!     .unwrap();
//! ```

mod access_mode;
mod newtypes;

pub use access_mode::AccessMode;
pub use newtypes::{ApiKey, ApiSecretKey, HostUrl};

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::oauth::state_store::{DEFAULT_CAPACITY, DEFAULT_TTL};
use crate::auth::oauth::{
    ErrorHook, HttpTokenExchanger, NonceStrategy, PostAuthHook, PrePermissionHook,
    QueryShopResolver, RedirectToFailPath, ShopResolver, TokenExchanger,
};
use crate::auth::AuthScopes;
use crate::error::ConfigError;

/// Default path that starts the flow.
pub const DEFAULT_AUTH_PATH: &str = "/auth";
/// Default path Shopify redirects back to.
pub const DEFAULT_AUTH_CALLBACK_PATH: &str = "/auth/callback";
/// Default redirect after a successful callback.
pub const DEFAULT_SUCCESS_PATH: &str = "/";
/// Default redirect used by the default error hook.
pub const DEFAULT_FAIL_PATH: &str = "/auth/fail";

/// Configuration for the OAuth flow.
///
/// Built once with [`AuthConfig::builder`] and shared read-only by every
/// request afterwards.
///
/// # Thread Safety
///
/// `AuthConfig` is `Clone`, `Send`, and `Sync`. Hooks are held behind `Arc`,
/// so clones share the same hook instances.
///
/// # Key Rotation
///
/// The `old_api_secret_key` field supports seamless key rotation. When
/// validating callback HMAC signatures, the primary key is tried first,
/// then the old key if configured.
#[derive(Clone)]
pub struct AuthConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    old_api_secret_key: Option<ApiSecretKey>,
    host: HostUrl,
    auth_path: String,
    auth_callback_path: String,
    success_path: String,
    fail_path: String,
    success_redirect: Option<String>,
    scopes: AuthScopes,
    access_mode: AccessMode,
    shop_resolver: Arc<dyn ShopResolver>,
    pre_permission_hook: Option<Arc<dyn PrePermissionHook>>,
    after_auth_hook: Arc<dyn PostAuthHook>,
    error_hook: Arc<dyn ErrorHook>,
    hook_timeout: Option<Duration>,
    nonce_strategy: NonceStrategy,
    state_capacity: NonZeroUsize,
    state_ttl: Duration,
    single_use_state: bool,
    token_exchanger: Arc<dyn TokenExchanger>,
}

impl AuthConfig {
    /// Creates a new builder for constructing an `AuthConfig`.
    #[must_use]
    pub fn builder() -> AuthConfigBuilder {
        AuthConfigBuilder::new()
    }

    /// Returns the API key.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the API secret key.
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the old API secret key, if configured.
    #[must_use]
    pub const fn old_api_secret_key(&self) -> Option<&ApiSecretKey> {
        self.old_api_secret_key.as_ref()
    }

    /// Returns the application's public base URL.
    #[must_use]
    pub const fn host(&self) -> &HostUrl {
        &self.host
    }

    /// Returns the path that starts the flow.
    #[must_use]
    pub fn auth_path(&self) -> &str {
        &self.auth_path
    }

    /// Returns the callback path.
    #[must_use]
    pub fn auth_callback_path(&self) -> &str {
        &self.auth_callback_path
    }

    /// Returns the path redirected to after success.
    #[must_use]
    pub fn success_path(&self) -> &str {
        &self.success_path
    }

    /// Returns the path the default error hook redirects to.
    #[must_use]
    pub fn fail_path(&self) -> &str {
        &self.fail_path
    }

    /// Returns the explicit success redirect, if one overrides `success_path`.
    #[must_use]
    pub fn success_redirect(&self) -> Option<&str> {
        self.success_redirect.as_deref()
    }

    /// Returns where a successful callback redirects to.
    #[must_use]
    pub fn success_location(&self) -> &str {
        self.success_redirect().unwrap_or(&self.success_path)
    }

    /// Returns the requested scopes.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the access mode.
    #[must_use]
    pub const fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    /// Returns the shop resolver.
    #[must_use]
    pub fn shop_resolver(&self) -> &dyn ShopResolver {
        self.shop_resolver.as_ref()
    }

    /// Returns the pre-permission hook, if configured.
    #[must_use]
    pub fn pre_permission_hook(&self) -> Option<&dyn PrePermissionHook> {
        self.pre_permission_hook.as_deref()
    }

    /// Returns the post-auth hook.
    #[must_use]
    pub fn after_auth_hook(&self) -> &dyn PostAuthHook {
        self.after_auth_hook.as_ref()
    }

    /// Returns the error hook.
    #[must_use]
    pub fn error_hook(&self) -> &dyn ErrorHook {
        self.error_hook.as_ref()
    }

    /// Returns the hook timeout, if configured.
    #[must_use]
    pub const fn hook_timeout(&self) -> Option<Duration> {
        self.hook_timeout
    }

    /// Returns the nonce strategy.
    #[must_use]
    pub const fn nonce_strategy(&self) -> &NonceStrategy {
        &self.nonce_strategy
    }

    /// Returns the maximum number of pending authorizations.
    #[must_use]
    pub const fn state_capacity(&self) -> NonZeroUsize {
        self.state_capacity
    }

    /// Returns how long a pending authorization stays valid.
    #[must_use]
    pub const fn state_ttl(&self) -> Duration {
        self.state_ttl
    }

    /// Returns whether a matched state is consumed by its callback.
    #[must_use]
    pub const fn single_use_state(&self) -> bool {
        self.single_use_state
    }

    /// Returns the token exchanger.
    #[must_use]
    pub fn token_exchanger(&self) -> &dyn TokenExchanger {
        self.token_exchanger.as_ref()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &self.api_key)
            .field("api_secret_key", &self.api_secret_key)
            .field("old_api_secret_key", &self.old_api_secret_key)
            .field("host", &self.host)
            .field("auth_path", &self.auth_path)
            .field("auth_callback_path", &self.auth_callback_path)
            .field("success_path", &self.success_path)
            .field("fail_path", &self.fail_path)
            .field("success_redirect", &self.success_redirect)
            .field("scopes", &self.scopes)
            .field("access_mode", &self.access_mode)
            .field("pre_permission_hook", &self.pre_permission_hook.is_some())
            .field("hook_timeout", &self.hook_timeout)
            .field("nonce_strategy", &self.nonce_strategy)
            .field("state_capacity", &self.state_capacity)
            .field("state_ttl", &self.state_ttl)
            .field("single_use_state", &self.single_use_state)
            .finish_non_exhaustive()
    }
}

// Verify AuthConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AuthConfig>();
};

/// Builder for constructing [`AuthConfig`] instances.
///
/// Required fields are `api_key`, `api_secret_key`, `host` and `after_auth`.
///
/// # Defaults
///
/// - `auth_path`: `/auth`
/// - `auth_callback_path`: `/auth/callback`
/// - `success_path`: `/`
/// - `fail_path`: `/auth/fail`
/// - `scopes`: Empty
/// - `access_mode`: [`AccessMode::Offline`]
/// - `shop_resolver`: [`QueryShopResolver`]
/// - `error_hook`: [`RedirectToFailPath`] for the configured `fail_path`
/// - `hook_timeout`: `None`
/// - `nonce_strategy`: [`NonceStrategy::Secure`]
/// - `state_capacity`: 5000
/// - `state_ttl`: 5 minutes
/// - `single_use_state`: `true`
/// - `token_exchanger`: [`HttpTokenExchanger`]
#[derive(Default)]
pub struct AuthConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    old_api_secret_key: Option<ApiSecretKey>,
    host: Option<HostUrl>,
    auth_path: Option<String>,
    auth_callback_path: Option<String>,
    success_path: Option<String>,
    fail_path: Option<String>,
    success_redirect: Option<String>,
    scopes: Option<AuthScopes>,
    access_mode: Option<AccessMode>,
    shop_resolver: Option<Arc<dyn ShopResolver>>,
    pre_permission_hook: Option<Arc<dyn PrePermissionHook>>,
    after_auth_hook: Option<Arc<dyn PostAuthHook>>,
    error_hook: Option<Arc<dyn ErrorHook>>,
    hook_timeout: Option<Duration>,
    nonce_strategy: Option<NonceStrategy>,
    state_capacity: Option<usize>,
    state_ttl: Option<Duration>,
    single_use_state: Option<bool>,
    token_exchanger: Option<Arc<dyn TokenExchanger>>,
}

impl AuthConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API secret key (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the old API secret key for key rotation support.
    ///
    /// Callbacks signed with this key keep validating until it is removed.
    #[must_use]
    pub fn old_api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.old_api_secret_key = Some(key);
        self
    }

    /// Sets the application's public base URL (required).
    ///
    /// The `redirect_uri` sent to Shopify is this URL joined with the
    /// callback path.
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the path that starts the flow.
    #[must_use]
    pub fn auth_path(mut self, path: impl Into<String>) -> Self {
        self.auth_path = Some(path.into());
        self
    }

    /// Sets the callback path.
    #[must_use]
    pub fn auth_callback_path(mut self, path: impl Into<String>) -> Self {
        self.auth_callback_path = Some(path.into());
        self
    }

    /// Sets the path redirected to after a successful callback.
    #[must_use]
    pub fn success_path(mut self, path: impl Into<String>) -> Self {
        self.success_path = Some(path.into());
        self
    }

    /// Sets the path the default error hook redirects to.
    #[must_use]
    pub fn fail_path(mut self, path: impl Into<String>) -> Self {
        self.fail_path = Some(path.into());
        self
    }

    /// Overrides the success redirect with an explicit location.
    ///
    /// Unlike `success_path`, this may be an absolute URL.
    #[must_use]
    pub fn success_redirect(mut self, location: impl Into<String>) -> Self {
        self.success_redirect = Some(location.into());
        self
    }

    /// Sets the requested scopes.
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the access mode.
    #[must_use]
    pub const fn access_mode(mut self, mode: AccessMode) -> Self {
        self.access_mode = Some(mode);
        self
    }

    /// Sets how the shop is resolved for start requests.
    #[must_use]
    pub fn shop_resolver(mut self, resolver: impl ShopResolver + 'static) -> Self {
        self.shop_resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets a hook that runs before redirecting to Shopify.
    #[must_use]
    pub fn pre_permission_hook(mut self, hook: impl PrePermissionHook + 'static) -> Self {
        self.pre_permission_hook = Some(Arc::new(hook));
        self
    }

    /// Sets the hook that receives the token (required).
    #[must_use]
    pub fn after_auth(mut self, hook: impl PostAuthHook + 'static) -> Self {
        self.after_auth_hook = Some(Arc::new(hook));
        self
    }

    /// Sets the error hook.
    #[must_use]
    pub fn error_hook(mut self, hook: impl ErrorHook + 'static) -> Self {
        self.error_hook = Some(Arc::new(hook));
        self
    }

    /// Bounds how long any single hook or the token exchange may run.
    #[must_use]
    pub const fn hook_timeout(mut self, timeout: Duration) -> Self {
        self.hook_timeout = Some(timeout);
        self
    }

    /// Sets the nonce strategy.
    #[must_use]
    pub fn nonce_strategy(mut self, strategy: NonceStrategy) -> Self {
        self.nonce_strategy = Some(strategy);
        self
    }

    /// Sets the maximum number of pending authorizations.
    #[must_use]
    pub const fn state_capacity(mut self, capacity: usize) -> Self {
        self.state_capacity = Some(capacity);
        self
    }

    /// Sets how long a pending authorization stays valid.
    #[must_use]
    pub const fn state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = Some(ttl);
        self
    }

    /// Sets whether a matched state is removed by its callback.
    ///
    /// When disabled, the state stays valid until it expires or is replaced,
    /// so the same callback URL can be replayed within the TTL.
    #[must_use]
    pub const fn single_use_state(mut self, single_use: bool) -> Self {
        self.single_use_state = Some(single_use);
        self
    }

    /// Replaces the reqwest-backed token exchanger.
    #[must_use]
    pub fn token_exchanger(mut self, exchanger: impl TokenExchanger + 'static) -> Self {
        self.token_exchanger = Some(Arc::new(exchanger));
        self
    }

    /// Builds the [`AuthConfig`], validating required fields and paths.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingRequiredField`] if `api_key`, `api_secret_key`,
    ///   `host` or `after_auth` is not set
    /// - [`ConfigError::InvalidPath`] if a path does not start with `/`
    /// - [`ConfigError::ConflictingPaths`] if the auth and callback paths match
    /// - [`ConfigError::InvalidStateStoreBound`] if capacity or TTL is zero
    pub fn build(self) -> Result<AuthConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;
        let host = self
            .host
            .ok_or(ConfigError::MissingRequiredField { field: "host" })?;
        let after_auth_hook = self
            .after_auth_hook
            .ok_or(ConfigError::MissingRequiredField {
                field: "after_auth",
            })?;

        let auth_path = validate_path("auth_path", self.auth_path, DEFAULT_AUTH_PATH)?;
        let auth_callback_path = validate_path(
            "auth_callback_path",
            self.auth_callback_path,
            DEFAULT_AUTH_CALLBACK_PATH,
        )?;
        let success_path = validate_path("success_path", self.success_path, DEFAULT_SUCCESS_PATH)?;
        let fail_path = validate_path("fail_path", self.fail_path, DEFAULT_FAIL_PATH)?;

        if auth_path == auth_callback_path {
            return Err(ConfigError::ConflictingPaths { path: auth_path });
        }

        let state_capacity = NonZeroUsize::new(self.state_capacity.unwrap_or(DEFAULT_CAPACITY))
            .ok_or(ConfigError::InvalidStateStoreBound {
                field: "state_capacity",
            })?;
        let state_ttl = self.state_ttl.unwrap_or(DEFAULT_TTL);
        if state_ttl.is_zero() {
            return Err(ConfigError::InvalidStateStoreBound { field: "state_ttl" });
        }

        let error_hook = self
            .error_hook
            .unwrap_or_else(|| Arc::new(RedirectToFailPath::new(fail_path.clone())));

        Ok(AuthConfig {
            api_key,
            api_secret_key,
            old_api_secret_key: self.old_api_secret_key,
            host,
            auth_path,
            auth_callback_path,
            success_path,
            fail_path,
            success_redirect: self.success_redirect,
            scopes: self.scopes.unwrap_or_default(),
            access_mode: self.access_mode.unwrap_or_default(),
            shop_resolver: self
                .shop_resolver
                .unwrap_or_else(|| Arc::new(QueryShopResolver)),
            pre_permission_hook: self.pre_permission_hook,
            after_auth_hook,
            error_hook,
            hook_timeout: self.hook_timeout,
            nonce_strategy: self.nonce_strategy.unwrap_or_default(),
            state_capacity,
            state_ttl,
            single_use_state: self.single_use_state.unwrap_or(true),
            token_exchanger: self
                .token_exchanger
                .unwrap_or_else(|| Arc::new(HttpTokenExchanger::new())),
        })
    }
}

impl fmt::Debug for AuthConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfigBuilder")
            .field("api_key", &self.api_key)
            .field("host", &self.host)
            .field("auth_path", &self.auth_path)
            .field("auth_callback_path", &self.auth_callback_path)
            .field("after_auth", &self.after_auth_hook.is_some())
            .finish_non_exhaustive()
    }
}

fn validate_path(
    field: &'static str,
    path: Option<String>,
    default: &str,
) -> Result<String, ConfigError> {
    let path = path.unwrap_or_else(|| default.to_string());
    if path.starts_with('/') && !path.contains('?') {
        Ok(path)
    } else {
        Err(ConfigError::InvalidPath { field, path })
    }
}
