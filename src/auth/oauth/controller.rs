//! The authorization flow state machine.
//!
//! [`AuthFlowController::handle`] dispatches on the request path:
//!
//! - the auth path resolves the shop, issues a nonce and redirects to
//!   Shopify's authorize URL
//! - the callback path checks parameter presence, state, HMAC and hostname
//!   (in that order), exchanges the code and hands the token to the
//!   post-auth hook
//! - anything else passes through untouched
//!
//! Every failure, whichever branch raised it, goes to the configured
//! [`ErrorHook`](crate::auth::oauth::ErrorHook).

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::auth::oauth::hmac::{constant_time_compare, validate_hmac};
use crate::auth::oauth::hostname::is_valid_shop_hostname;
use crate::auth::oauth::{
    build_authorize_url, AuthRequest, FlowOutcome, FlowResponse, FlowState, NonceGenerator,
    OAuthError, StateStore,
};
use crate::config::AuthConfig;

/// Drives the OAuth authorization-code flow for one application.
///
/// The controller is `Send + Sync` and is meant to be shared (for example in
/// an `Arc`) by every request handler of the server.
///
/// # Example
///
/// ```rust,ignore
/// use shopify_oauth::auth::oauth::{AuthFlowController, AuthRequest, FlowResponse};
///
/// let controller = AuthFlowController::new(config);
///
/// let outcome = controller
///     .handle(&AuthRequest::from_target("/auth?shop=my-store.myshopify.com"))
///     .await;
///
/// match outcome.response {
///     FlowResponse::PassThrough => { /* call the next handler */ }
///     FlowResponse::Redirect { location } => { /* 302 to location */ }
///     FlowResponse::Respond { status, body } => { /* custom response */ }
/// }
/// ```
pub struct AuthFlowController {
    config: AuthConfig,
    state_store: StateStore,
    nonce_generator: Arc<dyn NonceGenerator>,
}

// Verify AuthFlowController is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AuthFlowController>();
};

impl AuthFlowController {
    /// Creates a controller with a state store sized from `config`.
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        let state_store = StateStore::new(config.state_capacity(), config.state_ttl());
        Self::with_state_store(config, state_store)
    }

    /// Creates a controller with an explicit state store.
    ///
    /// Mainly useful for injecting a store driven by a manual clock.
    #[must_use]
    pub fn with_state_store(config: AuthConfig, state_store: StateStore) -> Self {
        let nonce_generator = config.nonce_strategy().generator();
        Self {
            config,
            state_store,
            nonce_generator,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Returns the pending-authorization store.
    #[must_use]
    pub const fn state_store(&self) -> &StateStore {
        &self.state_store
    }

    /// Handles one inbound request.
    pub async fn handle(&self, request: &AuthRequest) -> FlowOutcome {
        let path = request.path();

        let result = if path == self.config.auth_path() {
            tracing::debug!(path, state = %FlowState::StartRequested, "Handling OAuth start");
            self.begin(request).await
        } else if path == self.config.auth_callback_path() {
            tracing::debug!(path, state = %FlowState::CallbackReceived, "Handling OAuth callback");
            self.complete(request).await
        } else {
            return FlowOutcome::new(FlowState::Idle, FlowResponse::PassThrough);
        };

        match result {
            Ok(location) => {
                FlowOutcome::new(FlowState::Succeeded, FlowResponse::redirect(location))
            }
            Err(error) => {
                let response = self.report(&error, request).await;
                FlowOutcome::new(FlowState::Failed, response)
            }
        }
    }

    /// Start branch. Returns the authorize URL to redirect to.
    async fn begin(&self, request: &AuthRequest) -> Result<String, OAuthError> {
        let shop = self
            .guarded(
                "shop_resolver",
                self.config.shop_resolver().resolve_shop(request),
            )
            .await?;

        if !is_valid_shop_hostname(&shop) {
            return Err(OAuthError::InvalidHostname { hostname: shop });
        }

        let nonce = self.nonce_generator.generate();
        let authorize_url = build_authorize_url(&self.config, &shop, &nonce)?;
        self.state_store.put(&shop, nonce);

        if let Some(hook) = self.config.pre_permission_hook() {
            self.guarded(
                "pre_permission",
                hook.before_permission(&shop, &authorize_url),
            )
            .await?;
        }

        tracing::info!(shop = %shop, "Redirecting to Shopify for authorization");
        Ok(authorize_url)
    }

    /// Callback branch. Returns the post-auth redirect location.
    async fn complete(&self, request: &AuthRequest) -> Result<String, OAuthError> {
        let params = request.callback_params();
        params.validate_required()?;

        // All three are present once validate_required passes
        let shop = params.shop().unwrap_or_default();
        let state = params.state().unwrap_or_default();
        let code = params.code().unwrap_or_default();

        let state_matches = self
            .state_store
            .get(shop)
            .is_some_and(|nonce| constant_time_compare(&nonce, state));
        if !state_matches {
            return Err(OAuthError::StateMismatch {
                shop: shop.to_string(),
            });
        }

        if !validate_hmac(&params, &self.config) {
            return Err(OAuthError::InvalidHmac);
        }

        if !is_valid_shop_hostname(shop) {
            return Err(OAuthError::InvalidHostname {
                hostname: shop.to_string(),
            });
        }

        // Consume only once the callback is known to be authentic; losing
        // this race means another request already used the nonce.
        if self.config.single_use_state() && !self.state_store.take_matching(shop, state) {
            return Err(OAuthError::StateMismatch {
                shop: shop.to_string(),
            });
        }

        let token = self
            .guarded(
                "token_exchange",
                self.config.token_exchanger().exchange(
                    self.config.api_key(),
                    self.config.api_secret_key(),
                    code,
                    shop,
                ),
            )
            .await?;

        self.guarded(
            "after_auth",
            self.config
                .after_auth_hook()
                .after_auth(request, shop, &token),
        )
        .await?;

        tracing::info!(shop, scope = %token.scope(), "OAuth flow completed");
        Ok(self.config.success_location().to_string())
    }

    async fn report(&self, error: &OAuthError, request: &AuthRequest) -> FlowResponse {
        let hook = self.config.error_hook().on_error(error, request);
        match self.config.hook_timeout() {
            None => hook.await,
            Some(limit) => tokio::time::timeout(limit, hook).await.unwrap_or_else(|_| {
                tracing::warn!(error = %error, "Error hook timed out, redirecting to fail path");
                FlowResponse::redirect(self.config.fail_path())
            }),
        }
    }

    /// Awaits `future`, bounded by the configured hook timeout.
    async fn guarded<T, F>(&self, hook: &'static str, future: F) -> Result<T, OAuthError>
    where
        F: Future<Output = Result<T, OAuthError>>,
    {
        match self.config.hook_timeout() {
            None => future.await,
            Some(limit) => tokio::time::timeout(limit, future)
                .await
                .map_err(|_| OAuthError::HookTimeout { hook })?,
        }
    }
}

impl fmt::Debug for AuthFlowController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthFlowController")
            .field("config", &self.config)
            .field("state_store", &self.state_store)
            .finish_non_exhaustive()
    }
}
