//! Integration tests for the OAuth flow controller.
//!
//! These tests drive [`AuthFlowController`] end to end with in-memory
//! collaborators: a fixed nonce generator, a manual clock, recording hooks
//! and a fake token exchanger.
//!
//! Tests cover:
//! - Start redirect carrying the stored nonce
//! - State mismatch, missing parameters, bad HMAC and bad hostname branches
//! - Successful callback reaching the post-auth hook once
//! - Pending state expiry
//! - Concurrent callbacks racing for the same nonce

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use shopify_oauth::auth::oauth::hmac::sign;
use shopify_oauth::auth::oauth::{
    CallbackParams, Clock, ErrorHook, NonceGenerator, NonceStrategy, PostAuthHook,
    PrePermissionHook, StateStore, TokenExchanger,
};
use shopify_oauth::{
    AccessMode, AccessToken, ApiKey, ApiSecretKey, AuthConfig, AuthConfigBuilder,
    AuthFlowController, AuthRequest, AuthScopes, FlowResponse, FlowState, HostUrl, OAuthError,
};

const API_KEY: &str = "test-api-key";
const SECRET: &str = "test-secret";
const SHOP: &str = "test-shop.myshopify.com";
const NONCE: &str = "a1b2c3d4e5f6a1b2c3d4e5f6";

// ============================================================================
// Test collaborators
// ============================================================================

struct FixedNonce;

impl NonceGenerator for FixedNonce {
    fn generate(&self) -> String {
        NONCE.to_string()
    }
}

struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Instant::now()),
        })
    }

    fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}

#[derive(Clone, Default)]
struct FakeExchanger {
    calls: Arc<AtomicUsize>,
    codes: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl TokenExchanger for FakeExchanger {
    async fn exchange(
        &self,
        api_key: &ApiKey,
        _api_secret_key: &ApiSecretKey,
        code: &str,
        _shop: &str,
    ) -> Result<AccessToken, OAuthError> {
        assert_eq!(api_key.as_ref(), API_KEY);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.codes.lock().unwrap().push(code.to_string());
        // Yield so concurrent callbacks interleave
        tokio::task::yield_now().await;
        Ok(AccessToken::new(
            "shpat_integration",
            "read_products".parse().unwrap(),
            None,
        ))
    }
}

#[derive(Clone, Default)]
struct RecordingAfterAuth {
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl PostAuthHook for RecordingAfterAuth {
    async fn after_auth(
        &self,
        _request: &AuthRequest,
        shop: &str,
        token: &AccessToken,
    ) -> Result<(), OAuthError> {
        self.calls
            .lock()
            .unwrap()
            .push((shop.to_string(), token.as_str().to_string()));
        Ok(())
    }
}

struct RejectingAfterAuth;

#[async_trait]
impl PostAuthHook for RejectingAfterAuth {
    async fn after_auth(
        &self,
        _request: &AuthRequest,
        _shop: &str,
        _token: &AccessToken,
    ) -> Result<(), OAuthError> {
        Err(OAuthError::hook("token store unavailable"))
    }
}

#[derive(Clone, Default)]
struct RecordingErrorHook {
    errors: Arc<Mutex<Vec<OAuthError>>>,
}

#[async_trait]
impl ErrorHook for RecordingErrorHook {
    async fn on_error(&self, error: &OAuthError, _request: &AuthRequest) -> FlowResponse {
        self.errors.lock().unwrap().push(error.clone());
        FlowResponse::redirect("/install-failed")
    }
}

#[derive(Clone, Default)]
struct RecordingPrePermission {
    seen: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl PrePermissionHook for RecordingPrePermission {
    async fn before_permission(&self, shop: &str, redirect_url: &str) -> Result<(), OAuthError> {
        self.seen
            .lock()
            .unwrap()
            .push((shop.to_string(), redirect_url.to_string()));
        Ok(())
    }
}

struct Harness {
    controller: AuthFlowController,
    exchanger: FakeExchanger,
    after_auth: RecordingAfterAuth,
    error_hook: RecordingErrorHook,
}

fn base_builder() -> AuthConfigBuilder {
    AuthConfig::builder()
        .api_key(ApiKey::new(API_KEY).unwrap())
        .api_secret_key(ApiSecretKey::new(SECRET).unwrap())
        .host(HostUrl::new("https://myapp.example.com").unwrap())
        .scopes("write_orders,read_customers".parse().unwrap())
        .nonce_strategy(NonceStrategy::Custom(Arc::new(FixedNonce)))
}

fn harness_with(builder: AuthConfigBuilder, state_store: Option<StateStore>) -> Harness {
    let exchanger = FakeExchanger::default();
    let after_auth = RecordingAfterAuth::default();
    let error_hook = RecordingErrorHook::default();

    let config = builder
        .token_exchanger(exchanger.clone())
        .after_auth(after_auth.clone())
        .error_hook(error_hook.clone())
        .build()
        .unwrap();

    let controller = match state_store {
        Some(store) => AuthFlowController::with_state_store(config, store),
        None => AuthFlowController::new(config),
    };

    Harness {
        controller,
        exchanger,
        after_auth,
        error_hook,
    }
}

fn harness() -> Harness {
    harness_with(base_builder(), None)
}

fn signed_query(pairs: &[(&str, &str)], secret: &str) -> String {
    let mut params: CallbackParams = pairs.iter().copied().collect();
    let signature = sign(&params, secret).unwrap();
    params.insert("hmac", signature);

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for key in params.keys() {
        serializer.append_pair(key, params.get(key).unwrap());
    }
    serializer.finish()
}

fn valid_callback(state: &str) -> AuthRequest {
    let query = signed_query(
        &[
            ("code", "auth-code-123"),
            ("shop", SHOP),
            ("state", state),
            ("timestamp", "1700000000"),
        ],
        SECRET,
    );
    AuthRequest::new("/auth/callback", query)
}

fn start_request() -> AuthRequest {
    AuthRequest::from_target(&format!("/auth?shop={SHOP}"))
}

fn query_value(url: &str, key: &str) -> Option<String> {
    url::Url::parse(url)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

// ============================================================================
// Dispatch
// ============================================================================

#[tokio::test]
async fn test_unrelated_paths_pass_through_without_side_effects() {
    let h = harness();

    for target in [
        "/",
        "/products?shop=x",
        "/auth/other",
        "/auth/callback/extra",
    ] {
        let outcome = h.controller.handle(&AuthRequest::from_target(target)).await;
        assert_eq!(outcome.state, FlowState::Idle);
        assert_eq!(outcome.response, FlowResponse::PassThrough);
    }

    assert!(h.controller.state_store().is_empty());
    assert!(h.error_hook.errors.lock().unwrap().is_empty());
}

// ============================================================================
// Start branch
// ============================================================================

#[tokio::test]
async fn test_start_redirects_to_authorize_url_with_stored_nonce() {
    let h = harness();

    let outcome = h.controller.handle(&start_request()).await;

    assert_eq!(outcome.state, FlowState::Succeeded);
    let location = outcome.response.location().unwrap().to_string();
    assert_eq!(outcome.response.status(), Some(302));
    assert!(location.starts_with("https://test-shop.myshopify.com/admin/oauth/authorize?"));
    assert_eq!(
        query_value(&location, "client_id").as_deref(),
        Some(API_KEY)
    );
    assert_eq!(
        query_value(&location, "scope").as_deref(),
        Some("write_orders,read_customers")
    );
    assert_eq!(
        query_value(&location, "redirect_uri").as_deref(),
        Some("https://myapp.example.com/auth/callback")
    );

    let stored = h.controller.state_store().get(SHOP).unwrap();
    assert_eq!(query_value(&location, "state"), Some(stored));
}

#[tokio::test]
async fn test_start_in_online_mode_requests_per_user_grant() {
    let h = harness_with(base_builder().access_mode(AccessMode::Online), None);

    let outcome = h.controller.handle(&start_request()).await;

    let location = outcome.response.location().unwrap();
    assert_eq!(
        query_value(location, "grant_options[]").as_deref(),
        Some("per-user")
    );
}

#[tokio::test]
async fn test_start_without_shop_routes_to_error_hook() {
    let h = harness();

    let outcome = h
        .controller
        .handle(&AuthRequest::from_target("/auth"))
        .await;

    assert_eq!(outcome.state, FlowState::Failed);
    assert_eq!(outcome.response, FlowResponse::redirect("/install-failed"));
    let errors = h.error_hook.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], OAuthError::ShopResolution { .. }));
}

#[tokio::test]
async fn test_start_runs_pre_permission_hook_with_authorize_url() {
    let pre = RecordingPrePermission::default();
    let h = harness_with(base_builder().pre_permission_hook(pre.clone()), None);

    let outcome = h.controller.handle(&start_request()).await;

    let seen = pre.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, SHOP);
    assert_eq!(Some(seen[0].1.as_str()), outcome.response.location());
}

#[tokio::test]
async fn test_repeated_start_replaces_nonce_for_shop() {
    let h = harness_with(
        base_builder().nonce_strategy(NonceStrategy::BestEffort),
        None,
    );

    let first = h.controller.handle(&start_request()).await;
    let second = h.controller.handle(&start_request()).await;

    let first_state = query_value(first.response.location().unwrap(), "state").unwrap();
    let second_state = query_value(second.response.location().unwrap(), "state").unwrap();
    assert_ne!(first_state, second_state);
    assert_eq!(second_state.len(), 24);
    assert_eq!(h.controller.state_store().len(), 1);
    assert_eq!(h.controller.state_store().get(SHOP), Some(second_state));
}

// ============================================================================
// Callback branch
// ============================================================================

#[tokio::test]
async fn test_valid_callback_calls_after_auth_once_and_redirects_to_success() {
    let h = harness();
    h.controller.handle(&start_request()).await;

    let outcome = h.controller.handle(&valid_callback(NONCE)).await;

    assert_eq!(outcome.state, FlowState::Succeeded);
    assert_eq!(outcome.response, FlowResponse::redirect("/"));

    let calls = h.after_auth.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, SHOP);
    assert!(!calls[0].1.is_empty());
    assert_eq!(
        h.exchanger.codes.lock().unwrap().as_slice(),
        ["auth-code-123".to_string()]
    );
    assert!(h.error_hook.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_valid_callback_uses_success_redirect_override() {
    let h = harness_with(
        base_builder().success_redirect("https://admin.shopify.com/store/test-shop/apps/my-app"),
        None,
    );
    h.controller.handle(&start_request()).await;

    let outcome = h.controller.handle(&valid_callback(NONCE)).await;

    assert_eq!(
        outcome.response,
        FlowResponse::redirect("https://admin.shopify.com/store/test-shop/apps/my-app")
    );
}

#[tokio::test]
async fn test_state_mismatch_calls_error_hook_and_never_after_auth() {
    let h = harness();
    h.controller.handle(&start_request()).await;

    let outcome = h
        .controller
        .handle(&valid_callback("ffffffffffffffffffffffff"))
        .await;

    assert_eq!(outcome.state, FlowState::Failed);
    assert_eq!(outcome.response, FlowResponse::redirect("/install-failed"));
    assert_eq!(
        h.error_hook.errors.lock().unwrap().as_slice(),
        [OAuthError::StateMismatch {
            shop: SHOP.to_string()
        }]
    );
    assert!(h.after_auth.calls.lock().unwrap().is_empty());
    assert_eq!(h.exchanger.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_callback_without_start_is_state_mismatch() {
    let h = harness();

    let outcome = h.controller.handle(&valid_callback(NONCE)).await;

    assert_eq!(outcome.state, FlowState::Failed);
    assert!(matches!(
        h.error_hook.errors.lock().unwrap()[0],
        OAuthError::StateMismatch { .. }
    ));
}

#[tokio::test]
async fn test_missing_hmac_is_reported_before_other_checks() {
    let h = harness();
    // No start request: a state check would fail too if it ran first
    let request = AuthRequest::new(
        "/auth/callback",
        format!("code=abc&shop={SHOP}&state=wrong&timestamp=1700000000"),
    );

    let outcome = h.controller.handle(&request).await;

    assert_eq!(outcome.state, FlowState::Failed);
    let errors = h.error_hook.errors.lock().unwrap();
    match &errors[0] {
        OAuthError::MissingParameters { present, missing } => {
            assert_eq!(missing, &vec!["hmac".to_string()]);
            assert!(present.contains(&"code".to_string()));
            assert!(present.contains(&"shop".to_string()));
        }
        other => panic!("Expected MissingParameters, got {other:?}"),
    }
    assert_eq!(h.exchanger.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_tampered_callback_fails_hmac() {
    let h = harness();
    h.controller.handle(&start_request()).await;

    let request = valid_callback(NONCE);
    let tampered = request.query().replace("auth-code-123", "auth-code-124");
    let outcome = h
        .controller
        .handle(&AuthRequest::new("/auth/callback", tampered))
        .await;

    assert_eq!(outcome.state, FlowState::Failed);
    assert_eq!(
        h.error_hook.errors.lock().unwrap().as_slice(),
        [OAuthError::InvalidHmac]
    );
    assert_eq!(h.exchanger.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_signed_callback_for_foreign_host_fails_hostname_check() {
    let h = harness();
    let shop = "evil.example.com";
    h.controller.state_store().put(shop, NONCE);

    let query = signed_query(
        &[
            ("code", "auth-code-123"),
            ("shop", shop),
            ("state", NONCE),
            ("timestamp", "1700000000"),
        ],
        SECRET,
    );
    let outcome = h
        .controller
        .handle(&AuthRequest::new("/auth/callback", query))
        .await;

    assert_eq!(outcome.state, FlowState::Failed);
    assert_eq!(
        h.error_hook.errors.lock().unwrap().as_slice(),
        [OAuthError::InvalidHostname {
            hostname: shop.to_string()
        }]
    );
}

#[tokio::test]
async fn test_after_auth_failure_routes_to_error_hook() {
    let error_hook = RecordingErrorHook::default();
    let config = base_builder()
        .token_exchanger(FakeExchanger::default())
        .after_auth(RejectingAfterAuth)
        .error_hook(error_hook.clone())
        .build()
        .unwrap();
    let controller = AuthFlowController::new(config);

    controller.handle(&start_request()).await;
    let outcome = controller.handle(&valid_callback(NONCE)).await;

    assert_eq!(outcome.state, FlowState::Failed);
    assert_eq!(
        error_hook.errors.lock().unwrap().as_slice(),
        [OAuthError::hook("token store unavailable")]
    );
}

#[tokio::test]
async fn test_default_error_hook_redirects_to_fail_path() {
    let config = base_builder()
        .fail_path("/oauth/error")
        .token_exchanger(FakeExchanger::default())
        .after_auth(RecordingAfterAuth::default())
        .build()
        .unwrap();
    let controller = AuthFlowController::new(config);

    let outcome = controller.handle(&valid_callback(NONCE)).await;

    assert_eq!(outcome.response, FlowResponse::redirect("/oauth/error"));
}

// ============================================================================
// State expiry and concurrency
// ============================================================================

#[tokio::test]
async fn test_callback_after_state_ttl_is_rejected() {
    let clock = ManualClock::new();
    let store = StateStore::with_clock(
        NonZeroUsize::new(5000).unwrap(),
        Duration::from_secs(300),
        clock.clone(),
    );
    let h = harness_with(base_builder(), Some(store));

    h.controller.handle(&start_request()).await;
    clock.advance(Duration::from_secs(301));

    let outcome = h.controller.handle(&valid_callback(NONCE)).await;

    assert_eq!(outcome.state, FlowState::Failed);
    assert!(matches!(
        h.error_hook.errors.lock().unwrap()[0],
        OAuthError::StateMismatch { .. }
    ));
    assert!(h.after_auth.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_callback_within_state_ttl_succeeds() {
    let clock = ManualClock::new();
    let store = StateStore::with_clock(
        NonZeroUsize::new(5000).unwrap(),
        Duration::from_secs(300),
        clock.clone(),
    );
    let h = harness_with(base_builder(), Some(store));

    h.controller.handle(&start_request()).await;
    clock.advance(Duration::from_secs(299));

    let outcome = h.controller.handle(&valid_callback(NONCE)).await;
    assert_eq!(outcome.state, FlowState::Succeeded);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callbacks_consume_nonce_once() {
    let h = harness();
    let controller = Arc::new(h.controller);
    controller.handle(&start_request()).await;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.handle(&valid_callback(NONCE)).await })
        })
        .collect();

    let mut succeeded = 0;
    for task in tasks {
        if task.await.unwrap().state == FlowState::Succeeded {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(h.exchanger.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.after_auth.calls.lock().unwrap().len(), 1);
    assert_eq!(h.error_hook.errors.lock().unwrap().len(), 7);
}

#[tokio::test]
async fn test_starts_for_distinct_shops_are_independent() {
    let h = harness();
    let other_shop = "other-shop.myshopify.com";

    h.controller.handle(&start_request()).await;
    h.controller
        .handle(&AuthRequest::from_target(&format!("/auth?shop={other_shop}")))
        .await;
    assert_eq!(h.controller.state_store().len(), 2);

    let outcome = h.controller.handle(&valid_callback(NONCE)).await;
    assert_eq!(outcome.state, FlowState::Succeeded);
    assert!(h.controller.state_store().get(other_shop).is_some());
    assert!(h.controller.state_store().get(SHOP).is_none());
}

#[test]
fn test_controller_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AuthFlowController>();
    assert_send_sync::<AuthScopes>();
}
