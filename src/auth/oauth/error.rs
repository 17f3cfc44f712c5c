//! OAuth flow error types.
//!
//! Every failure branch of the authorization flow produces one
//! [`OAuthError`] variant, and every variant is routed to the single
//! [`ErrorHook`](crate::auth::oauth::ErrorHook).
//!
//! # Example
//!
//! ```rust
//! use shopify_oauth::auth::oauth::OAuthError;
//!
//! let error = OAuthError::InvalidHmac;
//! assert_eq!(error.to_string(), "HMAC signature validation failed");
//!
//! let error = OAuthError::MissingParameters {
//!     present: vec!["code".to_string(), "shop".to_string()],
//!     missing: vec!["hmac".to_string()],
//! };
//! assert!(error.to_string().contains("hmac"));
//! ```

use thiserror::Error;

/// Errors that can occur while driving the OAuth flow.
///
/// # Thread Safety
///
/// `OAuthError` is `Send + Sync`, making it safe to use across async boundaries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OAuthError {
    /// The shop could not be resolved for a start request.
    #[error("Unable to resolve shop: {reason}")]
    ShopResolution {
        /// Why resolution failed.
        reason: String,
    },

    /// Required callback parameters are missing.
    #[error(
        "Callback is missing required parameters [{}]; received [{}]",
        .missing.join(", "),
        .present.join(", ")
    )]
    MissingParameters {
        /// Parameter keys that were present on the request.
        present: Vec<String>,
        /// Required parameter keys that were absent.
        missing: Vec<String>,
    },

    /// The callback `state` does not match the nonce issued for the shop.
    ///
    /// Raised both when the nonce differs and when no nonce is pending
    /// (never issued, expired, evicted, or already consumed).
    #[error("State parameter mismatch for shop '{shop}'")]
    StateMismatch {
        /// The shop the callback claims to be for.
        shop: String,
    },

    /// HMAC signature validation failed.
    #[error("HMAC signature validation failed")]
    InvalidHmac,

    /// The shop hostname is not a valid Shopify shop domain.
    #[error("Invalid shop hostname '{hostname}'")]
    InvalidHostname {
        /// The rejected hostname.
        hostname: String,
    },

    /// Token exchange request failed.
    ///
    /// `status` is `0` when no HTTP response was received.
    #[error("Token exchange failed with status {status}: {message}")]
    TokenExchangeFailed {
        /// The HTTP status code returned, or `0` for transport errors.
        status: u16,
        /// The error message from the response or transport.
        message: String,
    },

    /// A hook reported failure.
    #[error("Hook failed: {reason}")]
    Hook {
        /// The reason reported by the hook.
        reason: String,
    },

    /// A hook did not complete within the configured timeout.
    #[error("Hook '{hook}' timed out")]
    HookTimeout {
        /// Which hook timed out.
        hook: &'static str,
    },

    /// The authorize URL could not be built.
    #[error("Unable to build authorization URL: {reason}")]
    InvalidAuthorizeUrl {
        /// Why the URL was rejected.
        reason: String,
    },
}

impl OAuthError {
    /// Convenience constructor for hook implementations.
    #[must_use]
    pub fn hook(reason: impl Into<String>) -> Self {
        Self::Hook {
            reason: reason.into(),
        }
    }
}

// Verify OAuthError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthError>();
};
