//! Access tokens obtained from the authorization-code exchange.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::auth::AuthScopes;

/// An access token for one shop.
///
/// The token string is opaque. Storage belongs to the application (typically
/// inside its [`PostAuthHook`](crate::auth::oauth::PostAuthHook)); the flow
/// never persists it.
///
/// # Security
///
/// The `Debug` implementation masks the token so it cannot end up in logs.
///
/// # Example
///
/// ```rust
/// use shopify_oauth::AccessToken;
///
/// let token = AccessToken::new("shpat_123", "read_products".parse().unwrap(), None);
/// assert_eq!(token.as_str(), "shpat_123");
/// assert!(!token.expired());
/// assert!(!format!("{token:?}").contains("shpat_123"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    token: String,
    scope: AuthScopes,
    expires: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Creates a new access token.
    #[must_use]
    pub fn new(
        token: impl Into<String>,
        scope: AuthScopes,
        expires: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            token: token.into(),
            scope,
            expires,
        }
    }

    /// Returns the raw token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// Returns the scopes Shopify reported as granted.
    #[must_use]
    pub const fn scope(&self) -> &AuthScopes {
        &self.scope
    }

    /// When this token expires, for online (per-user) tokens.
    #[must_use]
    pub const fn expires(&self) -> Option<DateTime<Utc>> {
        self.expires
    }

    /// Returns `true` if this token has expired.
    ///
    /// Tokens without an expiration time never expire.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.expires.is_some_and(|expires| Utc::now() > expires)
    }
}

impl AsRef<str> for AccessToken {
    fn as_ref(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"*****")
            .field("scope", &self.scope)
            .field("expires", &self.expires)
            .finish()
    }
}

// Verify AccessToken is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AccessToken>();
};
