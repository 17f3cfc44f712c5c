//! Validated newtype wrappers for configuration values.
//!
//! Each wrapper validates its contents on construction so an
//! [`AuthConfig`](crate::AuthConfig) can only hold usable credentials and URLs.

use crate::error::ConfigError;
use std::fmt;
use url::Url;

/// A validated Shopify API key (the OAuth `client_id`).
///
/// # Example
///
/// ```rust
/// use shopify_oauth::ApiKey;
///
/// let key = ApiKey::new("my-api-key").unwrap();
/// assert_eq!(key.as_ref(), "my-api-key");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a new validated API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated Shopify API secret key.
///
/// The secret is only ever used as the HMAC key for callback verification and
/// as the `client_secret` form field of the token exchange. Its `Debug`
/// output is masked so it cannot end up in logs by accident.
///
/// ```rust
/// use shopify_oauth::ApiSecretKey;
///
/// let secret = ApiSecretKey::new("my-secret").unwrap();
/// assert_eq!(format!("{:?}", secret), "ApiSecretKey(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecretKey(String);

impl ApiSecretKey {
    /// Creates a new validated API secret key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiSecretKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiSecretKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiSecretKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecretKey(*****)")
    }
}

/// The public base URL of the application.
///
/// Used to build the `redirect_uri` sent to Shopify: the callback path is
/// resolved against this URL with standard URL-reference resolution.
///
/// # Example
///
/// ```rust
/// use shopify_oauth::HostUrl;
///
/// let host = HostUrl::new("https://myapp.example.com").unwrap();
/// assert_eq!(host.host_name(), Some("myapp.example.com"));
/// assert_eq!(
///     host.resolve("/auth/callback").unwrap(),
///     "https://myapp.example.com/auth/callback"
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostUrl(Url);

impl HostUrl {
    /// Creates a new validated host URL.
    ///
    /// Only `http` and `https` URLs with a host are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHostUrl`] if the URL is invalid.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = url.into();
        let raw = raw.trim();
        let invalid = || ConfigError::InvalidHostUrl {
            url: raw.to_string(),
        };

        let parsed = Url::parse(raw).map_err(|_| invalid())?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(invalid());
        }

        Ok(Self(parsed))
    }

    /// Returns the URL scheme (`http` or `https`).
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> Option<&str> {
        self.0.host_str()
    }

    /// Resolves `reference` against this URL, returning the absolute URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHostUrl`] if the reference cannot be
    /// joined onto the base URL.
    pub fn resolve(&self, reference: &str) -> Result<String, ConfigError> {
        self.0
            .join(reference)
            .map(String::from)
            .map_err(|_| ConfigError::InvalidHostUrl {
                url: format!("{}{reference}", self.0),
            })
    }
}

impl AsRef<str> for HostUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
