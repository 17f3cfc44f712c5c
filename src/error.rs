//! Configuration error types.
//!
//! All configuration constructors and the [`AuthConfigBuilder`] return
//! `Result<T, ConfigError>` so that misconfiguration is caught before the
//! first request is handled.
//!
//! # Example
//!
//! ```rust
//! use shopify_oauth::{ApiKey, ConfigError};
//!
//! let result = ApiKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
//! ```
//!
//! [`AuthConfigBuilder`]: crate::AuthConfigBuilder

use thiserror::Error;

/// Errors that can occur while building an [`AuthConfig`](crate::AuthConfig).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API key cannot be empty.
    #[error("API key cannot be empty. Please provide a valid Shopify API key.")]
    EmptyApiKey,

    /// API secret key cannot be empty.
    #[error("API secret key cannot be empty. Please provide a valid Shopify API secret key.")]
    EmptyApiSecretKey,

    /// Scopes are invalid.
    #[error("Invalid scopes: {reason}")]
    InvalidScopes {
        /// The reason the scopes are invalid.
        reason: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// Host URL is invalid.
    #[error("Invalid host URL '{url}'. Please provide a valid URL with scheme (e.g., 'https://myapp.example.com').")]
    InvalidHostUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// A route path is invalid.
    #[error("Invalid path '{path}' for {field}. Paths must be non-empty and start with '/'.")]
    InvalidPath {
        /// The configuration field holding the path.
        field: &'static str,
        /// The invalid path that was provided.
        path: String,
    },

    /// The start path and the callback path are identical.
    #[error("The auth path and the auth callback path must differ (both are '{path}').")]
    ConflictingPaths {
        /// The path configured for both routes.
        path: String,
    },

    /// A state store bound is zero.
    #[error("State store {field} must be greater than zero.")]
    InvalidStateStoreBound {
        /// The bound that was zero.
        field: &'static str,
    },
}
