//! Authentication types.
//!
//! # Overview
//!
//! - [`AuthScopes`]: An ordered list of OAuth scopes with implied scope handling
//! - [`AccessToken`]: The token obtained at the end of the flow
//! - [`oauth`]: The OAuth 2.0 authorization code flow
//!
//! # Example
//!
//! ```rust
//! use shopify_oauth::{AccessToken, AuthScopes};
//!
//! let scopes: AuthScopes = "write_products,read_orders".parse().unwrap();
//! let token = AccessToken::new("shpat_abc", scopes, None);
//!
//! // Offline tokens don't expire
//! assert!(!token.expired());
//! ```

mod access_token;
pub mod oauth;
mod scopes;

pub use access_token::AccessToken;
pub use scopes::AuthScopes;
