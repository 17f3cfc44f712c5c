//! OAuth scope handling.
//!
//! This module provides the [`AuthScopes`] type: the ordered list of scopes
//! requested during authorization, and the scopes Shopify reports as granted
//! after the token exchange.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An ordered, de-duplicated set of OAuth scopes.
///
/// Scopes keep the order in which they were given, so the `scope` query
/// parameter of the authorize URL is exactly the requested scopes joined by
/// commas.
///
/// # Implied Scopes
///
/// Shopify treats write access as implying read access:
/// - `write_products` implies `read_products`
/// - `unauthenticated_write_products` implies `unauthenticated_read_products`
///
/// Implied scopes are honoured by [`covers`](Self::covers) but are never added
/// to the requested list.
///
/// # Example
///
/// ```rust
/// use shopify_oauth::AuthScopes;
///
/// let scopes: AuthScopes = "write_orders, read_products".parse().unwrap();
/// assert_eq!(scopes.to_string(), "write_orders,read_products");
///
/// let required: AuthScopes = "read_orders".parse().unwrap();
/// assert!(scopes.covers(&required));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuthScopes {
    scopes: Vec<String>,
}

impl AuthScopes {
    /// Creates an empty scope set.
    #[must_use]
    pub const fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Returns `true` if the scope set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns the number of scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns `true` if this scope set covers every scope in `other`,
    /// taking implied scopes into account.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other.scopes.iter().all(|wanted| {
            self.scopes
                .iter()
                .any(|held| held == wanted || Self::implied_scope(held).as_deref() == Some(wanted))
        })
    }

    /// Returns an iterator over the scopes in request order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    fn push(&mut self, scope: &str) {
        if !self.scopes.iter().any(|s| s == scope) {
            self.scopes.push(scope.to_string());
        }
    }

    fn implied_scope(scope: &str) -> Option<String> {
        scope
            .strip_prefix("unauthenticated_write_")
            .map(|rest| format!("unauthenticated_read_{rest}"))
            .or_else(|| {
                scope
                    .strip_prefix("write_")
                    .map(|rest| format!("read_{rest}"))
            })
    }
}

impl FromStr for AuthScopes {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scopes = Self::new();

        for scope in s.split(',') {
            let scope = scope.trim();
            if scope.is_empty() {
                continue;
            }

            if !scope.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(ConfigError::InvalidScopes {
                    reason: format!("Invalid characters in scope: '{scope}'"),
                });
            }

            scopes.push(scope);
        }

        Ok(scopes)
    }
}

impl From<Vec<String>> for AuthScopes {
    fn from(scopes: Vec<String>) -> Self {
        let mut auth_scopes = Self::new();
        for scope in &scopes {
            let scope = scope.trim();
            if !scope.is_empty() {
                auth_scopes.push(scope);
            }
        }
        auth_scopes
    }
}

impl fmt::Display for AuthScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.scopes.join(","))
    }
}

impl Serialize for AuthScopes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AuthScopes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
