//! Query parameters received on the OAuth callback path.

use std::collections::BTreeMap;

use crate::auth::oauth::OAuthError;

/// Parameters that must be present on every callback.
pub const REQUIRED_PARAMS: [&str; 5] = ["code", "hmac", "timestamp", "state", "shop"];

/// Parameter keys that carry the signature and are excluded from signing.
pub const SIGNATURE_PARAMS: [&str; 2] = ["hmac", "signature"];

/// The query parameters of an OAuth callback.
///
/// Keys are kept in byte-wise ascending order, which is the order the
/// canonical signing string requires. Shopify may add parameters (`host`,
/// `session`, ...) over time; every parameter except [`SIGNATURE_PARAMS`] takes
/// part in the signature.
///
/// A key that appears more than once is kept but treated as malformed: it has
/// no single value, and a parameter set containing it can never be signed.
///
/// # Example
///
/// ```rust
/// use shopify_oauth::auth::oauth::CallbackParams;
///
/// let params = CallbackParams::from_query(
///     "shop=test.myshopify.com&code=abc&state=n1&timestamp=1700000000&hmac=ff",
/// );
/// assert_eq!(params.shop(), Some("test.myshopify.com"));
/// assert!(params.validate_required().is_ok());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
    values: BTreeMap<String, Vec<String>>,
}

impl CallbackParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw (percent-encoded) query string.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .into_owned()
            .collect()
    }

    /// Sets `key` to a single `value`, replacing any previous values.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), vec![value.into()]);
    }

    /// Appends a value for `key`, keeping earlier values.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .entry(key.into())
            .or_default()
            .push(value.into());
    }

    /// Removes `key` entirely.
    pub fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }

    /// Returns the value for `key` if it appears exactly once.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        match self.values.get(key).map(Vec::as_slice) {
            Some([value]) => Some(value),
            _ => None,
        }
    }

    /// Returns `true` if `key` appears at least once.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns the parameter keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// The authorization code.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.get("code")
    }

    /// The shop hostname.
    #[must_use]
    pub fn shop(&self) -> Option<&str> {
        self.get("shop")
    }

    /// The returned state nonce.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.get("state")
    }

    /// The supplied HMAC signature.
    #[must_use]
    pub fn hmac(&self) -> Option<&str> {
        self.get("hmac")
    }

    /// The request timestamp.
    #[must_use]
    pub fn timestamp(&self) -> Option<&str> {
        self.get("timestamp")
    }

    /// Checks that every key in [`REQUIRED_PARAMS`] has exactly one value.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingParameters`] naming the missing keys and
    /// the keys that were present.
    pub fn validate_required(&self) -> Result<(), OAuthError> {
        let missing: Vec<String> = REQUIRED_PARAMS
            .iter()
            .filter(|key| self.get(key).is_none())
            .map(ToString::to_string)
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        Err(OAuthError::MissingParameters {
            present: self.keys().map(String::from).collect(),
            missing,
        })
    }

    /// Builds the canonical message that Shopify signs.
    ///
    /// Signature keys are dropped, the remaining keys are sorted byte-wise, and
    /// `%`, `&` and `=` are escaped (in that order) in keys and values before
    /// joining as `key=value` pairs with `&`.
    ///
    /// Returns `None` if any signed key has more than one value.
    #[must_use]
    pub fn to_signable_string(&self) -> Option<String> {
        let mut pairs = Vec::with_capacity(self.values.len());
        for (key, values) in &self.values {
            if SIGNATURE_PARAMS.contains(&key.as_str()) {
                continue;
            }
            let [value] = values.as_slice() else {
                return None;
            };
            pairs.push(format!("{}={}", escape(key), escape(value)));
        }
        Some(pairs.join("&"))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CallbackParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.append(key, value);
        }
        params
    }
}

fn escape(raw: &str) -> String {
    raw.replace('%', "%25")
        .replace('&', "%26")
        .replace('=', "%3D")
}
