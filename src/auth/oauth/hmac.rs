//! HMAC verification for Shopify OAuth callbacks.
//!
//! Shopify signs every callback with HMAC-SHA256 over a canonical string built
//! from the callback's query parameters (see
//! [`CallbackParams::to_signable_string`]), keyed with the app's API secret.
//!
//! # Security
//!
//! All HMAC comparisons use constant-time comparison to prevent timing attacks.
//! [`validate_hmac`] supports key rotation by falling back to the old secret
//! key if validation with the primary key fails.
//!
//! # Example
//!
//! ```rust
//! use shopify_oauth::auth::oauth::hmac::{sign, verify};
//! use shopify_oauth::auth::oauth::CallbackParams;
//!
//! let mut params = CallbackParams::from_query("code=abc&shop=example.myshopify.com&state=xyz");
//! let signature = sign(&params, "my-api-secret").unwrap();
//! params.insert("hmac", signature);
//!
//! assert!(verify("my-api-secret", &params));
//! assert!(!verify("other-secret", &params));
//! ```

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::auth::oauth::CallbackParams;
use crate::config::AuthConfig;

type HmacSha256 = Hmac<Sha256>;

/// Computes an HMAC-SHA256 signature for the given message.
///
/// The signature is returned as a lowercase hexadecimal string.
///
/// ```rust
/// use shopify_oauth::auth::oauth::hmac::compute_signature;
///
/// let sig = compute_signature("test-message", "secret-key");
/// assert_eq!(sig.len(), 64);
/// ```
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_signature(message: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Performs constant-time comparison of two strings.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    // ConstantTimeEq handles different lengths securely
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Computes the signature Shopify would attach to `params`.
///
/// Returns `None` if the parameters cannot be canonicalized (a signed key
/// carries more than one value).
#[must_use]
pub fn sign(params: &CallbackParams, secret: &str) -> Option<String> {
    params
        .to_signable_string()
        .map(|message| compute_signature(&message, secret))
}

/// Verifies the `hmac` parameter of `params` against `secret`.
///
/// Returns `false` when the `hmac` parameter is missing or repeated, when the
/// parameters cannot be canonicalized, or when the signature differs.
/// Deterministic and side-effect free.
#[must_use]
pub fn verify(secret: &str, params: &CallbackParams) -> bool {
    let Some(received) = params.hmac() else {
        return false;
    };
    sign(params, secret).is_some_and(|computed| constant_time_compare(&computed, received))
}

/// Validates the HMAC signature of an OAuth callback using the configured
/// secret key(s).
///
/// # Key Rotation Support
///
/// If the primary `api_secret_key` fails validation, the old secret key is
/// tried if one is configured. This allows in-flight OAuth flows to complete
/// while the secret is being rotated.
#[must_use]
pub fn validate_hmac(params: &CallbackParams, config: &AuthConfig) -> bool {
    if verify(config.api_secret_key().as_ref(), params) {
        return true;
    }

    config
        .old_api_secret_key()
        .is_some_and(|old_secret| verify(old_secret.as_ref(), params))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_params(secret: &str) -> CallbackParams {
        let mut params = CallbackParams::from_iter([
            ("code", "0907a61c0c8d55e99db179b68161bc00"),
            ("shop", "some-shop.myshopify.com"),
            ("state", "0123456789abcdef01234567"),
            ("timestamp", "1337178173"),
            ("host", "c29tZS1zaG9wLm15c2hvcGlmeS5jb20vYWRtaW4"),
        ]);
        let signature = sign(&params, secret).unwrap();
        params.insert("hmac", signature);
        params
    }

    #[test]
    fn test_compute_signature_produces_lowercase_hex() {
        let sig = compute_signature("test", "secret");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(sig.chars().all(|c| !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_compute_signature_matches_known_value() {
        // HMAC-SHA256("message", "key")
        let sig = compute_signature("message", "key");
        assert_eq!(
            sig,
            "6e9ef29b75fffc5b7abae527d58fdadb2fe42e7219011976917343065f58ed4a"
        );
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(constant_time_compare("", ""));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("short", "longer string"));
        assert!(!constant_time_compare("ABC", "abc"));
    }

    #[test]
    fn test_verify_accepts_correct_signature_and_rejects_wrong_secret() {
        let params = signed_params("hush");
        assert!(verify("hush", &params));
        assert!(!verify("wrong-secret", &params));
    }

    #[test]
    fn test_verify_is_independent_of_insertion_order() {
        let forward = signed_params("hush");

        let mut keys: Vec<&str> = forward.keys().collect();
        keys.reverse();
        let reversed: CallbackParams = keys
            .into_iter()
            .map(|k| (k, forward.get(k).unwrap()))
            .collect();

        assert_eq!(forward, reversed);
        assert!(verify("hush", &reversed));
    }

    #[test]
    fn test_verify_detects_single_character_tampering_in_every_value() {
        let params = signed_params("hush");
        assert!(verify("hush", &params));

        let signed_keys: Vec<String> = params
            .keys()
            .filter(|k| *k != "hmac")
            .map(String::from)
            .collect();

        for key in signed_keys {
            let original = params.get(&key).unwrap().to_string();
            for position in 0..original.len() {
                let mut tampered_value: Vec<char> = original.chars().collect();
                tampered_value[position] = if tampered_value[position] == 'x' { 'y' } else { 'x' };

                let mut tampered = params.clone();
                tampered.insert(key.clone(), tampered_value.into_iter().collect::<String>());
                assert!(
                    !verify("hush", &tampered),
                    "tampering '{key}' at {position} was not detected"
                );
            }
        }
    }

    #[test]
    fn test_verify_rejects_added_parameter() {
        let mut params = signed_params("hush");
        params.insert("extra", "value");
        assert!(!verify("hush", &params));
    }

    #[test]
    fn test_verify_ignores_signature_parameter() {
        let mut params = signed_params("hush");
        params.insert("signature", "anything");
        assert!(verify("hush", &params));
    }

    #[test]
    fn test_verify_rejects_missing_or_repeated_hmac() {
        let mut params = signed_params("hush");
        let hmac = params.hmac().unwrap().to_string();

        params.remove("hmac");
        assert!(!verify("hush", &params));

        params.append("hmac", hmac.clone());
        params.append("hmac", hmac);
        assert!(!verify("hush", &params));
    }

    #[test]
    fn test_verify_rejects_uppercase_hex() {
        let mut params = signed_params("hush");
        let upper = params.hmac().unwrap().to_uppercase();
        params.insert("hmac", upper);
        assert!(!verify("hush", &params));
    }
}
