//! Authorization URL generation.
//!
//! The start branch of the flow redirects the merchant to:
//!
//! ```text
//! https://{shop}/admin/oauth/authorize?client_id=..&scope=..&redirect_uri=..&state=..[&grant_options[]=per-user]
//! ```

use crate::auth::oauth::OAuthError;
use crate::config::AuthConfig;

/// Path of the authorize endpoint on a shop.
pub const AUTHORIZE_PATH: &str = "/admin/oauth/authorize";

/// Builds the authorize URL for `shop` carrying `state`.
///
/// The `redirect_uri` is the configured host joined with the callback path.
///
/// # Errors
///
/// Returns [`OAuthError::InvalidAuthorizeUrl`] if the callback path cannot be
/// joined onto the host.
pub fn build_authorize_url(
    config: &AuthConfig,
    shop: &str,
    state: &str,
) -> Result<String, OAuthError> {
    let redirect_uri = config
        .host()
        .resolve(config.auth_callback_path())
        .map_err(|e| OAuthError::InvalidAuthorizeUrl {
            reason: e.to_string(),
        })?;

    let mut params = vec![
        ("client_id", config.api_key().as_ref().to_string()),
        ("scope", config.scopes().to_string()),
        ("redirect_uri", redirect_uri),
        ("state", state.to_string()),
    ];

    if let Some(grant) = config.access_mode().grant_option() {
        params.push(("grant_options[]", grant.to_string()));
    }

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!("https://{shop}{AUTHORIZE_PATH}?{query_string}"))
}
