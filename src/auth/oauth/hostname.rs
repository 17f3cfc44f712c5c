//! Shop hostname validation.

/// The domain every shop hostname must end with.
pub const SHOP_DOMAIN_SUFFIX: &str = ".myshopify.com";

/// Returns `true` if `hostname` looks like a Shopify shop hostname.
///
/// The hostname may only contain ASCII letters, digits, `.` and `-`, and
/// must end with [`SHOP_DOMAIN_SUFFIX`].
///
/// ```rust
/// use shopify_oauth::auth::oauth::is_valid_shop_hostname;
///
/// assert!(is_valid_shop_hostname("shop.myshopify.com"));
/// assert!(!is_valid_shop_hostname("shop.myshopify.com/x"));
/// ```
#[must_use]
pub fn is_valid_shop_hostname(hostname: &str) -> bool {
    let allowed_chars = hostname
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');

    allowed_chars && hostname.ends_with(SHOP_DOMAIN_SUFFIX)
}
