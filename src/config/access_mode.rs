//! Access mode of the requested token.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which kind of access token the authorization requests.
///
/// - `Offline` tokens are app-level and do not expire.
/// - `Online` tokens are tied to the Shopify admin user who authorized the
///   app and expire; the authorize URL then carries
///   `grant_options[]=per-user`.
///
/// # Example
///
/// ```rust
/// use shopify_oauth::AccessMode;
///
/// let mode: AccessMode = "online".parse().unwrap();
/// assert_eq!(mode, AccessMode::Online);
/// assert_eq!(AccessMode::default().to_string(), "offline");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// App-level, non-expiring token.
    #[default]
    Offline,
    /// Per-user, expiring token.
    Online,
}

impl AccessMode {
    /// Returns `true` for [`AccessMode::Online`].
    #[must_use]
    pub const fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }

    /// The `grant_options[]` value for this mode, if any.
    #[must_use]
    pub const fn grant_option(self) -> Option<&'static str> {
        match self {
            Self::Online => Some("per-user"),
            Self::Offline => None,
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offline => f.write_str("offline"),
            Self::Online => f.write_str("online"),
        }
    }
}

impl FromStr for AccessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "offline" => Ok(Self::Offline),
            "online" => Ok(Self::Online),
            other => Err(format!(
                "Unknown access mode '{other}'. Expected 'online' or 'offline'."
            )),
        }
    }
}
