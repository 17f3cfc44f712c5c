//! Framework-neutral request and response types for the flow.
//!
//! The flow does not depend on any HTTP server. The embedding application
//! converts its inbound request into an [`AuthRequest`] and turns the returned
//! [`FlowResponse`] back into its framework's response type.

use std::fmt;

use crate::auth::oauth::CallbackParams;

/// An inbound HTTP request as seen by the flow.
///
/// # Example
///
/// ```rust
/// use shopify_oauth::auth::oauth::AuthRequest;
///
/// let request = AuthRequest::from_target("/auth?shop=my-store.myshopify.com");
/// assert_eq!(request.path(), "/auth");
/// assert_eq!(request.query_param("shop").as_deref(), Some("my-store.myshopify.com"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthRequest {
    path: String,
    query: String,
}

impl AuthRequest {
    /// Creates a request from a path and a raw (percent-encoded) query string.
    #[must_use]
    pub fn new(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: query.into(),
        }
    }

    /// Creates a request from an origin-form request target such as
    /// `/auth/callback?code=...`.
    #[must_use]
    pub fn from_target(target: &str) -> Self {
        let target = target.split_once('#').map_or(target, |(before, _)| before);
        match target.split_once('?') {
            Some((path, query)) => Self::new(path, query),
            None => Self::new(target, ""),
        }
    }

    /// The request path, without query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw query string.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Returns the first decoded value of query parameter `key`.
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<String> {
        url::form_urlencoded::parse(self.query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// Parses the query string as callback parameters.
    #[must_use]
    pub fn callback_params(&self) -> CallbackParams {
        CallbackParams::from_query(&self.query)
    }
}

/// What the embedding server should do with a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowResponse {
    /// The request is not handled by the flow; continue down the pipeline.
    PassThrough,
    /// Respond with `302 Found` and this `Location`.
    Redirect {
        /// The redirect target.
        location: String,
    },
    /// Respond with a custom status and body (for custom error hooks).
    Respond {
        /// The HTTP status code.
        status: u16,
        /// The response body.
        body: String,
    },
}

impl FlowResponse {
    /// Builds a redirect response.
    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::Redirect {
            location: location.into(),
        }
    }

    /// The HTTP status to send, or `None` for [`FlowResponse::PassThrough`].
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::PassThrough => None,
            Self::Redirect { .. } => Some(302),
            Self::Respond { status, .. } => Some(*status),
        }
    }

    /// The redirect target, if this is a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Redirect { location } => Some(location),
            _ => None,
        }
    }
}

/// Where a request ended up in the flow's state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowState {
    /// The path matched neither managed route.
    Idle,
    /// The start path was hit.
    StartRequested,
    /// The callback path was hit.
    CallbackReceived,
    /// The request was routed to the error hook.
    Failed,
    /// The request completed its branch successfully.
    Succeeded,
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::StartRequested => "start_requested",
            Self::CallbackReceived => "callback_received",
            Self::Failed => "failed",
            Self::Succeeded => "succeeded",
        };
        f.write_str(name)
    }
}

/// The terminal state of a handled request and the response to send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowOutcome {
    /// Terminal state: `Idle`, `Succeeded` or `Failed`.
    pub state: FlowState,
    /// The response to send.
    pub response: FlowResponse,
}

impl FlowOutcome {
    pub(crate) const fn new(state: FlowState, response: FlowResponse) -> Self {
        Self { state, response }
    }
}
