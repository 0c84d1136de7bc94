//! Authentication state round-tripped through the remote service

use serde::{Deserialize, Serialize};

/// State carried across the redirects of one authentication flow
///
/// Implementors may carry any extra data the application needs back after the
/// identity provider returns; the flow only reads and writes the return URL.
pub trait AuthenticationState: Send + Sync + 'static {
    /// Where the user goes once the flow completes
    fn return_url(&self) -> Option<&str>;

    /// Record the return URL computed for this invocation
    fn set_return_url(&mut self, return_url: String);
}

/// Default state: just the return URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAuthenticationState {
    #[serde(rename = "returnUrl", skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

impl RemoteAuthenticationState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_return_url(return_url: impl Into<String>) -> Self {
        Self {
            return_url: Some(return_url.into()),
        }
    }
}

impl AuthenticationState for RemoteAuthenticationState {
    fn return_url(&self) -> Option<&str> {
        self.return_url.as_deref()
    }

    fn set_return_url(&mut self, return_url: String) {
        self.return_url = Some(return_url);
    }
}
