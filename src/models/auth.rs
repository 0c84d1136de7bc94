//! Common authentication flow error types
//!
//! Every error in this module is fatal for the flow invocation that raised it.
//! Recoverable protocol failures never surface here: the controller turns them
//! into a redirect to the configured failure path instead.

use crate::models::action::AuthenticationAction;
use crate::models::result::RemoteAuthenticationStatus;
use thiserror::Error;

/// Fatal errors raised while driving an authentication flow
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// The requested action is not one of the known route segments
    #[error("Invalid action '{0}'.")]
    UnknownAction(String),

    /// The `returnUrl` query parameter points outside the application
    #[error(
        "Invalid return url '{url}'. The return url needs to have the same origin as the current page."
    )]
    InvalidReturnUrl { url: String },

    /// A callback completion reported `Redirect`, which the protocol never allows
    #[error("Completing the '{action}' flow must not redirect.")]
    UnexpectedRedirect { action: AuthenticationAction },

    /// The service returned a status the current action has no transition for
    #[error("Invalid authentication result status '{status}' for action '{action}'.")]
    InvalidResultStatus {
        action: AuthenticationAction,
        status: RemoteAuthenticationStatus,
    },

    /// A navigation target was required but no path is configured for it
    #[error("No path is configured for '{0}'.")]
    UnconfiguredPath(&'static str),

    /// The navigator handed out a URI that cannot be parsed
    #[error("Invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },
}

impl FlowError {
    /// Build an [`FlowError::InvalidUri`] from a parse failure
    pub(crate) fn invalid_uri(uri: &str, err: &url::ParseError) -> Self {
        Self::InvalidUri {
            uri: uri.to_string(),
            reason: err.to_string(),
        }
    }

    /// Whether this error was raised by a security check rather than misconfiguration
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(self, Self::InvalidReturnUrl { .. })
    }
}
