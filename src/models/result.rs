//! Results reported by the remote authentication service

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Outcome of one call into the remote authentication service
///
/// `Success` hands back the state the flow started with, so the controller can
/// read the return URL that survived the round trip.
#[derive(Debug)]
pub enum RemoteAuthenticationResult<S> {
    /// The service started an external navigation; nothing left to do locally
    Redirect,
    /// The operation finished and produced the flow's state
    Success(Arc<S>),
    /// The operation failed with a user-facing message
    Failure(String),
    /// The operation finished with nothing further for this page to do
    OperationCompleted,
}

impl<S> RemoteAuthenticationResult<S> {
    #[must_use]
    pub const fn status(&self) -> RemoteAuthenticationStatus {
        match self {
            Self::Redirect => RemoteAuthenticationStatus::Redirect,
            Self::Success(_) => RemoteAuthenticationStatus::Success,
            Self::Failure(_) => RemoteAuthenticationStatus::Failure,
            Self::OperationCompleted => RemoteAuthenticationStatus::OperationCompleted,
        }
    }
}

/// Tag of a [`RemoteAuthenticationResult`], used in logs and errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemoteAuthenticationStatus {
    Redirect,
    Success,
    Failure,
    OperationCompleted,
}

impl fmt::Display for RemoteAuthenticationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Redirect => "redirect",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::OperationCompleted => "operation-completed",
        };
        f.write_str(name)
    }
}
