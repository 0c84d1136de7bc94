//! Authentication actions and their route segments

use crate::models::auth::FlowError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The step of the remote authentication flow a page was opened for
///
/// The action is chosen by the host (usually from the last route segment)
/// and stays fixed for the whole invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthenticationAction {
    #[serde(rename = "login")]
    LogIn,
    #[serde(rename = "login-callback")]
    LogInCallback,
    #[serde(rename = "login-failed")]
    LogInFailed,
    #[serde(rename = "logout")]
    LogOut,
    #[serde(rename = "logout-callback")]
    LogOutCallback,
    #[serde(rename = "logout-failed")]
    LogOutFailed,
    #[serde(rename = "logged-out")]
    LogOutSucceeded,
    #[serde(rename = "profile")]
    Profile,
    #[serde(rename = "register")]
    Register,
}

impl AuthenticationAction {
    /// Every action, in route-table order
    pub const ALL: [Self; 9] = [
        Self::LogIn,
        Self::LogInCallback,
        Self::LogInFailed,
        Self::LogOut,
        Self::LogOutCallback,
        Self::LogOutFailed,
        Self::LogOutSucceeded,
        Self::Profile,
        Self::Register,
    ];

    /// Route segment for this action
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LogIn => "login",
            Self::LogInCallback => "login-callback",
            Self::LogInFailed => "login-failed",
            Self::LogOut => "logout",
            Self::LogOutCallback => "logout-callback",
            Self::LogOutFailed => "logout-failed",
            Self::LogOutSucceeded => "logged-out",
            Self::Profile => "profile",
            Self::Register => "register",
        }
    }
}

impl fmt::Display for AuthenticationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for AuthenticationAction {
    type Err = FlowError;

    /// Route segments are matched exactly; hosts normalise casing before routing.
    fn from_str(segment: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == segment)
            .ok_or_else(|| FlowError::UnknownAction(segment.to_string()))
    }
}
