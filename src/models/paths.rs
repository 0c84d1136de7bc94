//! Application paths for every authentication destination

use crate::models::action::AuthenticationAction;
use crate::models::auth::FlowError;
use serde::{Deserialize, Serialize};

/// Route prefix shared by the built-in paths
pub const DEFAULT_PATH_PREFIX: &str = "authentication";

/// Configured route for each authentication destination
///
/// Every field is optional. Unset fields fall back, one by one, to the
/// defaults of the paths provider (see [`ApplicationPaths::merged_with`]).
/// The remote profile and register paths point at the identity provider and
/// have no built-in default; leaving them unset disables those actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationPaths {
    pub log_in_path: Option<String>,
    pub log_in_callback_path: Option<String>,
    pub log_in_failed_path: Option<String>,
    pub log_out_path: Option<String>,
    pub log_out_callback_path: Option<String>,
    pub log_out_failed_path: Option<String>,
    pub log_out_succeeded_path: Option<String>,
    pub profile_path: Option<String>,
    pub register_path: Option<String>,
    pub remote_profile_path: Option<String>,
    pub remote_register_path: Option<String>,
}

impl ApplicationPaths {
    /// Built-in paths under [`DEFAULT_PATH_PREFIX`]
    #[must_use]
    pub fn with_defaults() -> Self {
        let path = |action: AuthenticationAction| {
            Some(format!("{DEFAULT_PATH_PREFIX}/{}", action.as_str()))
        };

        Self {
            log_in_path: path(AuthenticationAction::LogIn),
            log_in_callback_path: path(AuthenticationAction::LogInCallback),
            log_in_failed_path: path(AuthenticationAction::LogInFailed),
            log_out_path: path(AuthenticationAction::LogOut),
            log_out_callback_path: path(AuthenticationAction::LogOutCallback),
            log_out_failed_path: path(AuthenticationAction::LogOutFailed),
            log_out_succeeded_path: path(AuthenticationAction::LogOutSucceeded),
            profile_path: path(AuthenticationAction::Profile),
            register_path: path(AuthenticationAction::Register),
            remote_profile_path: None,
            remote_register_path: None,
        }
    }

    /// Fill every unset field from `fallback`
    #[must_use]
    pub fn merged_with(&self, fallback: &Self) -> Self {
        let pick = |own: &Option<String>, other: &Option<String>| {
            own.clone().or_else(|| other.clone())
        };

        Self {
            log_in_path: pick(&self.log_in_path, &fallback.log_in_path),
            log_in_callback_path: pick(&self.log_in_callback_path, &fallback.log_in_callback_path),
            log_in_failed_path: pick(&self.log_in_failed_path, &fallback.log_in_failed_path),
            log_out_path: pick(&self.log_out_path, &fallback.log_out_path),
            log_out_callback_path: pick(
                &self.log_out_callback_path,
                &fallback.log_out_callback_path,
            ),
            log_out_failed_path: pick(&self.log_out_failed_path, &fallback.log_out_failed_path),
            log_out_succeeded_path: pick(
                &self.log_out_succeeded_path,
                &fallback.log_out_succeeded_path,
            ),
            profile_path: pick(&self.profile_path, &fallback.profile_path),
            register_path: pick(&self.register_path, &fallback.register_path),
            remote_profile_path: pick(&self.remote_profile_path, &fallback.remote_profile_path),
            remote_register_path: pick(
                &self.remote_register_path,
                &fallback.remote_register_path,
            ),
        }
    }

    /// Local route the host serves `action` on
    #[must_use]
    pub fn path_for(&self, action: AuthenticationAction) -> Option<&str> {
        let path = match action {
            AuthenticationAction::LogIn => &self.log_in_path,
            AuthenticationAction::LogInCallback => &self.log_in_callback_path,
            AuthenticationAction::LogInFailed => &self.log_in_failed_path,
            AuthenticationAction::LogOut => &self.log_out_path,
            AuthenticationAction::LogOutCallback => &self.log_out_callback_path,
            AuthenticationAction::LogOutFailed => &self.log_out_failed_path,
            AuthenticationAction::LogOutSucceeded => &self.log_out_succeeded_path,
            AuthenticationAction::Profile => &self.profile_path,
            AuthenticationAction::Register => &self.register_path,
        };
        configured(path.as_deref())
    }

    /// The login-failed path, or an error when it is not configured
    ///
    /// # Errors
    /// Returns [`FlowError::UnconfiguredPath`] if the path is unset or blank
    pub fn require_log_in_failed(&self) -> Result<&str, FlowError> {
        configured(self.log_in_failed_path.as_deref())
            .ok_or(FlowError::UnconfiguredPath("log_in_failed_path"))
    }

    /// The logout-failed path, or an error when it is not configured
    ///
    /// # Errors
    /// Returns [`FlowError::UnconfiguredPath`] if the path is unset or blank
    pub fn require_log_out_failed(&self) -> Result<&str, FlowError> {
        configured(self.log_out_failed_path.as_deref())
            .ok_or(FlowError::UnconfiguredPath("log_out_failed_path"))
    }

    /// The logout-succeeded path, or an error when it is not configured
    ///
    /// # Errors
    /// Returns [`FlowError::UnconfiguredPath`] if the path is unset or blank
    pub fn require_log_out_succeeded(&self) -> Result<&str, FlowError> {
        configured(self.log_out_succeeded_path.as_deref())
            .ok_or(FlowError::UnconfiguredPath("log_out_succeeded_path"))
    }

    #[must_use]
    pub fn remote_profile(&self) -> Option<&str> {
        configured(self.remote_profile_path.as_deref())
    }

    #[must_use]
    pub fn remote_register(&self) -> Option<&str> {
        configured(self.remote_register_path.as_deref())
    }
}

/// Blank values count as unset
fn configured(path: Option<&str>) -> Option<&str> {
    path.filter(|p| !p.trim().is_empty())
}
