//! Navigation requests, render directives and flow outcomes

use serde::Serialize;

/// How a navigation should be carried out by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavigationOptions {
    /// Bypass client-side routing and load the target from the server
    pub force_load: bool,
    /// Replace the current history entry instead of pushing a new one
    pub replace_history_entry: bool,
    /// Opaque value attached to the new history entry (failure messages)
    pub history_entry_state: Option<String>,
}

impl NavigationOptions {
    /// Return-URL navigation: client-side, replacing the callback entry
    #[must_use]
    pub const fn replace() -> Self {
        Self {
            force_load: false,
            replace_history_entry: true,
            history_entry_state: None,
        }
    }

    /// Full page load, used when leaving the application
    #[must_use]
    pub const fn force_load() -> Self {
        Self {
            force_load: true,
            replace_history_entry: false,
            history_entry_state: None,
        }
    }

    #[must_use]
    pub fn with_history_entry_state(mut self, state: impl Into<String>) -> Self {
        self.history_entry_state = Some(state.into());
        self
    }
}

/// A navigation the controller issued
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationRequest {
    pub url: String,
    pub options: NavigationOptions,
}

/// UI fragment the host should render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "fragment", content = "message", rename_all = "kebab-case")]
pub enum Fragment {
    LoggingIn,
    CompletingLoggingIn,
    LogInFailed(Option<String>),
    LoggingOut,
    CompletingLogOut,
    LogOutFailed(Option<String>),
    LogOutSucceeded,
    UserProfile,
    Registering,
    ProfileNotSupported,
    RegisterNotSupported,
}

/// Terminal state of one flow invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum FlowOutcome {
    /// Show a fragment; any navigation in progress belongs to the service
    Render { fragment: Fragment },
    /// The controller navigated away
    Redirect { navigation: NavigationRequest },
}

impl FlowOutcome {
    #[must_use]
    pub const fn render(fragment: Fragment) -> Self {
        Self::Render { fragment }
    }

    /// Target URL, when the outcome is a redirect
    #[must_use]
    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            Self::Redirect { navigation } => Some(&navigation.url),
            Self::Render { .. } => None,
        }
    }

    #[must_use]
    pub const fn fragment(&self) -> Option<&Fragment> {
        match self {
            Self::Render { fragment } => Some(fragment),
            Self::Redirect { .. } => None,
        }
    }
}
