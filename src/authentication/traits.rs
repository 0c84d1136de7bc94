//! Collaborator traits for the remote authentication flow
//!
//! The flow controller owns no protocol, navigation or session logic. Each of
//! those concerns is supplied by the host through one of the traits below,
//! which keeps the state machine testable with plain in-memory fakes.

use crate::models::{ApplicationPaths, NavigationOptions, RemoteAuthenticationResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Input to a remote authentication service call
///
/// Sign-in and sign-out carry the flow state; the callback completions carry
/// the URL the identity provider returned to.
#[derive(Debug)]
pub struct RemoteAuthenticationContext<S> {
    pub url: Option<String>,
    pub state: Option<Arc<S>>,
}

impl<S> RemoteAuthenticationContext<S> {
    #[must_use]
    pub const fn with_state(state: Arc<S>) -> Self {
        Self {
            url: None,
            state: Some(state),
        }
    }

    #[must_use]
    pub const fn with_url(url: String) -> Self {
        Self {
            url: Some(url),
            state: None,
        }
    }
}

/// Protocol side of the flow (OAuth/OIDC redirect exchange)
///
/// A `Redirect` result means the service has already started the external
/// navigation. The completion methods must never return `Redirect`.
#[async_trait]
pub trait RemoteAuthenticationService<S>: Send + Sync
where
    S: Send + Sync + 'static,
{
    /// Start an interactive sign-in
    async fn sign_in(&self, context: RemoteAuthenticationContext<S>)
        -> RemoteAuthenticationResult<S>;

    /// Finish a sign-in from the callback URL
    async fn complete_sign_in(
        &self,
        context: RemoteAuthenticationContext<S>,
    ) -> RemoteAuthenticationResult<S>;

    /// Start a sign-out
    async fn sign_out(&self, context: RemoteAuthenticationContext<S>)
        -> RemoteAuthenticationResult<S>;

    /// Finish a sign-out from the callback URL
    async fn complete_sign_out(
        &self,
        context: RemoteAuthenticationContext<S>,
    ) -> RemoteAuthenticationResult<S>;
}

/// The host's navigation manager
pub trait Navigator: Send + Sync {
    /// Absolute URI of the current page
    fn uri(&self) -> String;

    /// Absolute base URI of the application, ending in `/`
    fn base_uri(&self) -> String;

    /// Navigate to an absolute URL
    fn navigate_to(&self, url: &str, options: NavigationOptions);
}

/// Reports whether a user is currently signed in
#[async_trait]
pub trait AuthenticationStateProvider: Send + Sync {
    async fn is_authenticated(&self) -> bool;
}

/// Confirms that a logout was initiated from within the application
///
/// Hosts record a marker before navigating to the logout page; validation
/// consumes it so a crafted link cannot sign the user out.
#[async_trait]
pub trait SignOutValidator: Send + Sync {
    async fn validate_sign_out_state(&self) -> bool;
}

/// Source of default application paths
pub trait PathsProvider: Send + Sync {
    fn application_paths(&self) -> ApplicationPaths;
}

/// Paths provider that serves the built-in defaults
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPathsProvider;

impl PathsProvider for DefaultPathsProvider {
    fn application_paths(&self) -> ApplicationPaths {
        ApplicationPaths::with_defaults()
    }
}

/// Treats every user as signed in, so sign-out always reaches the service
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeAuthenticated;

#[async_trait]
impl AuthenticationStateProvider for AssumeAuthenticated {
    async fn is_authenticated(&self) -> bool {
        true
    }
}

/// Every sign-out is accepted; for hosts without an out-of-band logout risk
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllSignOuts;

#[async_trait]
impl SignOutValidator for AcceptAllSignOuts {
    async fn validate_sign_out_state(&self) -> bool {
        true
    }
}
