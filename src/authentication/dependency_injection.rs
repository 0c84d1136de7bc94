//! Dependency injection for the flow controller
//!
//! The host hands its collaborators to [`FlowControllerBuilder`], which fills
//! in the optional ones and resolves the application paths once, up front.

use super::controller::{RemoteAuthenticationFlowController, SuccessCallback};
use super::traits::{
    AcceptAllSignOuts, AssumeAuthenticated, AuthenticationStateProvider, DefaultPathsProvider,
    Navigator, PathsProvider, RemoteAuthenticationService, SignOutValidator,
};
use crate::models::{ApplicationPaths, AuthenticationState};
use crate::settings::RemoteAuthSettings;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while assembling a controller
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuilderError {
    #[error("No {0} was configured")]
    MissingCollaborator(&'static str),
}

/// Builder wiring the collaborators of a [`RemoteAuthenticationFlowController`]
///
/// The service and navigator are required. Without a state provider every
/// user is treated as signed in (sign-out always reaches the service); without
/// a sign-out validator every logout is accepted.
pub struct FlowControllerBuilder<S: AuthenticationState> {
    service: Option<Arc<dyn RemoteAuthenticationService<S>>>,
    navigator: Option<Arc<dyn Navigator>>,
    state_provider: Option<Arc<dyn AuthenticationStateProvider>>,
    sign_out_validator: Option<Arc<dyn SignOutValidator>>,
    paths_provider: Option<Arc<dyn PathsProvider>>,
    application_paths: Option<ApplicationPaths>,
    on_log_in_succeeded: Option<SuccessCallback<S>>,
    on_log_out_succeeded: Option<SuccessCallback<S>>,
}

impl<S: AuthenticationState> Default for FlowControllerBuilder<S> {
    fn default() -> Self {
        Self {
            service: None,
            navigator: None,
            state_provider: None,
            sign_out_validator: None,
            paths_provider: None,
            application_paths: None,
            on_log_in_succeeded: None,
            on_log_out_succeeded: None,
        }
    }
}

impl<S: AuthenticationState> FlowControllerBuilder<S> {
    /// Create a new builder with nothing configured
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the paths configured in settings
    #[must_use]
    pub fn from_settings(settings: &RemoteAuthSettings) -> Self {
        Self::new().with_application_paths(settings.paths.clone())
    }

    #[must_use]
    pub fn with_service(mut self, service: Arc<dyn RemoteAuthenticationService<S>>) -> Self {
        self.service = Some(service);
        self
    }

    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    #[must_use]
    pub fn with_state_provider(mut self, provider: Arc<dyn AuthenticationStateProvider>) -> Self {
        self.state_provider = Some(provider);
        self
    }

    #[must_use]
    pub fn with_sign_out_validator(mut self, validator: Arc<dyn SignOutValidator>) -> Self {
        self.sign_out_validator = Some(validator);
        self
    }

    /// Source of the defaults for unset application paths
    #[must_use]
    pub fn with_paths_provider(mut self, provider: Arc<dyn PathsProvider>) -> Self {
        self.paths_provider = Some(provider);
        self
    }

    /// Paths that take precedence over the provider defaults
    #[must_use]
    pub fn with_application_paths(mut self, paths: ApplicationPaths) -> Self {
        self.application_paths = Some(paths);
        self
    }

    #[must_use]
    pub fn on_log_in_succeeded(mut self, callback: impl Fn(Arc<S>) + Send + Sync + 'static) -> Self {
        self.on_log_in_succeeded = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn on_log_out_succeeded(
        mut self,
        callback: impl Fn(Arc<S>) + Send + Sync + 'static,
    ) -> Self {
        self.on_log_out_succeeded = Some(Arc::new(callback));
        self
    }

    /// Assemble the controller
    ///
    /// # Errors
    /// Returns [`BuilderError::MissingCollaborator`] if the service or the
    /// navigator was not configured.
    pub fn build(self) -> Result<RemoteAuthenticationFlowController<S>, BuilderError> {
        let service = self
            .service
            .ok_or(BuilderError::MissingCollaborator("remote authentication service"))?;
        let navigator = self
            .navigator
            .ok_or(BuilderError::MissingCollaborator("navigator"))?;

        let state_provider = self.state_provider.unwrap_or_else(|| {
            log::info!("No authentication state provider configured, sign-out always calls the service");
            Arc::new(AssumeAuthenticated)
        });
        let sign_out_validator = self.sign_out_validator.unwrap_or_else(|| {
            log::warn!("⚠️  No sign-out validator configured, every logout request is accepted");
            Arc::new(AcceptAllSignOuts)
        });

        let defaults = self
            .paths_provider
            .map_or_else(|| DefaultPathsProvider.application_paths(), |p| p.application_paths());
        let paths = self
            .application_paths
            .map_or_else(|| defaults.clone(), |paths| paths.merged_with(&defaults));

        log::debug!("🔧 Remote authentication flow controller configured");

        Ok(RemoteAuthenticationFlowController {
            service,
            navigator,
            state_provider,
            sign_out_validator,
            paths,
            on_log_in_succeeded: self.on_log_in_succeeded,
            on_log_out_succeeded: self.on_log_out_succeeded,
        })
    }
}
