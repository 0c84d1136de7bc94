//! Remote authentication flow controller
//!
//! Drives one page of the authentication UI through the action it was opened
//! for. Protocol work goes to the [`RemoteAuthenticationService`], navigation
//! to the [`Navigator`]; the controller only decides which of them to call and
//! what the page ends up showing.

use super::traits::{
    AuthenticationStateProvider, Navigator, RemoteAuthenticationContext,
    RemoteAuthenticationService, SignOutValidator,
};
use crate::models::{
    ApplicationPaths, AuthenticationAction, AuthenticationState, FlowError, FlowOutcome, Fragment,
    NavigationOptions, NavigationRequest, RemoteAuthenticationResult,
};
use crate::utils::logging::FlowLogging;
use crate::validation::{query_parameter, resolve_return_url};
use std::sync::Arc;
use url::Url;

/// Message shown when a logout page is opened without the in-app marker
pub const LOG_OUT_NOT_INITIATED_MESSAGE: &str =
    "The logout was not initiated from within the page.";

/// Query parameter carrying the failure message to the failure pages
pub const MESSAGE_PARAMETER: &str = "message";

/// Invoked with the state surfaced by a successful sign-in or sign-out
pub type SuccessCallback<S> = Arc<dyn Fn(Arc<S>) + Send + Sync>;

/// State machine over [`AuthenticationAction`]
///
/// Build one with [`super::FlowControllerBuilder`]. The controller keeps no
/// per-flow state, so a single instance can serve concurrent invocations.
pub struct RemoteAuthenticationFlowController<S: AuthenticationState> {
    pub(crate) service: Arc<dyn RemoteAuthenticationService<S>>,
    pub(crate) navigator: Arc<dyn Navigator>,
    pub(crate) state_provider: Arc<dyn AuthenticationStateProvider>,
    pub(crate) sign_out_validator: Arc<dyn SignOutValidator>,
    pub(crate) paths: ApplicationPaths,
    pub(crate) on_log_in_succeeded: Option<SuccessCallback<S>>,
    pub(crate) on_log_out_succeeded: Option<SuccessCallback<S>>,
}

impl<S: AuthenticationState> RemoteAuthenticationFlowController<S> {
    /// Paths in effect after falling back to the provider defaults
    #[must_use]
    pub const fn paths(&self) -> &ApplicationPaths {
        &self.paths
    }

    /// Parse a route segment and run the matching action
    ///
    /// # Errors
    /// Returns [`FlowError::UnknownAction`] for segments that name no action,
    /// otherwise whatever [`Self::run`] returns.
    pub async fn run_segment(&self, segment: &str, state: S) -> Result<FlowOutcome, FlowError> {
        let action = segment.parse::<AuthenticationAction>()?;
        self.run(action, state).await
    }

    /// Run one flow invocation to its terminal state
    ///
    /// # Errors
    /// Returns an error if:
    /// - The `returnUrl` query parameter points outside the application
    /// - A callback completion reports `Redirect`
    /// - The service answers with a status the action has no transition for
    /// - A required failure or logout-succeeded path is not configured
    /// - The navigator reports an unparseable URI
    pub async fn run(
        &self,
        action: AuthenticationAction,
        state: S,
    ) -> Result<FlowOutcome, FlowError> {
        FlowLogging::log_action_start(action);

        match action {
            AuthenticationAction::LogIn => self.process_log_in(state).await,
            AuthenticationAction::LogInCallback => self.process_log_in_callback().await,
            AuthenticationAction::LogInFailed => Ok(FlowOutcome::render(Fragment::LogInFailed(
                self.message_from_query()?,
            ))),
            AuthenticationAction::LogOut => self.process_log_out(state).await,
            AuthenticationAction::LogOutCallback => self.process_log_out_callback().await,
            AuthenticationAction::LogOutFailed => Ok(FlowOutcome::render(
                Fragment::LogOutFailed(self.message_from_query()?),
            )),
            AuthenticationAction::LogOutSucceeded => {
                Ok(FlowOutcome::render(Fragment::LogOutSucceeded))
            }
            AuthenticationAction::Profile => {
                self.redirect_to_remote(self.paths.remote_profile(), Fragment::ProfileNotSupported)
            }
            AuthenticationAction::Register => self.redirect_to_remote(
                self.paths.remote_register(),
                Fragment::RegisterNotSupported,
            ),
        }
    }

    /// Fragment to show while `action` is in progress
    #[must_use]
    pub fn placeholder(&self, action: AuthenticationAction) -> Fragment {
        match action {
            AuthenticationAction::LogIn => Fragment::LoggingIn,
            AuthenticationAction::LogInCallback => Fragment::CompletingLoggingIn,
            AuthenticationAction::LogInFailed => Fragment::LogInFailed(None),
            AuthenticationAction::LogOut => Fragment::LoggingOut,
            AuthenticationAction::LogOutCallback => Fragment::CompletingLogOut,
            AuthenticationAction::LogOutFailed => Fragment::LogOutFailed(None),
            AuthenticationAction::LogOutSucceeded => Fragment::LogOutSucceeded,
            AuthenticationAction::Profile if self.paths.remote_profile().is_some() => {
                Fragment::UserProfile
            }
            AuthenticationAction::Profile => Fragment::ProfileNotSupported,
            AuthenticationAction::Register if self.paths.remote_register().is_some() => {
                Fragment::Registering
            }
            AuthenticationAction::Register => Fragment::RegisterNotSupported,
        }
    }

    async fn process_log_in(&self, mut state: S) -> Result<FlowOutcome, FlowError> {
        let action = AuthenticationAction::LogIn;
        let return_url = self.return_url(Some(&state), None)?;
        state.set_return_url(return_url.clone());

        let state = Arc::new(state);
        let result = self
            .service
            .sign_in(RemoteAuthenticationContext::with_state(state))
            .await;
        FlowLogging::log_service_result(action, result.status());

        match result {
            RemoteAuthenticationResult::Redirect => Ok(FlowOutcome::render(Fragment::LoggingIn)),
            RemoteAuthenticationResult::Success(state) => {
                Self::notify(self.on_log_in_succeeded.as_ref(), &state);
                let target = self.return_url(Some(state.as_ref()), Some(&return_url))?;
                self.navigate_to_return_url(target)
            }
            RemoteAuthenticationResult::Failure(message) => {
                FlowLogging::log_service_failure(action, &message);
                self.navigate_to_failure(self.paths.require_log_in_failed()?, &message)
            }
            other @ RemoteAuthenticationResult::OperationCompleted => {
                Err(FlowError::InvalidResultStatus {
                    action,
                    status: other.status(),
                })
            }
        }
    }

    async fn process_log_in_callback(&self) -> Result<FlowOutcome, FlowError> {
        let action = AuthenticationAction::LogInCallback;
        let result = self
            .service
            .complete_sign_in(RemoteAuthenticationContext::with_url(self.navigator.uri()))
            .await;
        FlowLogging::log_service_result(action, result.status());

        match result {
            RemoteAuthenticationResult::Redirect => Err(FlowError::UnexpectedRedirect { action }),
            RemoteAuthenticationResult::Success(state) => {
                Self::notify(self.on_log_in_succeeded.as_ref(), &state);
                let target = self.return_url(Some(state.as_ref()), None)?;
                self.navigate_to_return_url(target)
            }
            RemoteAuthenticationResult::OperationCompleted => {
                Ok(FlowOutcome::render(Fragment::CompletingLoggingIn))
            }
            RemoteAuthenticationResult::Failure(message) => {
                FlowLogging::log_service_failure(action, &message);
                self.navigate_to_failure(self.paths.require_log_in_failed()?, &message)
            }
        }
    }

    async fn process_log_out(&self, mut state: S) -> Result<FlowOutcome, FlowError> {
        let action = AuthenticationAction::LogOut;

        if !self.sign_out_validator.validate_sign_out_state().await {
            FlowLogging::log_sign_out_rejected();
            return self.navigate_to_failure(
                self.paths.require_log_out_failed()?,
                LOG_OUT_NOT_INITIATED_MESSAGE,
            );
        }

        let default_return_url = self.absolute(self.paths.require_log_out_succeeded()?)?;
        let return_url = self.return_url(Some(&state), Some(&default_return_url))?;
        state.set_return_url(return_url.clone());

        if !self.state_provider.is_authenticated().await {
            FlowLogging::log_sign_out_skipped();
            return self.navigate_to_return_url(return_url);
        }

        let result = self
            .service
            .sign_out(RemoteAuthenticationContext::with_state(Arc::new(state)))
            .await;
        FlowLogging::log_service_result(action, result.status());

        match result {
            RemoteAuthenticationResult::Redirect
            | RemoteAuthenticationResult::OperationCompleted => {
                Ok(FlowOutcome::render(Fragment::LoggingOut))
            }
            RemoteAuthenticationResult::Success(state) => {
                Self::notify(self.on_log_out_succeeded.as_ref(), &state);
                self.navigate_to_return_url(return_url)
            }
            RemoteAuthenticationResult::Failure(message) => {
                FlowLogging::log_service_failure(action, &message);
                self.navigate_to_failure(self.paths.require_log_out_failed()?, &message)
            }
        }
    }

    async fn process_log_out_callback(&self) -> Result<FlowOutcome, FlowError> {
        let action = AuthenticationAction::LogOutCallback;
        let result = self
            .service
            .complete_sign_out(RemoteAuthenticationContext::with_url(self.navigator.uri()))
            .await;
        FlowLogging::log_service_result(action, result.status());

        match result {
            RemoteAuthenticationResult::Redirect => Err(FlowError::UnexpectedRedirect { action }),
            RemoteAuthenticationResult::Success(state) => {
                Self::notify(self.on_log_out_succeeded.as_ref(), &state);
                let default_return_url = self.absolute(self.paths.require_log_out_succeeded()?)?;
                let target = self.return_url(Some(state.as_ref()), Some(&default_return_url))?;
                self.navigate_to_return_url(target)
            }
            RemoteAuthenticationResult::OperationCompleted => {
                Ok(FlowOutcome::render(Fragment::CompletingLogOut))
            }
            RemoteAuthenticationResult::Failure(message) => {
                FlowLogging::log_service_failure(action, &message);
                self.navigate_to_failure(self.paths.require_log_out_failed()?, &message)
            }
        }
    }

    fn redirect_to_remote(
        &self,
        remote_path: Option<&str>,
        not_supported: Fragment,
    ) -> Result<FlowOutcome, FlowError> {
        match remote_path {
            Some(path) => {
                let url = self.absolute(path)?;
                Ok(self.navigate(url, NavigationOptions::force_load()))
            }
            None => Ok(FlowOutcome::render(not_supported)),
        }
    }

    fn notify(callback: Option<&SuccessCallback<S>>, state: &Arc<S>) {
        if let Some(callback) = callback {
            callback(Arc::clone(state));
        }
    }

    fn return_url(&self, state: Option<&S>, default: Option<&str>) -> Result<String, FlowError> {
        resolve_return_url(
            state.and_then(|s| s.return_url()),
            &self.navigator.uri(),
            &self.navigator.base_uri(),
            default,
        )
    }

    fn message_from_query(&self) -> Result<Option<String>, FlowError> {
        query_parameter(&self.navigator.uri(), MESSAGE_PARAMETER)
    }

    /// Resolve `path` against the base URI; absolute URLs pass through
    fn absolute(&self, path: &str) -> Result<String, FlowError> {
        let base_uri = self.navigator.base_uri();
        let base = Url::parse(&base_uri).map_err(|e| FlowError::invalid_uri(&base_uri, &e))?;
        let url = base.join(path).map_err(|e| FlowError::invalid_uri(path, &e))?;
        Ok(url.into())
    }

    fn navigate_to_return_url(&self, url: String) -> Result<FlowOutcome, FlowError> {
        Ok(self.navigate(url, NavigationOptions::replace()))
    }

    /// The message is percent-encoded so [`query_parameter`] reads it back verbatim
    fn navigate_to_failure(&self, path: &str, message: &str) -> Result<FlowOutcome, FlowError> {
        let mut url = Url::parse(&self.absolute(path)?)
            .map_err(|e| FlowError::invalid_uri(path, &e))?;
        let pair = format!("{MESSAGE_PARAMETER}={}", urlencoding::encode(message));
        let query = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{pair}"),
            _ => pair,
        };
        url.set_query(Some(&query));

        let options = NavigationOptions::default().with_history_entry_state(message);
        Ok(self.navigate(url.into(), options))
    }

    fn navigate(&self, url: String, options: NavigationOptions) -> FlowOutcome {
        let navigation = NavigationRequest { url, options };
        FlowLogging::log_navigation(&navigation);
        self.navigator
            .navigate_to(&navigation.url, navigation.options.clone());
        FlowOutcome::Redirect { navigation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authentication::FlowControllerBuilder;
    use crate::models::RemoteAuthenticationState;
    use crate::testing::mock::{MockAuthenticationService, MockNavigator, MockStateProvider};

    const CURRENT: &str = "https://app.example/authentication/login";

    fn controller(
        service: MockAuthenticationService,
        navigator: MockNavigator,
    ) -> RemoteAuthenticationFlowController<RemoteAuthenticationState> {
        FlowControllerBuilder::new()
            .with_service(Arc::new(service))
            .with_navigator(Arc::new(navigator))
            .with_state_provider(Arc::new(MockStateProvider::authenticated()))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_segment_fails_before_any_call() {
        let service = MockAuthenticationService::new();
        let navigator = MockNavigator::new(CURRENT);
        let controller = controller(service.clone(), navigator.clone());

        let result = controller
            .run_segment("sign-up", RemoteAuthenticationState::new())
            .await;

        assert_eq!(result, Err(FlowError::UnknownAction("sign-up".to_string())));
        assert_eq!(service.call_count(), 0);
        assert!(navigator.navigations().is_empty());
    }

    #[tokio::test]
    async fn test_failure_url_carries_escaped_message() {
        let service = MockAuthenticationService::new()
            .with_sign_in(|_| RemoteAuthenticationResult::Failure("access denied & more".to_string()));
        let navigator = MockNavigator::new(CURRENT);
        let controller = controller(service, navigator.clone());

        let outcome = controller
            .run(AuthenticationAction::LogIn, RemoteAuthenticationState::new())
            .await
            .unwrap();

        assert_eq!(
            outcome.redirect_url(),
            Some("https://app.example/authentication/login-failed?message=access%20denied%20%26%20more")
        );
        let navigation = navigator.last_navigation().unwrap();
        assert_eq!(
            navigation.options.history_entry_state.as_deref(),
            Some("access denied & more")
        );
    }

    #[tokio::test]
    async fn test_failure_message_survives_the_round_trip() {
        let message = "a+b & c%d";
        let service = MockAuthenticationService::new()
            .with_sign_in(move |_| RemoteAuthenticationResult::Failure(message.to_string()));
        let navigator = MockNavigator::new(CURRENT);
        let controller = controller(service, navigator.clone());

        controller
            .run(AuthenticationAction::LogIn, RemoteAuthenticationState::new())
            .await
            .unwrap();
        assert_eq!(
            navigator.uri(),
            "https://app.example/authentication/login-failed?message=a%2Bb%20%26%20c%25d"
        );

        let outcome = controller
            .run(AuthenticationAction::LogInFailed, RemoteAuthenticationState::new())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            FlowOutcome::render(Fragment::LogInFailed(Some(message.to_string())))
        );
    }

    #[tokio::test]
    async fn test_placeholders_follow_remote_path_configuration() {
        let controller = controller(MockAuthenticationService::new(), MockNavigator::new(CURRENT));
        assert_eq!(
            controller.placeholder(AuthenticationAction::Profile),
            Fragment::ProfileNotSupported
        );
        assert_eq!(
            controller.placeholder(AuthenticationAction::LogInCallback),
            Fragment::CompletingLoggingIn
        );

        let controller = FlowControllerBuilder::new()
            .with_service(Arc::new(MockAuthenticationService::new()))
            .with_navigator(Arc::new(MockNavigator::new(CURRENT)))
            .with_application_paths(ApplicationPaths {
                remote_register_path: Some("https://idp.example/register".to_string()),
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_eq!(
            controller.placeholder(AuthenticationAction::Register),
            Fragment::Registering
        );
    }
}
