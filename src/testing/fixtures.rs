//! Pre-wired flow fixtures
//!
//! [`FlowHarness`] bundles one of each mock collaborator so a test only
//! states what differs from the happy path.

use super::constants::TEST_BASE_URI;
use super::mock::{
    CallbackRecorder, MockAuthenticationService, MockNavigator, MockSignOutValidator,
    MockStateProvider,
};
use crate::authentication::{FlowControllerBuilder, RemoteAuthenticationFlowController};
use crate::models::{ApplicationPaths, RemoteAuthenticationState};
use crate::settings::RemoteAuthSettings;
use std::sync::Arc;

/// Mock collaborators plus the controller built from them
pub struct FlowHarness {
    pub service: MockAuthenticationService,
    pub navigator: MockNavigator,
    pub state_provider: MockStateProvider,
    pub sign_out_validator: MockSignOutValidator,
    pub log_in_callbacks: CallbackRecorder,
    pub log_out_callbacks: CallbackRecorder,
    pub paths: ApplicationPaths,
}

impl FlowHarness {
    /// Signed-in user, accepted sign-outs, default paths, page at `current_uri`
    #[must_use]
    pub fn new(current_uri: &str) -> Self {
        Self {
            service: MockAuthenticationService::new(),
            navigator: MockNavigator::new(current_uri),
            state_provider: MockStateProvider::authenticated(),
            sign_out_validator: MockSignOutValidator::accepting(),
            log_in_callbacks: CallbackRecorder::new(),
            log_out_callbacks: CallbackRecorder::new(),
            paths: ApplicationPaths::default(),
        }
    }

    /// Harness for the page serving `segment` under the default prefix
    #[must_use]
    pub fn at_action(segment: &str) -> Self {
        Self::new(&format!("{TEST_BASE_URI}authentication/{segment}"))
    }

    #[must_use]
    pub fn with_service(mut self, service: MockAuthenticationService) -> Self {
        self.service = service;
        self
    }

    #[must_use]
    pub fn with_state_provider(mut self, provider: MockStateProvider) -> Self {
        self.state_provider = provider;
        self
    }

    #[must_use]
    pub fn with_sign_out_validator(mut self, validator: MockSignOutValidator) -> Self {
        self.sign_out_validator = validator;
        self
    }

    #[must_use]
    pub fn with_paths(mut self, paths: ApplicationPaths) -> Self {
        self.paths = paths;
        self
    }

    #[must_use]
    pub fn with_base_uri(mut self, base_uri: &str) -> Self {
        self.navigator = self.navigator.with_base_uri(base_uri);
        self
    }

    /// Controller wired to clones of this harness's mocks
    ///
    /// # Panics
    ///
    /// Never in practice: the service and navigator are always supplied.
    #[must_use]
    pub fn controller(&self) -> RemoteAuthenticationFlowController<RemoteAuthenticationState> {
        FlowControllerBuilder::new()
            .with_service(Arc::new(self.service.clone()))
            .with_navigator(Arc::new(self.navigator.clone()))
            .with_state_provider(Arc::new(self.state_provider.clone()))
            .with_sign_out_validator(Arc::new(self.sign_out_validator.clone()))
            .with_application_paths(self.paths.clone())
            .on_log_in_succeeded(self.log_in_callbacks.observing_callback(&self.navigator))
            .on_log_out_succeeded(self.log_out_callbacks.observing_callback(&self.navigator))
            .build()
            .expect("harness always supplies service and navigator")
    }
}

/// Settings pointing at the test base URI
#[must_use]
pub fn test_settings() -> RemoteAuthSettings {
    let mut settings = RemoteAuthSettings::default();
    settings.application.base_uri = TEST_BASE_URI.to_string();
    settings.protection.key = super::constants::TEST_PROTECTION_KEY.to_string();
    settings
}
