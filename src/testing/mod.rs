//! Testing utilities for the remote authentication flow
//!
//! Compiled for unit tests and, behind the `testing` feature, for the
//! integration tests under `tests/`.
//!
//! - [`mock`] - Mock collaborators (service, navigator, state provider, validator)
//! - [`fixtures`] - [`FlowHarness`] wiring the mocks into a controller
//!
//! ## Usage
//!
//! ```ignore
//! use remote_authenticator::testing::FlowHarness;
//! use remote_authenticator::models::{AuthenticationAction, RemoteAuthenticationState};
//!
//! let harness = FlowHarness::at_action("login");
//! let outcome = harness
//!     .controller()
//!     .run(AuthenticationAction::LogIn, RemoteAuthenticationState::new())
//!     .await?;
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::{test_settings, FlowHarness};
pub use mock::{
    CallbackRecorder, MockAuthenticationService, MockNavigator, MockSignOutValidator,
    MockStateProvider, ServiceCall,
};

/// Common test constants
pub mod constants {
    /// Base URI every mock navigator starts from
    pub const TEST_BASE_URI: &str = "https://app.example/";

    /// Base64 of 32 fixed bytes, for deterministic protector setup
    pub const TEST_PROTECTION_KEY: &str = "dGVzdF9rZXlfMzJfYnl0ZXNfbG9uZ19mb3JfdGVzdF8=";

    /// Identity provider hosting the remote profile and registration pages
    pub const TEST_IDP_URI: &str = "https://idp.example/";
}
