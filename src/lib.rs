#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the remote-authenticator crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod authentication;
pub mod models;
pub mod protection;
pub mod settings;
pub mod utils;
pub mod validation;

// Mock collaborators, available to unit tests and (with `testing`) to integration tests
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use authentication::{FlowControllerBuilder, RemoteAuthenticationFlowController};
pub use models::{AuthenticationAction, FlowError, FlowOutcome, RemoteAuthenticationState};
pub use protection::{KeyRing, ProtectedStateFormat};
pub use settings::RemoteAuthSettings;
