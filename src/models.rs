//! Data model of the remote authentication flow

pub mod action;
pub mod auth;
pub mod navigation;
pub mod paths;
pub mod result;
pub mod state;

pub use action::AuthenticationAction;
pub use auth::FlowError;
pub use navigation::{FlowOutcome, Fragment, NavigationOptions, NavigationRequest};
pub use paths::ApplicationPaths;
pub use result::{RemoteAuthenticationResult, RemoteAuthenticationStatus};
pub use state::{AuthenticationState, RemoteAuthenticationState};
