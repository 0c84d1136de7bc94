//! Authentication module for the remote authentication flow
//!
//! This module provides the flow controller, the collaborator traits it is
//! driven through, and the builder used to wire those collaborators.

pub mod controller;
pub mod dependency_injection;
pub mod traits;

pub use controller::{
    RemoteAuthenticationFlowController, SuccessCallback, LOG_OUT_NOT_INITIATED_MESSAGE,
    MESSAGE_PARAMETER,
};
pub use dependency_injection::{BuilderError, FlowControllerBuilder};
pub use traits::{
    AcceptAllSignOuts, AssumeAuthenticated, AuthenticationStateProvider, DefaultPathsProvider,
    Navigator, PathsProvider, RemoteAuthenticationContext, RemoteAuthenticationService,
    SignOutValidator,
};
