//! Mock collaborators for isolated flow testing
//!
//! Every mock is cheap to clone and clones share their recordings, so a test
//! can hand one clone to the controller and inspect the other afterwards.

use crate::authentication::{
    AuthenticationStateProvider, Navigator, RemoteAuthenticationContext,
    RemoteAuthenticationService, SignOutValidator,
};
use crate::models::{
    NavigationOptions, NavigationRequest, RemoteAuthenticationResult, RemoteAuthenticationState,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::constants::TEST_BASE_URI;

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

type State = RemoteAuthenticationState;
type Context = RemoteAuthenticationContext<State>;
type Outcome = RemoteAuthenticationResult<State>;
type Handler = Arc<dyn Fn(&Context) -> Outcome + Send + Sync>;

/// Which service operation was invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCall {
    SignIn,
    CompleteSignIn,
    SignOut,
    CompleteSignOut,
}

/// One recorded call into [`MockAuthenticationService`]
#[derive(Debug)]
pub struct RecordedCall {
    pub call: ServiceCall,
    pub url: Option<String>,
    pub state: Option<Arc<State>>,
}

/// Scriptable remote authentication service
///
/// Works on [`RemoteAuthenticationState`]. Defaults: `sign_in`/`sign_out`
/// succeed with the state they were given, the completions report
/// `OperationCompleted`.
pub struct MockAuthenticationService {
    sign_in: Handler,
    complete_sign_in: Handler,
    sign_out: Handler,
    complete_sign_out: Handler,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl Clone for MockAuthenticationService {
    fn clone(&self) -> Self {
        Self {
            sign_in: Arc::clone(&self.sign_in),
            complete_sign_in: Arc::clone(&self.complete_sign_in),
            sign_out: Arc::clone(&self.sign_out),
            complete_sign_out: Arc::clone(&self.complete_sign_out),
            calls: Arc::clone(&self.calls),
        }
    }
}

impl Default for MockAuthenticationService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAuthenticationService {
    #[must_use]
    pub fn new() -> Self {
        let echo_state: Handler = Arc::new(|context: &Context| {
            context.state.as_ref().map_or_else(
                || RemoteAuthenticationResult::Failure("no state supplied".to_string()),
                |state| RemoteAuthenticationResult::Success(Arc::clone(state)),
            )
        });
        let completed: Handler = Arc::new(|_: &Context| RemoteAuthenticationResult::OperationCompleted);

        Self {
            sign_in: Arc::clone(&echo_state),
            complete_sign_in: Arc::clone(&completed),
            sign_out: echo_state,
            complete_sign_out: completed,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn with_sign_in(
        mut self,
        handler: impl Fn(&Context) -> Outcome + Send + Sync + 'static,
    ) -> Self {
        self.sign_in = Arc::new(handler);
        self
    }

    #[must_use]
    pub fn with_complete_sign_in(
        mut self,
        handler: impl Fn(&Context) -> Outcome + Send + Sync + 'static,
    ) -> Self {
        self.complete_sign_in = Arc::new(handler);
        self
    }

    #[must_use]
    pub fn with_sign_out(
        mut self,
        handler: impl Fn(&Context) -> Outcome + Send + Sync + 'static,
    ) -> Self {
        self.sign_out = Arc::new(handler);
        self
    }

    #[must_use]
    pub fn with_complete_sign_out(
        mut self,
        handler: impl Fn(&Context) -> Outcome + Send + Sync + 'static,
    ) -> Self {
        self.complete_sign_out = Arc::new(handler);
        self
    }

    /// Number of calls made so far, across all operations
    #[must_use]
    pub fn call_count(&self) -> usize {
        locked(&self.calls).len()
    }

    /// Operations invoked so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<ServiceCall> {
        locked(&self.calls).iter().map(|c| c.call).collect()
    }

    /// URL passed to the most recent call, if any
    #[must_use]
    pub fn last_url(&self) -> Option<String> {
        locked(&self.calls).last().and_then(|c| c.url.clone())
    }

    /// State passed to the most recent call, if any
    #[must_use]
    pub fn last_state(&self) -> Option<Arc<State>> {
        locked(&self.calls).last().and_then(|c| c.state.clone())
    }

    fn record(&self, call: ServiceCall, handler: &Handler, context: &Context) -> Outcome {
        locked(&self.calls).push(RecordedCall {
            call,
            url: context.url.clone(),
            state: context.state.clone(),
        });
        handler(context)
    }
}

#[async_trait]
impl RemoteAuthenticationService<State> for MockAuthenticationService {
    async fn sign_in(&self, context: Context) -> Outcome {
        self.record(ServiceCall::SignIn, &self.sign_in, &context)
    }

    async fn complete_sign_in(&self, context: Context) -> Outcome {
        self.record(ServiceCall::CompleteSignIn, &self.complete_sign_in, &context)
    }

    async fn sign_out(&self, context: Context) -> Outcome {
        self.record(ServiceCall::SignOut, &self.sign_out, &context)
    }

    async fn complete_sign_out(&self, context: Context) -> Outcome {
        self.record(ServiceCall::CompleteSignOut, &self.complete_sign_out, &context)
    }
}

/// In-memory navigation manager
#[derive(Clone)]
pub struct MockNavigator {
    uri: Arc<Mutex<String>>,
    base_uri: String,
    navigations: Arc<Mutex<Vec<NavigationRequest>>>,
}

impl MockNavigator {
    /// Navigator positioned at `uri` under [`TEST_BASE_URI`]
    #[must_use]
    pub fn new(uri: &str) -> Self {
        Self {
            uri: Arc::new(Mutex::new(uri.to_string())),
            base_uri: TEST_BASE_URI.to_string(),
            navigations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn with_base_uri(mut self, base_uri: &str) -> Self {
        self.base_uri = base_uri.to_string();
        self
    }

    /// Every navigation issued so far
    #[must_use]
    pub fn navigations(&self) -> Vec<NavigationRequest> {
        locked(&self.navigations).clone()
    }

    #[must_use]
    pub fn last_navigation(&self) -> Option<NavigationRequest> {
        locked(&self.navigations).last().cloned()
    }
}

impl Navigator for MockNavigator {
    fn uri(&self) -> String {
        locked(&self.uri).clone()
    }

    fn base_uri(&self) -> String {
        self.base_uri.clone()
    }

    fn navigate_to(&self, url: &str, options: NavigationOptions) {
        locked(&self.navigations).push(NavigationRequest {
            url: url.to_string(),
            options,
        });
        *locked(&self.uri) = url.to_string();
    }
}

/// Authentication state provider with a fixed answer
#[derive(Clone)]
pub struct MockStateProvider {
    authenticated: bool,
    queries: Arc<AtomicUsize>,
}

impl MockStateProvider {
    #[must_use]
    pub fn authenticated() -> Self {
        Self {
            authenticated: true,
            queries: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            queries: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthenticationStateProvider for MockStateProvider {
    async fn is_authenticated(&self) -> bool {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.authenticated
    }
}

/// Sign-out validator with a fixed answer
#[derive(Clone)]
pub struct MockSignOutValidator {
    valid: bool,
    checks: Arc<AtomicUsize>,
}

impl MockSignOutValidator {
    #[must_use]
    pub fn accepting() -> Self {
        Self {
            valid: true,
            checks: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn rejecting() -> Self {
        Self {
            valid: false,
            checks: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn check_count(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignOutValidator for MockSignOutValidator {
    async fn validate_sign_out_state(&self) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.valid
    }
}

/// Collects the states handed to a success callback
///
/// With [`Self::observing_callback`] it also records how many navigations
/// the watched navigator had issued each time the callback fired.
pub struct CallbackRecorder {
    received: Arc<Mutex<Vec<Arc<State>>>>,
    navigations_seen: Arc<Mutex<Vec<usize>>>,
}

impl Clone for CallbackRecorder {
    fn clone(&self) -> Self {
        Self {
            received: Arc::clone(&self.received),
            navigations_seen: Arc::clone(&self.navigations_seen),
        }
    }
}

impl Default for CallbackRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            received: Arc::new(Mutex::new(Vec::new())),
            navigations_seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Callback to register on the builder
    ///
    /// Also notes how many navigations `navigator` had issued when it fires.
    #[must_use]
    pub fn observing_callback(
        &self,
        navigator: &MockNavigator,
    ) -> impl Fn(Arc<State>) + Send + Sync + 'static {
        let received = Arc::clone(&self.received);
        let navigations_seen = Arc::clone(&self.navigations_seen);
        let navigator = navigator.clone();
        move |state| {
            locked(&navigations_seen).push(navigator.navigations().len());
            locked(&received).push(state);
        }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        locked(&self.received).len()
    }

    #[must_use]
    pub fn received(&self) -> Vec<Arc<State>> {
        locked(&self.received).clone()
    }

    /// Navigation counts observed at each invocation, in order
    #[must_use]
    pub fn navigations_seen(&self) -> Vec<usize> {
        locked(&self.navigations_seen).clone()
    }
}
