// Centralized logging for the recurring authentication flow events
use crate::models::{AuthenticationAction, NavigationRequest, RemoteAuthenticationStatus};
use log::{debug, info, warn};

pub struct FlowLogging;

impl FlowLogging {
    /// Log the start of a flow invocation
    pub fn log_action_start(action: AuthenticationAction) {
        debug!("🔄 Running remote authentication action '{action}'");
    }

    /// Log the status the remote authentication service answered with
    pub fn log_service_result(action: AuthenticationAction, status: RemoteAuthenticationStatus) {
        info!("Remote authentication service returned '{status}' for action '{action}'");
    }

    /// Log a protocol failure that is being turned into a failure-page redirect
    pub fn log_service_failure(action: AuthenticationAction, message: &str) {
        warn!("Remote authentication '{action}' failed: {message}");
    }

    /// Log a navigation issued by the controller
    pub fn log_navigation(request: &NavigationRequest) {
        info!(
            "Navigating to {} (force_load={}, replace={})",
            request.url, request.options.force_load, request.options.replace_history_entry
        );
    }

    /// Log a sign-out that was skipped because nobody is signed in
    pub fn log_sign_out_skipped() {
        info!("User is not authenticated, skipping remote sign-out");
    }

    /// Log a logout request that did not originate from the application
    pub fn log_sign_out_rejected() {
        warn!("⚠️  Logout was not initiated from within the application, refusing to sign out");
    }

    /// Log a rejected return URL
    pub fn log_return_url_rejected(url: &str, reason: &str) {
        warn!("Rejected return url ({reason}): {url}");
    }

    /// Log the resolved route table at startup
    pub fn log_route(action: AuthenticationAction, path: Option<&str>) {
        match path {
            Some(path) => info!("✅ {action:<16} -> {path}"),
            None => info!("❌ {action:<16} -> not configured"),
        }
    }
}
