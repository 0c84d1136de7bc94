#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use remote_authenticator::{
    authentication::{Navigator, RemoteAuthenticationContext, RemoteAuthenticationService},
    models::{
        AuthenticationAction, NavigationOptions, RemoteAuthenticationResult,
        RemoteAuthenticationState,
    },
    protection::KeyRing,
    settings::RemoteAuthSettings,
    utils::FlowLogging,
    FlowControllerBuilder, ProtectedStateFormat, VERSION,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Dry-run a single flow invocation:
///
/// `remote-authenticator [SEGMENT] [CURRENT_URI]`
///
/// Without arguments only the resolved route table is printed.
#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = RemoteAuthSettings::load().context("Failed to load settings")?;
    let key_ring = KeyRing::from_settings(&settings.protection)
        .context("Failed to initialize data protection")?;

    print_startup_info(&settings);

    let mut args = std::env::args().skip(1);
    let Some(segment) = args.next() else {
        return Ok(());
    };
    let current_uri = args.next().unwrap_or_else(|| {
        format!("{}authentication/{segment}", settings.application.base_uri)
    });

    dry_run(&settings, &key_ring, &segment, current_uri).await
}

fn print_startup_info(settings: &RemoteAuthSettings) {
    println!("🚀 remote-authenticator v{VERSION}");
    println!("🌐 Base URI: {}", settings.application.base_uri);
    println!("📋 Routes:");

    let paths = settings.effective_paths();
    for action in AuthenticationAction::ALL {
        let path = paths.path_for(action);
        FlowLogging::log_route(action, path);
        println!("   {action:<16} {}", path.unwrap_or("-"));
    }
    println!("   {:<16} {}", "remote profile", paths.remote_profile().unwrap_or("-"));
    println!("   {:<16} {}", "remote register", paths.remote_register().unwrap_or("-"));
}

async fn dry_run(
    settings: &RemoteAuthSettings,
    key_ring: &KeyRing,
    segment: &str,
    current_uri: String,
) -> Result<()> {
    let navigator = Arc::new(PrintingNavigator {
        uri: Mutex::new(current_uri),
        base_uri: settings.application.base_uri.clone(),
    });
    let service = DryRunService {
        state_format: ProtectedStateFormat::new(key_ring)?,
    };

    let controller = FlowControllerBuilder::from_settings(settings)
        .with_service(Arc::new(service))
        .with_navigator(navigator)
        .on_log_in_succeeded(|state| println!("✓ Signed in, state: {state:?}"))
        .on_log_out_succeeded(|state| println!("✓ Signed out, state: {state:?}"))
        .build()?;

    let outcome = controller
        .run_segment(segment, RemoteAuthenticationState::new())
        .await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

/// Navigator that prints instead of navigating
struct PrintingNavigator {
    uri: Mutex<String>,
    base_uri: String,
}

impl PrintingNavigator {
    fn current(&self) -> MutexGuard<'_, String> {
        self.uri.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for PrintingNavigator {
    fn uri(&self) -> String {
        self.current().clone()
    }

    fn base_uri(&self) -> String {
        self.base_uri.clone()
    }

    fn navigate_to(&self, url: &str, options: NavigationOptions) {
        println!("➡️  navigate_to {url} {options:?}");
        *self.current() = url.to_string();
    }
}

/// Service that stands in for the identity provider
///
/// Starting a sign-in or sign-out shows the protected state that would be
/// sent along; completions succeed with an empty state.
struct DryRunService {
    state_format: ProtectedStateFormat<RemoteAuthenticationState>,
}

impl DryRunService {
    fn redirect(
        &self,
        context: &RemoteAuthenticationContext<RemoteAuthenticationState>,
    ) -> RemoteAuthenticationResult<RemoteAuthenticationState> {
        let state = context.state.as_deref().cloned().unwrap_or_default();
        match self.state_format.protect(&state) {
            Ok(protected) => {
                println!("🔐 Would redirect to the identity provider with state={protected}");
                RemoteAuthenticationResult::Redirect
            }
            Err(e) => RemoteAuthenticationResult::Failure(e.to_string()),
        }
    }
}

#[async_trait]
impl RemoteAuthenticationService<RemoteAuthenticationState> for DryRunService {
    async fn sign_in(
        &self,
        context: RemoteAuthenticationContext<RemoteAuthenticationState>,
    ) -> RemoteAuthenticationResult<RemoteAuthenticationState> {
        self.redirect(&context)
    }

    async fn complete_sign_in(
        &self,
        _context: RemoteAuthenticationContext<RemoteAuthenticationState>,
    ) -> RemoteAuthenticationResult<RemoteAuthenticationState> {
        RemoteAuthenticationResult::Success(Arc::new(RemoteAuthenticationState::new()))
    }

    async fn sign_out(
        &self,
        context: RemoteAuthenticationContext<RemoteAuthenticationState>,
    ) -> RemoteAuthenticationResult<RemoteAuthenticationState> {
        self.redirect(&context)
    }

    async fn complete_sign_out(
        &self,
        _context: RemoteAuthenticationContext<RemoteAuthenticationState>,
    ) -> RemoteAuthenticationResult<RemoteAuthenticationState> {
        RemoteAuthenticationResult::Success(Arc::new(RemoteAuthenticationState::new()))
    }
}
