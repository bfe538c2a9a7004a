//! Command execution against a [`SessionManager`].
//!
//! Every command bootstraps first and returns the single line to print.

use crate::cli::Command;
use crate::error::CliError;

use models::{Identity, LoginCredentials};
use session_core::{LogoutOutcome, SessionFacade, SessionManager, SessionPhase};

use std::sync::Arc;

use log::{debug, info};
use serde_json::Value;

pub async fn execute(command: &Command, manager: Arc<SessionManager>) -> Result<String, CliError> {
    let phase = manager.bootstrap().await;
    debug!("Session phase before command: {}", phase);

    match command {
        Command::Status => Ok(status_line(phase, manager.store().identity().as_ref())),
        Command::Login { email, password } => login(manager, email, password).await,
        Command::Logout => logout(manager).await,
        Command::Whoami => whoami(&manager).await,
    }
}

fn status_line(phase: SessionPhase, identity: Option<&Identity>) -> String {
    match identity {
        Some(identity) => format!("{} as {}", phase, describe(identity)),
        None => phase.to_string(),
    }
}

/// Email when present, else the id, else a placeholder.
pub fn describe(identity: &Identity) -> String {
    if let Some(email) = identity.field("email").and_then(Value::as_str) {
        return email.to_string();
    }
    match identity.id() {
        Some(Value::String(id)) => id.clone(),
        Some(id) => id.to_string(),
        None => "unknown user".to_string(),
    }
}

async fn login(
    manager: Arc<SessionManager>,
    email: &str,
    password: &str,
) -> Result<String, CliError> {
    let credentials = LoginCredentials::new(email, password)?;
    let facade = SessionFacade::new(manager);

    match facade.sign_in(&credentials).await {
        Ok(identity) => {
            info!("Login command succeeded");
            Ok(format!("Signed in as {}", describe(&identity)))
        }
        Err(e) => Err(CliError::session(
            facade.error().unwrap_or_else(|| e.to_string()),
        )),
    }
}

async fn logout(manager: Arc<SessionManager>) -> Result<String, CliError> {
    let facade = SessionFacade::new(manager);

    match facade.sign_out().await {
        Ok(LogoutOutcome::Confirmed) => Ok("Signed out".to_string()),
        Ok(LogoutOutcome::LocalOnly(e)) => Ok(format!(
            "Signed out locally (backend logout failed: {})",
            e.error_category()
        )),
        Err(e) => Err(CliError::session(
            facade.error().unwrap_or_else(|| e.to_string()),
        )),
    }
}

async fn whoami(manager: &SessionManager) -> Result<String, CliError> {
    if !manager.store().is_authenticated() {
        return Err(CliError::not_signed_in());
    }

    match manager.refresh_identity().await? {
        Some(identity) => serde_json::to_string(identity.fields())
            .map_err(|e| CliError::sessionctl(format!("Failed to render identity: {e}"))),
        None => Err(CliError::not_signed_in()),
    }
}
