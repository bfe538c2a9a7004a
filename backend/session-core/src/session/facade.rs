//! UI-facing sign-in/sign-out with per-call status.

use super::lifecycle::{LogoutOutcome, SessionManager};
use crate::error::SessionError;

use models::{Identity, LoginCredentials};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

pub const SIGN_IN_FALLBACK_MESSAGE: &str = "Unable to sign in";
pub const SIGN_OUT_FALLBACK_MESSAGE: &str = "Unable to sign out";

/// Loading/error flags of the most recent facade call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacadeStatus {
    pub loading: bool,
    pub error: Option<String>,
}

/// Thin wrapper around [`SessionManager`] for form handlers.
///
/// Each call resets `error`, raises `loading` for its duration and records
/// the backend's message (or a fallback) on failure before returning the
/// original error. With overlapping calls `loading` stays up until the last
/// one ends. The facade never touches storage or transport itself.
#[derive(Clone)]
pub struct SessionFacade {
    manager: Arc<SessionManager>,
    status: Arc<watch::Sender<FacadeStatus>>,
    // Only changed inside `send_modify`, so it moves in step with `loading`.
    in_flight: Arc<AtomicUsize>,
}

impl SessionFacade {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        let (status, _) = watch::channel(FacadeStatus::default());
        Self {
            manager,
            status: Arc::new(status),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn sign_in(&self, credentials: &LoginCredentials) -> Result<Identity, SessionError> {
        let _loading = self.begin_call();
        let result = self.manager.login(credentials).await;
        if let Err(e) = &result {
            self.record_error(e, SIGN_IN_FALLBACK_MESSAGE);
        }
        result
    }

    pub async fn sign_out(&self) -> Result<LogoutOutcome, SessionError> {
        let _loading = self.begin_call();
        let result = self.manager.logout().await;
        if let Err(e) = &result {
            self.record_error(e, SIGN_OUT_FALLBACK_MESSAGE);
        }
        result
    }

    pub fn user(&self) -> Option<Identity> {
        self.manager.store().identity()
    }

    pub fn is_authenticated(&self) -> bool {
        self.manager.store().is_authenticated()
    }

    pub fn status(&self) -> FacadeStatus {
        self.status.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.status.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.status.borrow().error.clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<FacadeStatus> {
        self.status.subscribe()
    }

    fn begin_call(&self) -> LoadingGuard<'_> {
        self.status.send_modify(|status| {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            status.loading = true;
            status.error = None;
        });
        LoadingGuard { facade: self }
    }

    fn record_error(&self, error: &SessionError, fallback: &str) {
        let message = error.server_message().unwrap_or(fallback).to_string();
        self.status.send_modify(|status| status.error = Some(message));
    }
}

/// Ends a call, including when its future is dropped. `loading` drops
/// once no call is left in flight.
struct LoadingGuard<'a> {
    facade: &'a SessionFacade,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let in_flight = &self.facade.in_flight;
        self.facade.status.send_modify(|status| {
            let remaining = in_flight.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
            status.loading = remaining > 0;
        });
    }
}
