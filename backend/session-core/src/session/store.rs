//! Observable session state.
//!
//! The store wraps a `tokio::sync::watch` channel: every accepted command
//! updates the value and notifies subscribers before `apply` returns, so a
//! read after a transition never sees the previous state.

use models::Identity;

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::watch;

/// Coarse lifecycle position, derived from [`Session`] fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Bootstrapping,
    Authenticated,
    Unauthenticated,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Uninitialized => write!(f, "uninitialized"),
            SessionPhase::Bootstrapping => write!(f, "bootstrapping"),
            SessionPhase::Authenticated => write!(f, "authenticated"),
            SessionPhase::Unauthenticated => write!(f, "unauthenticated"),
        }
    }
}

/// Snapshot of the session.
///
/// `authenticated` is not stored; it is always `identity.is_some()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    identity: Option<Identity>,
    bootstrapping: bool,
    bootstrapped: bool,
    last_error: Option<String>,
}

impl Session {
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn is_bootstrapping(&self) -> bool {
        self.bootstrapping
    }

    /// Message of the most recent failed login, cleared by the next success
    /// or by sign-out. Bootstrap failures never land here.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.bootstrapping {
            SessionPhase::Bootstrapping
        } else if self.identity.is_some() {
            SessionPhase::Authenticated
        } else if self.bootstrapped {
            SessionPhase::Unauthenticated
        } else {
            SessionPhase::Uninitialized
        }
    }

    /// Returns whether the session changed.
    pub(crate) fn apply(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::BeginBootstrap => {
                if self.bootstrapping || self.bootstrapped {
                    return false;
                }
                self.bootstrapping = true;
                true
            }
            SessionCommand::BootstrapResolved(identity) => {
                if !self.bootstrapping {
                    warn!("Bootstrap resolution received outside of bootstrapping, ignoring");
                    return false;
                }
                self.bootstrapping = false;
                self.bootstrapped = true;
                self.identity = identity;
                true
            }
            SessionCommand::SignedIn(identity) => {
                self.identity = Some(identity);
                self.last_error = None;
                true
            }
            SessionCommand::LoginFailed(message) => {
                self.last_error = Some(message);
                true
            }
            SessionCommand::IdentityRefreshed(identity) => {
                if self.identity.as_ref() == Some(&identity) {
                    return false;
                }
                self.identity = Some(identity);
                true
            }
            SessionCommand::SignedOut => {
                let changed = self.identity.is_some() || self.last_error.is_some();
                self.identity = None;
                self.last_error = None;
                changed
            }
        }
    }
}

/// Transitions the lifecycle manager may request.
#[derive(Debug, Clone)]
pub(crate) enum SessionCommand {
    BeginBootstrap,
    BootstrapResolved(Option<Identity>),
    SignedIn(Identity),
    LoginFailed(String),
    IdentityRefreshed(Identity),
    SignedOut,
}

/// Single owner of the [`Session`].
///
/// Cheap to clone; all clones share the same state. Only the session
/// manager can mutate it.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<Session>>,
}

impl SessionStore {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            state: Arc::new(state),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_bootstrapping(&self) -> bool {
        self.state.borrow().is_bootstrapping()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase()
    }

    pub(crate) fn apply(&self, command: SessionCommand) -> bool {
        let label = command.label();
        let changed = self.state.send_if_modified(|session| session.apply(command));
        debug!(
            "Session command {} -> {} (changed: {})",
            label,
            self.phase(),
            changed
        );
        changed
    }
}

impl SessionCommand {
    fn label(&self) -> &'static str {
        match self {
            SessionCommand::BeginBootstrap => "begin_bootstrap",
            SessionCommand::BootstrapResolved(_) => "bootstrap_resolved",
            SessionCommand::SignedIn(_) => "signed_in",
            SessionCommand::LoginFailed(_) => "login_failed",
            SessionCommand::IdentityRefreshed(_) => "identity_refreshed",
            SessionCommand::SignedOut => "signed_out",
        }
    }
}
