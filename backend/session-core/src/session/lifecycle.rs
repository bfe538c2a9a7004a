//! Session lifecycle: the only writer of the [`SessionStore`].
//!
//! ```text
//! Uninitialized --start/bootstrap--> Bootstrapping --identity--> Authenticated
//!                                          |                        |   ^
//!                                          +--failure--> Unauthenticated |
//!                                                           |  login ----+
//!                                                           +<-- logout / clear
//! ```
//!
//! Every transition runs under one async mutex, so a login racing a logout
//! is applied strictly one after the other. Bearer credentials are persisted
//! and attached inside the same critical section as the store update.

use super::facade::SIGN_IN_FALLBACK_MESSAGE;
use super::store::{SessionCommand, SessionPhase, SessionStore};
use super::{LOGIN_ENDPOINT, LOGOUT_ENDPOINT, ME_ENDPOINT};
use crate::config::{AuthStrategy, SessionConfig};
use crate::error::SessionError;
use crate::storage::{self, CredentialStorage, PersistentCookieJar};
use crate::transport::{ApiClient, CsrfGuard};

use models::{AuthToken, Identity, LoginCredentials};

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tokio::time::timeout;

/// Result of a logout. Local state is cleared in both cases.
#[derive(Debug)]
pub enum LogoutOutcome {
    /// The backend acknowledged the logout.
    Confirmed,
    /// The backend call failed; only the local session was cleared.
    LocalOnly(SessionError),
}

impl LogoutOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, LogoutOutcome::Confirmed)
    }
}

// Token fields stay plain strings only until they are wrapped in `AuthToken`.
#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    user: Value,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
}

pub struct SessionManager {
    strategy: AuthStrategy,
    client: ApiClient,
    guard: CsrfGuard,
    store: SessionStore,
    storage: Arc<dyn CredentialStorage>,
    transition: Mutex<()>,
    bootstrap_timeout: Duration,
}

impl SessionManager {
    /// Build a manager in the `Uninitialized` phase. Nothing is sent until
    /// [`SessionManager::bootstrap`] or another operation runs.
    ///
    /// `storage` is only touched by the bearer strategy. Cookies are kept in
    /// memory; use [`SessionManager::with_cookie_jar`] to keep a cookie
    /// session across restarts.
    pub fn new(
        config: &SessionConfig,
        storage: Arc<dyn CredentialStorage>,
    ) -> Result<Self, SessionError> {
        Self::with_cookie_jar(config, storage, Arc::new(PersistentCookieJar::in_memory()))
    }

    /// Like [`SessionManager::new`], with the cookie strategy reading and
    /// writing `cookie_jar`.
    pub fn with_cookie_jar(
        config: &SessionConfig,
        storage: Arc<dyn CredentialStorage>,
        cookie_jar: Arc<PersistentCookieJar>,
    ) -> Result<Self, SessionError> {
        let strategy = config.auth.strategy;
        let client = ApiClient::with_cookie_jar(&config.api, strategy, cookie_jar)?;
        let guard = CsrfGuard::new(client.clone(), strategy, &config.auth.csrf)?;

        info!(
            "Session manager created for {} ({} strategy)",
            client.base_url(),
            strategy
        );

        Ok(Self {
            strategy,
            client,
            guard,
            store: SessionStore::new(),
            storage,
            transition: Mutex::new(()),
            bootstrap_timeout: config.auth.bootstrap_timeout(),
        })
    }

    /// Build a manager and start bootstrapping in the background.
    ///
    /// The store reports `Bootstrapping` as soon as this returns. Must be
    /// called from within a tokio runtime.
    pub fn start(
        config: &SessionConfig,
        storage: Arc<dyn CredentialStorage>,
    ) -> Result<Arc<Self>, SessionError> {
        Self::start_with_cookie_jar(config, storage, Arc::new(PersistentCookieJar::in_memory()))
    }

    pub fn start_with_cookie_jar(
        config: &SessionConfig,
        storage: Arc<dyn CredentialStorage>,
        cookie_jar: Arc<PersistentCookieJar>,
    ) -> Result<Arc<Self>, SessionError> {
        let manager = Arc::new(Self::with_cookie_jar(config, storage, cookie_jar)?);
        manager.store.apply(SessionCommand::BeginBootstrap);

        let bootstrapper = Arc::clone(&manager);
        tokio::spawn(async move {
            bootstrapper.bootstrap().await;
        });

        Ok(manager)
    }

    pub fn strategy(&self) -> AuthStrategy {
        self.strategy
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Transport with the current credential attached, for application calls.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// CSRF guard for application calls that mutate backend state.
    pub fn guard(&self) -> &CsrfGuard {
        &self.guard
    }

    /// Recover an existing session, once per manager lifetime.
    ///
    /// Later calls wait for the first to finish and return the current phase
    /// without touching the network. Failures are logged and end in
    /// `Unauthenticated`; they never reach the caller or `last_error`.
    pub async fn bootstrap(&self) -> SessionPhase {
        let _transition = self.transition.lock().await;

        let begun_now = self.store.apply(SessionCommand::BeginBootstrap);
        if begun_now || self.store.is_bootstrapping() {
            self.run_bootstrap().await;
        }

        self.store.phase()
    }

    async fn run_bootstrap(&self) {
        info!("Bootstrapping session ({} strategy)", self.strategy);

        let identity = match timeout(self.bootstrap_timeout, self.recover_identity()).await {
            Ok(Ok(Some(identity))) => Some(identity),
            Ok(Ok(None)) => {
                info!("No existing session to recover");
                None
            }
            Ok(Err(e)) => {
                warn!(
                    "Session recovery failed ({}), continuing unauthenticated: {}",
                    e.error_category(),
                    e
                );
                None
            }
            Err(_) => {
                warn!(
                    "Session recovery timed out after {}ms, continuing unauthenticated",
                    self.bootstrap_timeout.as_millis()
                );
                None
            }
        };

        if identity.is_none() {
            if let Err(e) = self.clear_local_credential().await {
                warn!("Failed to clear stale credential after bootstrap: {}", e);
            }
        } else {
            self.save_rotated_cookies();
        }

        let authenticated = identity.is_some();
        self.store.apply(SessionCommand::BootstrapResolved(identity));
        info!("Bootstrap finished (authenticated: {})", authenticated);
    }

    async fn recover_identity(&self) -> Result<Option<Identity>, SessionError> {
        if self.strategy == AuthStrategy::BearerToken {
            let Some(token) = storage::load_token(self.storage.as_ref())? else {
                debug!("No persisted token found");
                return Ok(None);
            };
            self.client.set_auth_token(Some(&token)).await?;
        }

        self.fetch_identity().await
    }

    async fn fetch_identity(&self) -> Result<Option<Identity>, SessionError> {
        let body = self
            .guard
            .guarded_request(Method::GET, ME_ENDPOINT, None)
            .await?;

        Ok(body.get("user").cloned().and_then(Identity::from_value))
    }

    /// Submit credentials and establish a session.
    ///
    /// On failure the session is left as it was, the message is recorded in
    /// `last_error` and the error is returned. No automatic retry.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Identity, SessionError> {
        self.bootstrap().await;
        let _transition = self.transition.lock().await;

        info!("Signing in as {}", credentials.email());

        match self.submit_login(credentials).await {
            Ok(identity) => {
                self.store.apply(SessionCommand::SignedIn(identity.clone()));
                info!("Signed in as {}", credentials.email());
                Ok(identity)
            }
            Err(e) => {
                warn!("Sign-in failed ({}): {}", e.error_category(), e);
                let message = e.server_message().unwrap_or(SIGN_IN_FALLBACK_MESSAGE);
                self.store.apply(SessionCommand::LoginFailed(message.to_string()));
                Err(e)
            }
        }
    }

    async fn submit_login(&self, credentials: &LoginCredentials) -> Result<Identity, SessionError> {
        let body = json!({
            "email": credentials.email(),
            "password": credentials.password().expose(),
        });

        let response = self
            .guard
            .guarded_request(Method::POST, LOGIN_ENDPOINT, Some(&body))
            .await?;

        let login: LoginResponse = serde_json::from_value(response)?;
        let identity = Identity::from_value(login.user)
            .ok_or_else(|| SessionError::decode("Login response has no user object"))?;

        match self.strategy {
            AuthStrategy::BearerToken => {
                let token = login
                    .token
                    .ok_or_else(|| SessionError::decode("Login response has no token"))?;
                let token = AuthToken::new(token, login.token_type.as_deref()).map_err(|e| {
                    SessionError::decode(format!("Unusable token in login response: {e}"))
                })?;
                self.install_token(&token).await?;
            }
            AuthStrategy::CookieSession => self.client.persist_cookies()?,
        }

        Ok(identity)
    }

    /// Persist then attach; roll the persisted entries back if attaching fails.
    async fn install_token(&self, token: &AuthToken) -> Result<(), SessionError> {
        storage::persist_token(self.storage.as_ref(), token)?;

        if let Err(e) = self.client.set_auth_token(Some(token)).await {
            if let Err(rollback) = storage::clear_token(self.storage.as_ref()) {
                error!("Failed to roll back persisted token: {}", rollback);
            }
            return Err(e);
        }

        debug!("Token persisted and attached ({} chars)", token.token().len());
        Ok(())
    }

    /// End the session on the backend and locally.
    ///
    /// Local state is cleared even when the backend call fails; that case is
    /// reported as [`LogoutOutcome::LocalOnly`]. Only a failure to clear local
    /// storage is returned as an error.
    pub async fn logout(&self) -> Result<LogoutOutcome, SessionError> {
        self.bootstrap().await;
        let _transition = self.transition.lock().await;

        info!("Signing out");

        let remote = self
            .guard
            .guarded_request(Method::POST, LOGOUT_ENDPOINT, None)
            .await;

        self.clear_local_state().await?;

        match remote {
            Ok(_) => {
                info!("Signed out");
                Ok(LogoutOutcome::Confirmed)
            }
            Err(e) => {
                warn!(
                    "Backend logout failed ({}), local session cleared anyway: {}",
                    e.error_category(),
                    e
                );
                Ok(LogoutOutcome::LocalOnly(e))
            }
        }
    }

    /// Re-read the identity with the attached credential or cookie.
    ///
    /// `Unauthorized` (or a response without a user) clears the session.
    /// Other failures leave the session untouched.
    pub async fn refresh_identity(&self) -> Result<Option<Identity>, SessionError> {
        self.bootstrap().await;
        let _transition = self.transition.lock().await;

        match self.fetch_identity().await {
            Ok(Some(identity)) => {
                self.save_rotated_cookies();
                self.store.apply(SessionCommand::IdentityRefreshed(identity.clone()));
                Ok(Some(identity))
            }
            Ok(None) => {
                info!("Backend reports no active user, clearing session");
                self.clear_local_state().await?;
                Ok(None)
            }
            Err(e) if e.is_unauthorized() => {
                warn!("Session expired during refresh, clearing: {}", e);
                self.clear_local_state().await?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Drop the local session without contacting the backend.
    pub async fn clear_session(&self) -> Result<(), SessionError> {
        self.bootstrap().await;
        let _transition = self.transition.lock().await;
        info!("Clearing local session");
        self.clear_local_state().await
    }

    // Caller must hold the transition lock.
    async fn clear_local_state(&self) -> Result<(), SessionError> {
        let credential = self.clear_local_credential().await;
        let cookies = self.client.clear_cookies();
        self.store.apply(SessionCommand::SignedOut);
        credential.and(cookies)
    }

    // The backend may rotate the session cookie on any response.
    fn save_rotated_cookies(&self) {
        if let Err(e) = self.client.persist_cookies() {
            warn!("Failed to save session cookies: {}", e);
        }
    }

    async fn clear_local_credential(&self) -> Result<(), SessionError> {
        self.client.set_auth_token(None).await?;
        if self.strategy == AuthStrategy::BearerToken {
            storage::clear_token(self.storage.as_ref())?;
        }
        Ok(())
    }
}
