//! Anti-forgery guard for mutating requests.
//!
//! With the cookie strategy every POST/PUT/PATCH/DELETE is preceded by a
//! priming `GET` that makes the backend (re)issue the CSRF cookie; the cookie
//! value is then echoed in the CSRF header of the guarded request. Priming
//! requests are serialized so concurrent mutating calls each get their own,
//! completed priming round-trip. A failed priming aborts the guarded request.
//!
//! With the bearer strategy the guard is a pass-through.

use super::ApiClient;
use crate::config::{AuthStrategy, CsrfConfig};
use crate::error::SessionError;

use std::sync::Arc;

use log::{debug, warn};
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tokio::sync::Mutex;

struct CsrfSettings {
    cookie_path: String,
    cookie_name: String,
    header_name: HeaderName,
}

#[derive(Clone)]
pub struct CsrfGuard {
    client: ApiClient,
    settings: Option<Arc<CsrfSettings>>,
    priming: Arc<Mutex<()>>,
}

/// Whether a request with `method` must be preceded by CSRF priming.
///
/// Only GET, HEAD, OPTIONS and TRACE skip it.
pub fn requires_priming(method: &Method) -> bool {
    !matches!(
        method,
        &Method::GET | &Method::HEAD | &Method::OPTIONS | &Method::TRACE
    )
}

impl CsrfGuard {
    pub fn new(
        client: ApiClient,
        strategy: AuthStrategy,
        config: &CsrfConfig,
    ) -> Result<Self, SessionError> {
        let settings = match strategy {
            AuthStrategy::CookieSession => {
                let header_name = HeaderName::from_bytes(config.header_name.trim().as_bytes())
                    .map_err(|e| {
                        SessionError::header(format!(
                            "Invalid CSRF header name '{}': {}",
                            config.header_name, e
                        ))
                    })?;
                Some(Arc::new(CsrfSettings {
                    cookie_path: config.cookie_path.clone(),
                    cookie_name: config.cookie_name.clone(),
                    header_name,
                }))
            }
            AuthStrategy::BearerToken => None,
        };

        Ok(Self {
            client,
            settings,
            priming: Arc::new(Mutex::new(())),
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Whether priming is active (cookie strategy).
    pub fn is_enabled(&self) -> bool {
        self.settings.is_some()
    }

    /// Ask the backend to (re)issue the anti-forgery cookie.
    ///
    /// Idempotent and safe to call before every mutating request. No-op with
    /// the bearer strategy.
    pub async fn ensure_fresh_token(&self) -> Result<(), SessionError> {
        let Some(settings) = &self.settings else {
            return Ok(());
        };

        let _priming = self.priming.lock().await;
        debug!("Priming CSRF cookie via {}", settings.cookie_path);

        self.client
            .dispatch(Method::GET, &settings.cookie_path, None, HeaderMap::new())
            .await
            .map_err(|e| {
                warn!("CSRF priming failed ({}): {}", e.error_category(), e);
                e
            })?;

        Ok(())
    }

    /// Send a request, priming CSRF first when `method` mutates state.
    pub async fn guarded_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, SessionError> {
        let mut headers = HeaderMap::new();

        if requires_priming(&method) {
            self.ensure_fresh_token().await?;

            if let Some(settings) = &self.settings {
                match self.client.cookie_value(&settings.cookie_name) {
                    Some(token) => {
                        let mut value = HeaderValue::from_str(&token)?;
                        value.set_sensitive(true);
                        headers.insert(settings.header_name.clone(), value);
                    }
                    None => debug!(
                        "No {} cookie after priming, sending {} {} without {}",
                        settings.cookie_name, method, path, settings.header_name
                    ),
                }
            }
        }

        self.client.send_json(method, path, body, headers).await
    }
}
