//! HTTP transport shared by every session operation.
//!
//! One `reqwest::Client` per session manager, configured with the API base
//! URL, JSON content negotiation, a request timeout and (cookie strategy only)
//! a cookie jar. The bearer header is attached per request from shared state so
//! every clone of the client sees credential changes immediately.

pub mod csrf;

pub use csrf::{CsrfGuard, requires_priming};

use crate::config::{ApiConfig, AuthStrategy};
use crate::error::SessionError;
use crate::storage::PersistentCookieJar;

use common::ErrorLocation;
use models::AuthToken;

use std::sync::Arc;

use const_format::concatcp;
use log::debug;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use tokio::sync::RwLock;
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json";
const USER_AGENT: &str = concatcp!("session-core/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    client: Client,
    authorization: Arc<RwLock<Option<HeaderValue>>>,
    cookie_jar: Option<Arc<PersistentCookieJar>>,
}

impl ApiClient {
    /// Client whose cookies (cookie strategy) live only as long as the process.
    pub fn new(config: &ApiConfig, strategy: AuthStrategy) -> Result<Self, SessionError> {
        Self::with_cookie_jar(config, strategy, Arc::new(PersistentCookieJar::in_memory()))
    }

    /// Client using `cookie_jar` for the cookie strategy. The jar is ignored
    /// with the bearer strategy.
    pub fn with_cookie_jar(
        config: &ApiConfig,
        strategy: AuthStrategy,
        cookie_jar: Arc<PersistentCookieJar>,
    ) -> Result<Self, SessionError> {
        let base_url = normalize_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        let mut builder = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .default_headers(headers);

        let cookie_jar = match strategy {
            AuthStrategy::CookieSession => {
                builder = builder.cookie_provider(Arc::clone(&cookie_jar));
                Some(cookie_jar)
            }
            AuthStrategy::BearerToken => None,
        };

        let client = builder.build()?;

        Ok(Self {
            base_url,
            client,
            authorization: Arc::new(RwLock::new(None)),
            cookie_jar,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` against the base URL. Leading slashes are ignored so
    /// `"/me"` and `"me"` both stay under the base path.
    pub fn endpoint(&self, path: &str) -> Result<Url, SessionError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Attach (`Some`) or remove (`None`) the `Authorization` header for all
    /// subsequent requests.
    pub async fn set_auth_token(&self, token: Option<&AuthToken>) -> Result<(), SessionError> {
        let value = match token {
            Some(token) => {
                let mut value = HeaderValue::from_str(&token.authorization_value())?;
                value.set_sensitive(true);
                Some(value)
            }
            None => None,
        };

        let mut authorization = self.authorization.write().await;
        match (&*authorization, &value) {
            (None, Some(_)) => debug!("Attached authorization header"),
            (Some(_), None) => debug!("Removed authorization header"),
            _ => {}
        }
        *authorization = value;
        Ok(())
    }

    pub async fn has_auth_token(&self) -> bool {
        self.authorization.read().await.is_some()
    }

    /// Percent-decoded value of a cookie the backend set for the base URL.
    ///
    /// Always `None` with the bearer strategy (no jar).
    pub fn cookie_value(&self, name: &str) -> Option<String> {
        self.cookie_jar.as_ref()?.value(&self.base_url, name)
    }

    /// Write the cookie jar to its file, if it has one.
    pub fn persist_cookies(&self) -> Result<(), SessionError> {
        if let Some(jar) = &self.cookie_jar {
            jar.save()?;
        }
        Ok(())
    }

    /// Forget every cookie, in memory and on disk.
    pub fn clear_cookies(&self) -> Result<(), SessionError> {
        if let Some(jar) = &self.cookie_jar {
            jar.clear();
            jar.save()?;
            debug!("Cookie jar cleared");
        }
        Ok(())
    }

    async fn prepare_request(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request;
        if let Some(authorization) = self.authorization.read().await.clone() {
            request = request.header(AUTHORIZATION, authorization);
        }
        request
    }

    /// Send a request and return the raw body of a success response.
    ///
    /// Non-success statuses are normalized into [`SessionError`].
    pub async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        headers: HeaderMap,
    ) -> Result<String, SessionError> {
        let url = self.endpoint(path)?;
        debug!("{} {}", method, url.path());

        let mut request = self
            .prepare_request(self.client.request(method.clone(), url.clone()))
            .await
            .headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!("{} {} failed with HTTP {}", method, url.path(), status.as_u16());
            return Err(SessionError::from_response(status.as_u16(), &text));
        }

        Ok(text)
    }

    /// Like [`ApiClient::dispatch`], decoding the body as JSON. An empty body
    /// decodes to `Value::Null`.
    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        headers: HeaderMap,
    ) -> Result<Value, SessionError> {
        let text = self.dispatch(method, path, body, headers).await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, SessionError> {
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(SessionError::Url {
            message: format!("'{raw}' cannot be used as a base URL"),
            location: ErrorLocation::caller(),
        });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
