// HTTP client for the planning REST API
//
// Holds the base URL, the cookie jar carrying the Django session, and the
// CSRF token attached to state-changing requests. One client is built from
// configuration and cloned into whatever needs it.

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use super::error::ApiError;
use super::retry::RetryPolicy;
use crate::config::constants::{
    DEFAULT_API_URL, DEFAULT_KEEPALIVE_MINUTES, DEFAULT_REQUEST_TIMEOUT_SECS,
};

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "X-CSRFToken";
const CSRF_PATH: &str = "auth/csrf/";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub keepalive_interval: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            keepalive_interval: Duration::from_secs(DEFAULT_KEEPALIVE_MINUTES * 60),
        }
    }
}

impl ApiSettings {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

struct Session {
    http: Client,
    jar: Arc<Jar>,
    csrf_token: Option<String>,
    authenticated: bool,
}

impl Session {
    fn fresh(timeout: Duration) -> Result<Self, ApiError> {
        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .timeout(timeout)
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;
        Ok(Self {
            http,
            jar,
            csrf_token: None,
            authenticated: false,
        })
    }
}

struct Inner {
    base_url: Url,
    settings: ApiSettings,
    session: RwLock<Session>,
    // Serialises CSRF refreshes so concurrent callers fetch the token once.
    csrf_refresh: Mutex<()>,
}

#[derive(Deserialize)]
struct CsrfBody {
    #[serde(default, rename = "csrfToken", alias = "csrftoken", alias = "csrf_token")]
    csrf_token: Option<String>,
}

#[derive(Clone)]
pub struct PlanningClient {
    inner: Arc<Inner>,
}

impl PlanningClient {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(&settings.base_url)?;
        let session = Session::fresh(settings.timeout)?;

        Ok(Self {
            inner: Arc::new(Inner {
                base_url,
                settings,
                session: RwLock::new(session),
                csrf_refresh: Mutex::new(()),
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.inner.settings
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.settings.retry
    }

    /// Resolve an endpoint path against the base URL.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.session.read().await.authenticated
    }

    pub(crate) async fn set_authenticated(&self, authenticated: bool) {
        self.inner.session.write().await.authenticated = authenticated;
    }

    /// Token currently held, or the `csrftoken` cookie if the server set one.
    pub async fn csrf_token(&self) -> Option<String> {
        let session = self.inner.session.read().await;
        session
            .csrf_token
            .clone()
            .or_else(|| cookie_value(&session.jar, &self.inner.base_url, CSRF_COOKIE))
    }

    /// Make sure a CSRF token is available, fetching one if absent.
    pub async fn ensure_csrf(&self) -> Result<String, ApiError> {
        if let Some(token) = self.csrf_token().await {
            return Ok(token);
        }

        let _guard = self.inner.csrf_refresh.lock().await;
        // Another caller may have fetched it while we waited
        if let Some(token) = self.csrf_token().await {
            return Ok(token);
        }
        self.store_fresh_csrf().await
    }

    pub(crate) async fn forget_held_csrf(&self) {
        self.inner.session.write().await.csrf_token = None;
    }

    /// Discard the held token and fetch a new one.
    pub async fn refresh_csrf(&self) -> Result<String, ApiError> {
        let _guard = self.inner.csrf_refresh.lock().await;
        self.store_fresh_csrf().await
    }

    async fn store_fresh_csrf(&self) -> Result<String, ApiError> {
        let token = self.fetch_csrf().await?;
        self.inner.session.write().await.csrf_token = Some(token.clone());
        tracing::debug!("Obtained CSRF token");
        Ok(token)
    }

    async fn fetch_csrf(&self) -> Result<String, ApiError> {
        let (http, jar) = {
            let session = self.inner.session.read().await;
            (session.http.clone(), session.jar.clone())
        };
        let url = self.url(CSRF_PATH)?;

        let response = http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Csrf(format!("{} returned {}", CSRF_PATH, status)));
        }

        let from_body = response
            .json::<CsrfBody>()
            .await
            .ok()
            .and_then(|b| b.csrf_token)
            .filter(|t| !t.is_empty());

        from_body
            .or_else(|| cookie_value(&jar, &self.inner.base_url, CSRF_COOKIE))
            .ok_or_else(|| ApiError::Csrf("server set no csrftoken cookie".to_string()))
    }

    /// Forget the session: fresh cookie jar, no CSRF token, logged out.
    pub async fn clear_session(&self) {
        let mut session = self.inner.session.write().await;
        match Session::fresh(self.inner.settings.timeout) {
            Ok(fresh) => *session = fresh,
            Err(e) => {
                tracing::warn!("Could not rebuild HTTP client, keeping cookie jar: {}", e);
                session.csrf_token = None;
                session.authenticated = false;
            }
        }
        tracing::info!("Session cleared; log in again to continue");
    }

    /// Send one request. GET/HEAD/OPTIONS go out as-is; everything else
    /// carries the CSRF header and is retried once if Django rejects the token.
    pub async fn send<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Response, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let state_changing = !matches!(method, Method::GET | Method::HEAD | Method::OPTIONS);
        let mut csrf_retried = false;

        loop {
            let token = if state_changing {
                Some(self.ensure_csrf().await?)
            } else {
                self.csrf_token().await
            };
            let http = self.inner.session.read().await.http.clone();

            let mut request = http
                .request(method.clone(), self.url(path)?)
                .header(ACCEPT, "application/json");
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(token) = &token {
                request = request.header(CSRF_HEADER, token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            tracing::debug!("{} {}", method, path);
            let response = request.send().await.map_err(ApiError::from_reqwest)?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                tracing::warn!("{} {} returned 401; clearing session", method, path);
                self.clear_session().await;
                return Err(ApiError::Unauthorized);
            }
            if status.is_success() {
                return Ok(response);
            }

            let error_body = response.text().await.unwrap_or_default();
            if status == StatusCode::FORBIDDEN
                && state_changing
                && !csrf_retried
                && error_body.contains("CSRF")
            {
                tracing::warn!("CSRF token rejected for {} {}; refreshing", method, path);
                self.refresh_csrf().await?;
                csrf_retried = true;
                continue;
            }

            return Err(ApiError::Status {
                status: status.as_u16(),
                body: error_body,
            });
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self.send::<()>(Method::GET, path, query, None).await?;
        decode(path, response).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, path, &[], Some(body)).await?;
        decode(path, response).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::PUT, path, &[], Some(body)).await?;
        decode(path, response).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::PATCH, path, &[], Some(body)).await?;
        decode(path, response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send::<()>(Method::DELETE, path, &[], None).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ApiError> {
    let text = response.text().await.map_err(ApiError::from_reqwest)?;
    // Action endpoints may answer 204 / empty body
    let text = if text.trim().is_empty() { "null" } else { text.as_str() };
    serde_json::from_str(text).map_err(|e| ApiError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

fn normalize_base_url(raw: &str) -> Result<Url, ApiError> {
    let mut url =
        Url::parse(raw.trim()).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::InvalidUrl(format!(
            "{}: only http and https are supported",
            raw
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn cookie_value(jar: &Jar, url: &Url, name: &str) -> Option<String> {
    let header = jar.cookies(url)?;
    let raw = header.to_str().ok()?;
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = PlanningClient::new(ApiSettings::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let url = normalize_base_url("http://localhost:8000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/");
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        assert!(normalize_base_url("ftp://example.org/api").is_err());
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn test_url_joins_relative_to_api_root() {
        let client =
            PlanningClient::new(ApiSettings::default().with_base_url("http://host/api")).unwrap();
        let url = client.url("/strategic-objectives/").unwrap();
        assert_eq!(url.as_str(), "http://host/api/strategic-objectives/");
    }

    #[test]
    fn test_cookie_value_parsing() {
        let jar = Jar::default();
        let url = Url::parse("http://host/api/").unwrap();
        jar.add_cookie_str("sessionid=s1; Path=/", &url);
        jar.add_cookie_str("csrftoken=tok; Path=/", &url);
        assert_eq!(cookie_value(&jar, &url, CSRF_COOKIE).as_deref(), Some("tok"));
        assert_eq!(cookie_value(&jar, &url, "missing"), None);
    }
}
