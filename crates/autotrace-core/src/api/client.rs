//! HTTP transport for the Autotrace REST API.
//!
//! `ApiClient` owns the connection pool, the current bearer token and the
//! unauthorized-response hook. Clones share all three, so the session
//! manager and the domain clients can hold their own copies while the
//! session manager stays the only writer of the token and the hook.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::{ApiError, Result};
use crate::config::Config;

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when nothing is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001";

/// HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 20;

/// Callback run when the API answers 401.
pub type UnauthorizedHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct TransportState {
    token: RwLock<Option<String>>,
    unauthorized: RwLock<Option<UnauthorizedHandler>>,
}

/// API client for the Autotrace server.
/// Clone is cheap - reqwest::Client and the token state are reference counted.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    state: Arc<TransportState>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ApiError::InvalidRequest("API base URL is empty".to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            state: Arc::new(TransportState::default()),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    /// Base URL without trailing slashes.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Build an endpoint path from raw segments, percent-encoding each one
    /// so ids cannot add segments, a query or a fragment.
    pub(crate) fn endpoint(segments: &[&str]) -> Result<String> {
        let mut url = reqwest::Url::parse("http://localhost/")
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest("Cannot build endpoint path".to_string()))?
            .clear()
            .extend(segments.iter().map(|segment| segment.trim()));
        Ok(url.path().to_string())
    }

    /// Underlying HTTP client, for requests that must bypass token injection.
    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    // ===== Token / handler state (written by the session manager only) =====

    pub(crate) fn set_token(&self, token: Option<String>) {
        *self.state.token.write() = token;
    }

    pub(crate) fn token(&self) -> Option<String> {
        self.state.token.read().clone()
    }

    /// Install the 401 hook. There is one slot; the last write wins.
    pub(crate) fn set_unauthorized_handler(&self, handler: Option<UnauthorizedHandler>) {
        *self.state.unauthorized.write() = handler;
    }

    /// Clear the 401 hook only if `handler` is still the installed one.
    pub(crate) fn remove_unauthorized_handler(&self, handler: &UnauthorizedHandler) {
        let mut slot = self.state.unauthorized.write();
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, handler)) {
            *slot = None;
        }
    }

    #[cfg(test)]
    pub(crate) fn has_unauthorized_handler(&self) -> bool {
        self.state.unauthorized.read().is_some()
    }

    fn notify_unauthorized(&self) {
        // Clone out of the lock: the handler itself writes transport state.
        let handler = self.state.unauthorized.read().clone();
        if let Some(handler) = handler {
            if panic::catch_unwind(AssertUnwindSafe(|| handler())).is_err() {
                warn!("Unauthorized handler panicked");
            }
        }
    }

    fn inject_token(&self, headers: &mut header::HeaderMap) -> Result<()> {
        if headers.contains_key(header::AUTHORIZATION) {
            return Ok(());
        }
        if let Some(token) = self.token() {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidRequest("Session token is not a valid header value".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(())
    }

    // ===== Request plumbing =====

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Send a request through the transport: token injection, status
    /// checking and the 401 hook all happen here.
    pub(crate) async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let mut request = builder.build()?;
        self.inject_token(request.headers_mut())?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, url = %url, "Sending request");

        let response = self.client.execute(request).await?;
        self.check_response(response, &method, url.as_str()).await
    }

    async fn check_response(
        &self,
        response: Response,
        method: &Method,
        url: &str,
    ) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(%method, url, %status, body = %ApiError::truncate_body(&body), "Request failed");

        if status == StatusCode::UNAUTHORIZED {
            warn!(%method, url, "Request unauthorized, invalidating session");
            self.notify_unauthorized();
        }

        Err(ApiError::from_status(status, &body))
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, path: &str) -> Result<T> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", path, e))
        })
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request(Method::GET, path)).await?;
        Self::parse_json(response, path).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.post_with_timeout(path, body, None).await
    }

    pub(crate) async fn post_with_timeout<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T> {
        let mut builder = self.request(Method::POST, path).json(body);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let response = self.send(builder).await?;
        Self::parse_json(response, path).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::http::HeaderMap;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::test_support::spawn_server;

    fn echo_auth_router() -> Router {
        Router::new().route(
            "/echo",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                Json(json!({ "authorization": auth }))
            }),
        )
    }

    fn unauthorized_router() -> Router {
        Router::new().route(
            "/private",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "Token expired" })),
                )
            }),
        )
    }

    #[test]
    fn test_base_url_trailing_slashes_are_trimmed() {
        let client = ApiClient::new("http://api.test///", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://api.test");
        assert_eq!(client.url("/vehicles"), "http://api.test/vehicles");
        assert_eq!(client.url("vehicles"), "http://api.test/vehicles");
    }

    #[test]
    fn test_empty_base_url_is_rejected() {
        assert!(matches!(
            ApiClient::new(" / ", Duration::from_secs(1)),
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_no_token_means_no_authorization_header() {
        let base = spawn_server(echo_auth_router()).await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

        let body: Value = client.get("/echo").await.unwrap();
        assert_eq!(body["authorization"], Value::Null);
    }

    #[tokio::test]
    async fn test_token_is_injected_as_bearer() {
        let base = spawn_server(echo_auth_router()).await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();
        client.set_token(Some("abc123".to_string()));

        let body: Value = client.get("/echo").await.unwrap();
        assert_eq!(body["authorization"], "Bearer abc123");

        // Clones share the token state
        let clone = client.clone();
        clone.set_token(None);
        let body: Value = client.get("/echo").await.unwrap();
        assert_eq!(body["authorization"], Value::Null);
    }

    #[tokio::test]
    async fn test_caller_supplied_authorization_is_kept() {
        let base = spawn_server(echo_auth_router()).await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();
        client.set_token(Some("session-token".to_string()));

        let builder = client.request(Method::GET, "/echo").bearer_auth("explicit");
        let response = client.send(builder).await.unwrap();
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["authorization"], "Bearer explicit");
    }

    #[tokio::test]
    async fn test_unauthorized_invokes_handler_and_propagates_error() {
        let base = spawn_server(unauthorized_router()).await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        client.set_unauthorized_handler(Some(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })));

        let err = client.get::<Value>("/private").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message(), "Token expired");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_handler_does_not_change_error() {
        let base = spawn_server(unauthorized_router()).await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();
        client.set_unauthorized_handler(Some(Arc::new(|| panic!("handler blew up"))));

        let err = client.get::<Value>("/private").await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_handler_slot_last_write_wins() {
        let base = spawn_server(unauthorized_router()).await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let first_counter = first.clone();
        let second_counter = second.clone();
        let first_handler: UnauthorizedHandler = Arc::new(move || {
            first_counter.fetch_add(1, Ordering::SeqCst);
        });
        client.set_unauthorized_handler(Some(first_handler.clone()));
        client.set_unauthorized_handler(Some(Arc::new(move || {
            second_counter.fetch_add(1, Ordering::SeqCst);
        })));

        // Removing a handler that is no longer installed is a no-op
        client.remove_unauthorized_handler(&first_handler);

        let _ = client.get::<Value>("/private").await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        assert_eq!(ApiClient::endpoint(&["vehicles", " v1 "]).unwrap(), "/vehicles/v1");
        assert_eq!(
            ApiClient::endpoint(&["vehicles", "a/b?c#d", "photo"]).unwrap(),
            "/vehicles/a%2Fb%3Fc%23d/photo"
        );
        assert_eq!(
            ApiClient::endpoint(&["certificates", "50% off"]).unwrap(),
            "/certificates/50%25%20off"
        );
    }

    #[tokio::test]
    async fn test_invalid_json_is_invalid_response() {
        let router = Router::new().route("/broken", get(|| async { "not json" }));
        let base = spawn_server(router).await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client.get::<Value>("/broken").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();
        let err = client.get::<Value>("/anything").await.unwrap_err();
        assert!(matches!(err, ApiError::NetworkError(_)));
        assert!(!err.user_message().is_empty());
    }
}
