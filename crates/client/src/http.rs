use crate::activity::ActivityTracker;
use crate::navigate::Navigator;
use crate::refresh::RefreshCoordinator;
use crate::token_store::{TokenStorage, TokenStore};
use bytes::Bytes;
use common::{ApiError, ApiResult, ClientConfig, Clock};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

type FormFactory = Arc<dyn Fn() -> Form + Send + Sync>;

/// Query-string pairs with the blank-value filtering the backend expects:
/// `None` and empty values are dropped instead of serialized as
/// `key=undefined`.
#[derive(Debug, Default, Clone)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: Option<impl ToString>) -> Self {
        if let Some(value) = value {
            let value = value.to_string();
            if !value.is_empty() {
                self.0.push((key.to_string(), value));
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

/// Per-request configuration for the executor.
#[derive(Clone)]
pub struct RequestOptions {
    method: Method,
    body: Option<Value>,
    form: Option<FormFactory>,
    query: QueryParams,
    auth: bool,
}

impl RequestOptions {
    fn with_method(method: Method) -> Self {
        Self {
            method,
            body: None,
            form: None,
            query: QueryParams::new(),
            auth: true,
        }
    }

    pub fn get() -> Self {
        Self::with_method(Method::GET)
    }

    pub fn post() -> Self {
        Self::with_method(Method::POST)
    }

    pub fn put() -> Self {
        Self::with_method(Method::PUT)
    }

    pub fn patch() -> Self {
        Self::with_method(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::with_method(Method::DELETE)
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Multipart uploads take a factory rather than a form: a form can
    /// only be sent once, and the 401 retry path must be able to rebuild
    /// the identical request.
    pub fn with_form(mut self, factory: impl Fn() -> Form + Send + Sync + 'static) -> Self {
        self.form = Some(Arc::new(factory));
        self
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    pub fn unauthenticated(mut self) -> Self {
        self.auth = false;
        self
    }
}

impl std::fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestOptions")
            .field("method", &self.method)
            .field("auth", &self.auth)
            .field("has_body", &self.body.is_some())
            .field("has_form", &self.form.is_some())
            .finish()
    }
}

/// The single chokepoint for backend communication.
///
/// Every call goes through `send`: activity is stamped, headers are
/// built, and a 401 on an authenticated call triggers exactly one
/// transparent refresh-and-retry before the session is declared dead.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
    activity: Arc<ActivityTracker>,
    refresh: RefreshCoordinator,
    navigator: Arc<dyn Navigator>,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        storage: Arc<dyn TokenStorage>,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
    ) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        let tokens = TokenStore::new(storage, clock);
        let activity = Arc::new(ActivityTracker::new(tokens.clone(), &config.session));
        let refresh =
            RefreshCoordinator::new(http.clone(), config.base_url.clone(), tokens.clone());
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            tokens,
            activity,
            refresh,
            navigator,
            config,
        })
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn activity(&self) -> &Arc<ActivityTracker> {
        &self.activity
    }

    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start the session background tasks: the inactivity watchdog and
    /// the proactive token refresh. The returned guard owns both.
    pub fn start_session_tasks(&self) -> SessionTasks {
        SessionTasks {
            inactivity: self
                .activity
                .spawn_inactivity_watch(&self.config.session, Arc::clone(&self.navigator)),
            proactive: self.refresh.spawn_proactive(&self.config.session),
        }
    }

    fn build(&self, path: &str, opts: &RequestOptions) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(opts.method.clone(), &url);
        if !opts.query.is_empty() {
            req = req.query(opts.query.pairs());
        }
        match &opts.form {
            Some(factory) => {
                // Content type is left to reqwest so the multipart
                // boundary is generated correctly.
                req = req.multipart(factory());
            }
            None => {
                req = req.header(CONTENT_TYPE, "application/json");
                if let Some(body) = &opts.body {
                    req = req.json(body);
                }
            }
        }
        if opts.auth {
            if let Some(token) = self.tokens.access_token() {
                req = req.bearer_auth(token);
            }
        }
        req
    }

    /// Issue the request, recovering from an expired token at most once.
    async fn send(&self, path: &str, opts: &RequestOptions) -> ApiResult<reqwest::Response> {
        if opts.auth {
            // Outbound API traffic counts as user activity.
            self.activity.touch();
        }
        let response = self.build(path, opts).send().await?;
        if response.status().as_u16() != 401 || !opts.auth {
            return Ok(response);
        }

        debug!("401 on {path}, attempting token refresh");
        if self.refresh.refresh().await {
            // Headers are rebuilt, so the retry carries the new token.
            return Ok(self.build(path, opts).send().await?);
        }

        warn!("token refresh failed, terminating session");
        if let Err(e) = self.tokens.clear_tokens() {
            warn!("failed to clear tokens for expired session: {e}");
        }
        self.tokens.clear_user();
        self.navigator.redirect_to_login();
        Err(ApiError::SessionExpired)
    }

    /// JSON request path: parse the body leniently (an unparseable 2xx
    /// body reads as null), map non-2xx to a structured error.
    pub async fn request_value(&self, path: &str, opts: RequestOptions) -> ApiResult<Value> {
        let response = self.send(path, &opts).await?;
        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), body));
        }
        Ok(body)
    }

    pub async fn request_json<T: DeserializeOwned>(
        &self,
        path: &str,
        opts: RequestOptions,
    ) -> ApiResult<T> {
        let value = self.request_value(path, opts).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Binary request path (Excel exports, receipts): the payload comes
    /// back as opaque bytes, but error bodies are still read as JSON so
    /// the diagnostic message survives.
    pub async fn request_bytes(&self, path: &str, opts: RequestOptions) -> ApiResult<Bytes> {
        let response = self.send(path, &opts).await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
            return Err(ApiError::from_response(status.as_u16(), body));
        }
        Ok(response.bytes().await?)
    }
}

/// Guard owning the session background tasks; both are cancelled when it
/// is dropped or stopped, never one without the other.
#[derive(Debug)]
pub struct SessionTasks {
    inactivity: crate::activity::InactivityWatch,
    proactive: crate::refresh::ProactiveRefresh,
}

impl SessionTasks {
    pub fn stop(&self) {
        self.inactivity.stop();
        self.proactive.stop();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::navigate::NoopNavigator;
    use crate::token_store::MemoryTokenStorage;
    use common::SystemClock;

    pub(crate) fn client_for(url: String) -> ApiClient {
        let config = ClientConfig::default().with_base_url(url);
        ApiClient::new(
            config,
            Arc::new(MemoryTokenStorage::new()),
            Arc::new(NoopNavigator),
            Arc::new(SystemClock),
        )
        .unwrap()
    }

    #[test]
    fn query_params_drop_blank_values() {
        let params = QueryParams::new()
            .set("page", Some(2))
            .set("search", Some(""))
            .set("group_id", None::<i64>);
        assert_eq!(params.pairs(), &[("page".to_string(), "2".to_string())]);
    }

    #[tokio::test]
    async fn ok_response_parses_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/ping")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;

        let client = client_for(server.url());
        let value = client
            .request_value("/ping", RequestOptions::get().unauthenticated())
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_2xx_maps_to_structured_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body(r#"{"detail": "no such group"}"#)
            .create_async()
            .await;

        let client = client_for(server.url());
        let err = client
            .request_value("/missing", RequestOptions::get().unauthenticated())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP 404: no such group");
    }

    #[tokio::test]
    async fn binary_error_body_still_reads_as_json() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/export")
            .with_status(403)
            .with_body(r#"{"detail": "leaders cannot export"}"#)
            .create_async()
            .await;

        let client = client_for(server.url());
        let err = client
            .request_bytes("/export", RequestOptions::get().unauthenticated())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP 403: leaders cannot export");
    }

    #[tokio::test]
    async fn binary_success_returns_raw_bytes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/export")
            .with_status(200)
            .with_header("content-type", "application/vnd.ms-excel")
            .with_body(&[0x50u8, 0x4b, 0x03, 0x04][..])
            .create_async()
            .await;

        let client = client_for(server.url());
        let bytes = client
            .request_bytes("/export", RequestOptions::get().unauthenticated())
            .await
            .unwrap();
        assert_eq!(&bytes[..], &[0x50, 0x4b, 0x03, 0x04]);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_request_retried_once() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/groups")
            .match_header("authorization", "Bearer stale")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/auth/refresh")
            .with_status(200)
            .with_body(r#"{"access_token": "fresh", "refresh_token": "fresh-r"}"#)
            .expect(1)
            .create_async()
            .await;
        let retry = server
            .mock("GET", "/groups")
            .match_header("authorization", "Bearer fresh")
            .with_status(200)
            .with_body(r#"[]"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(server.url());
        client.tokens().set_tokens("stale", "stale-r").unwrap();

        let value = client
            .request_value("/groups", RequestOptions::get())
            .await
            .unwrap();
        assert_eq!(value, serde_json::json!([]));
        assert_eq!(client.tokens().access_token().as_deref(), Some("fresh"));

        first.assert_async().await;
        refresh.assert_async().await;
        retry.assert_async().await;
    }

    #[tokio::test]
    async fn failed_refresh_terminates_the_session() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/groups")
            .with_status(401)
            .create_async()
            .await;
        server
            .mock("POST", "/auth/refresh")
            .with_status(401)
            .create_async()
            .await;

        let client = client_for(server.url());
        client.tokens().set_tokens("stale", "stale-r").unwrap();

        let err = client
            .request_value("/groups", RequestOptions::get())
            .await
            .unwrap_err();
        assert!(err.is_session_expired());
        assert!(client.tokens().access_token().is_none());
        assert!(client.tokens().refresh_token().is_none());
    }

    #[tokio::test]
    async fn unauthenticated_401_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let login = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"detail": "Invalid credentials"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(server.url());
        let err = client
            .request_value(
                "/auth/login",
                RequestOptions::post()
                    .unauthenticated()
                    .with_json(serde_json::json!({"login": "x", "password": "y"})),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        login.assert_async().await;
    }
}
