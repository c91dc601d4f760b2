//! HTTP transport with bearer credentials and shared session refresh.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::gate::{RefreshGate, Turn};
use crate::request::ApiRequest;
use parking_lot::RwLock;
use reqwest::{Client, Response, StatusCode};
use schoolhouse_session::{BoxedSessionProvider, SessionError};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// HTTP client that keeps requests authenticated across token rotation.
///
/// Every request carries `Authorization: Bearer <token>`. A request answered
/// with 401 is resent once with a fresh token. Concurrent 401s share a single
/// call to [`SessionProvider::refresh_session`](schoolhouse_session::SessionProvider::refresh_session):
/// the first one performs it, the rest wait for its outcome.
///
/// Cloning is cheap; clones share the token and the refresh state.
#[derive(Debug, Clone)]
pub struct AuthClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    client: Client,
    config: ClientConfig,
    sessions: BoxedSessionProvider,
    token: RwLock<Option<String>>,
    gate: RefreshGate,
}

impl AuthClient {
    /// Create a client with its own HTTP client.
    pub fn new(config: ClientConfig, sessions: BoxedSessionProvider) -> ClientResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, config, sessions))
    }

    /// Create with a custom reqwest client.
    pub fn with_client(client: Client, config: ClientConfig, sessions: BoxedSessionProvider) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                config,
                sessions,
                token: RwLock::new(None),
                gate: RefreshGate::default(),
            }),
        }
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get the session provider.
    pub fn sessions(&self) -> &BoxedSessionProvider {
        &self.inner.sessions
    }

    /// Token attached to outgoing requests.
    ///
    /// Seeded from the provider's current session on first use and replaced
    /// by every successful refresh.
    pub fn access_token(&self) -> Option<String> {
        let cached = self.inner.token.read().clone();
        if cached.is_some() {
            return cached;
        }

        let seeded = self.inner.sessions.access_token()?;
        Some(self.inner.token.write().get_or_insert(seeded).clone())
    }

    /// Replace the token used for future requests (e.g. after a new sign-in).
    ///
    /// `None` makes the next request re-read the provider's session.
    pub fn set_access_token(&self, token: Option<String>) {
        *self.inner.token.write() = token;
    }

    /// Whether a session refresh is currently running.
    pub fn is_refreshing(&self) -> bool {
        self.inner.gate.is_refreshing()
    }

    /// Number of requests waiting on the running refresh.
    pub fn pending_waiters(&self) -> usize {
        self.inner.gate.waiting()
    }

    /// Execute a GET request.
    pub async fn get(&self, url: &str) -> ClientResult<Response> {
        self.send(ApiRequest::get(url)).await
    }

    /// Execute a POST request with a JSON body.
    pub async fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> ClientResult<Response> {
        self.send(ApiRequest::post(url).json(body)?).await
    }

    /// Execute a PATCH request with a JSON body.
    pub async fn patch<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> ClientResult<Response> {
        self.send(ApiRequest::patch(url).json(body)?).await
    }

    /// Execute a DELETE request.
    pub async fn delete(&self, url: &str) -> ClientResult<Response> {
        self.send(ApiRequest::delete(url)).await
    }

    /// Send a request with the current token, refreshing and resending once on 401.
    pub async fn send(&self, request: ApiRequest) -> ClientResult<Response> {
        let token = self.access_token();
        let response = self.dispatch(&request, token.as_deref()).await?;
        self.intercept(request, response).await
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> ClientResult<Response> {
        debug!(
            method = %request.method(),
            url = %request.url(),
            retried = request.is_retried(),
            authenticated = token.is_some(),
            "Sending request"
        );

        let response = request
            .build(
                &self.inner.client,
                token,
                self.inner.config.api_key.as_deref(),
            )
            .send()
            .await?;
        Ok(response)
    }

    async fn intercept(&self, mut request: ApiRequest, response: Response) -> ClientResult<Response> {
        if response.status() != StatusCode::UNAUTHORIZED || request.is_retried() {
            return check_response(response).await;
        }

        request.mark_retried();
        let token = self.refreshed_token().await?;

        // Retried requests pass straight through: a second 401 is final.
        let response = self.dispatch(&request, Some(&token)).await?;
        check_response(response).await
    }

    /// Obtain a fresh token, sharing one refresh among all concurrent callers.
    async fn refreshed_token(&self) -> Result<String, SessionError> {
        let lease = match self.inner.gate.enter() {
            Turn::Wait(waiter) => {
                debug!("Refresh already running, waiting for it");
                return waiter.await.unwrap_or(Err(SessionError::Interrupted));
            }
            Turn::Lead(lease) => lease,
        };

        debug!("Refreshing session after 401");
        let outcome = match self.inner.sessions.refresh_session().await {
            Ok(Some(session)) if session.has_access_token() => Ok(session.access_token),
            Ok(_) => Err(SessionError::MissingAccessToken),
            Err(err) => Err(err),
        };

        match &outcome {
            Ok(token) => *self.inner.token.write() = Some(token.clone()),
            Err(err) => warn!(error = %err, "Session refresh failed"),
        }

        let released = lease.settle(&outcome);
        if outcome.is_ok() {
            info!(waiters = released, "Session refreshed");
        }
        outcome
    }
}

/// Turn a non-success response into a `ClientError::Http`.
async fn check_response(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Http {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{config_for, ScriptedProvider};
    use pretty_assertions::assert_eq;
    use schoolhouse_session::Session;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const NOTICES: &str = "/rest/v1/notices";

    fn client(server: &MockServer, provider: &Arc<ScriptedProvider>) -> AuthClient {
        AuthClient::new(config_for(server), provider.clone()).unwrap()
    }

    fn url(server: &MockServer) -> String {
        format!("{}{}", server.uri(), NOTICES)
    }

    /// 200 for `Bearer tok2`, 401 for anything else.
    async fn mount_rotating_api(server: &MockServer, accepted: u64, rejected: u64) {
        Mock::given(method("GET"))
            .and(path(NOTICES))
            .and(header("authorization", "Bearer tok2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .with_priority(1)
            .expect(accepted)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(NOTICES))
            .respond_with(ResponseTemplate::new(401).set_body_string("JWT expired"))
            .with_priority(2)
            .expect(rejected)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_attaches_current_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(NOTICES))
            .and(header("authorization", "Bearer tok1"))
            .and(header("apikey", "anon"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let provider = Arc::new(ScriptedProvider::rotating());
        let client = client(&server, &provider);

        client.get(&url(&server)).await.unwrap();
        assert_eq!(provider.refresh_calls(), 0);
        assert_eq!(client.access_token().as_deref(), Some("tok1"));
    }

    #[tokio::test]
    async fn test_refreshes_and_retries_on_401() {
        let server = MockServer::start().await;
        mount_rotating_api(&server, 1, 1).await;

        let provider = Arc::new(ScriptedProvider::rotating());
        let client = client(&server, &provider);

        let response = client.get(&url(&server)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(provider.refresh_calls(), 1);
        assert_eq!(client.access_token().as_deref(), Some("tok2"));
        assert!(!client.is_refreshing());
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let server = MockServer::start().await;
        mount_rotating_api(&server, 2, 2).await;

        let provider = Arc::new(
            ScriptedProvider::rotating().with_delay(Duration::from_millis(200)),
        );
        let client = client(&server, &provider);

        let target = url(&server);
        let (a, b) = tokio::join!(client.get(&target), client.get(&target));

        assert_eq!(a.unwrap().status(), StatusCode::OK);
        assert_eq!(b.unwrap().status(), StatusCode::OK);
        assert_eq!(provider.refresh_calls(), 1);
        assert_eq!(client.pending_waiters(), 0);
    }

    #[tokio::test]
    async fn test_refresh_failure_reaches_every_caller() {
        let server = MockServer::start().await;
        mount_rotating_api(&server, 0, 2).await;

        let err = SessionError::rejected(400, "refresh token revoked");
        let provider = Arc::new(
            ScriptedProvider::new(Some(Session::new("tok1", "ref1")), Err(err.clone()))
                .with_delay(Duration::from_millis(200)),
        );
        let client = client(&server, &provider);

        let target = url(&server);
        let (a, b) = tokio::join!(client.get(&target), client.get(&target));

        for result in [a, b] {
            match result.unwrap_err() {
                ClientError::Refresh(e) => assert_eq!(e, err),
                other => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(provider.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_flag_cleared_after_failed_refresh() {
        let server = MockServer::start().await;
        mount_rotating_api(&server, 0, 2).await;

        let provider = Arc::new(ScriptedProvider::new(
            Some(Session::new("tok1", "ref1")),
            Err(SessionError::rejected(400, "invalid_grant")),
        ));
        let client = client(&server, &provider);

        let first = client.get(&url(&server)).await.unwrap_err();
        assert!(first.is_auth_failure());
        assert!(!client.is_refreshing());

        // A later 401 starts a new refresh episode.
        let second = client.get(&url(&server)).await.unwrap_err();
        assert!(matches!(second, ClientError::Refresh(_)));
        assert_eq!(provider.refresh_calls(), 2);
    }

    #[tokio::test]
    async fn test_second_401_is_final() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(NOTICES))
            .respond_with(ResponseTemplate::new(401).set_body_string("JWT invalid"))
            .expect(2)
            .mount(&server)
            .await;

        let provider = Arc::new(ScriptedProvider::rotating());
        let client = client(&server, &provider);

        let err = client.get(&url(&server)).await.unwrap_err();

        assert!(err.is_unauthorized());
        assert!(matches!(err, ClientError::Http { status: 401, ref body } if body == "JWT invalid"));
        assert_eq!(provider.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_waiters_retry_only_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(NOTICES))
            .respond_with(ResponseTemplate::new(401))
            .expect(4)
            .mount(&server)
            .await;

        let provider = Arc::new(
            ScriptedProvider::rotating().with_delay(Duration::from_millis(200)),
        );
        let client = client(&server, &provider);

        let target = url(&server);
        let (a, b) = tokio::join!(client.get(&target), client.get(&target));

        for result in [a, b] {
            assert!(matches!(result.unwrap_err(), ClientError::Http { status: 401, .. }));
        }
        assert_eq!(provider.refresh_calls(), 1);
        assert!(!client.is_refreshing());
    }

    #[tokio::test]
    async fn test_retried_request_is_not_refreshed() {
        let server = MockServer::start().await;
        mount_rotating_api(&server, 0, 1).await;

        let provider = Arc::new(ScriptedProvider::rotating());
        let client = client(&server, &provider);

        let mut request = ApiRequest::get(url(&server));
        request.mark_retried();
        let err = client.send(request).await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(provider.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_other_failures_pass_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(NOTICES))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let provider = Arc::new(ScriptedProvider::rotating());
        let client = client(&server, &provider);

        let err = client.get(&url(&server)).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(provider.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_without_token_fails() {
        let server = MockServer::start().await;
        mount_rotating_api(&server, 0, 2).await;

        for outcome in [Ok(None), Ok(Some(Session::new("", "ref2")))] {
            let provider = Arc::new(ScriptedProvider::new(
                Some(Session::new("tok1", "ref1")),
                outcome,
            ));
            let client = client(&server, &provider);

            let err = client.get(&url(&server)).await.unwrap_err();
            assert!(matches!(
                err,
                ClientError::Refresh(SessionError::MissingAccessToken)
            ));
            assert_eq!(client.access_token().as_deref(), Some("tok1"));
        }
    }

    #[tokio::test]
    async fn test_refreshed_token_used_by_later_requests() {
        let server = MockServer::start().await;
        mount_rotating_api(&server, 2, 1).await;

        let provider = Arc::new(ScriptedProvider::rotating());
        let client = client(&server, &provider);

        client.get(&url(&server)).await.unwrap();
        client.get(&url(&server)).await.unwrap();

        assert_eq!(provider.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_unauthenticated_request_refreshes() {
        let server = MockServer::start().await;
        mount_rotating_api(&server, 1, 1).await;

        let provider = Arc::new(ScriptedProvider::new(
            None,
            Ok(Some(Session::new("tok2", "ref2"))),
        ));
        let client = client(&server, &provider);
        assert_eq!(client.access_token(), None);

        client.get(&url(&server)).await.unwrap();
        assert_eq!(client.access_token().as_deref(), Some("tok2"));
    }

    #[tokio::test]
    async fn test_post_body_is_resent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(NOTICES))
            .and(header("authorization", "Bearer tok2"))
            .and(wiremock::matchers::body_json(json!({"title": "Holiday"})))
            .respond_with(ResponseTemplate::new(201))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(NOTICES))
            .respond_with(ResponseTemplate::new(401))
            .with_priority(2)
            .expect(1)
            .mount(&server)
            .await;

        let provider = Arc::new(ScriptedProvider::rotating());
        let client = client(&server, &provider);

        let response = client
            .post(&url(&server), &json!({"title": "Holiday"}))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
