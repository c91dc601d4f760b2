//! Outbound request description.

use crate::error::ClientResult;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder};
use schoolhouse_session::API_KEY_HEADER;
use serde::Serialize;

/// A request that [`AuthClient`](crate::AuthClient) can send and, once, resend.
///
/// The `Authorization` header is owned by the client; any value set here is
/// replaced with the current bearer token at dispatch time.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    url: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    retried: bool,
}

impl ApiRequest {
    /// Create a request.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    /// Create a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Create a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Create a PATCH request.
    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    /// Create a DELETE request.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a query pair.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ClientResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Target URL without the query string.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Query pairs.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// JSON body, if any.
    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Whether this request has already been resent after a 401.
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }

    pub(crate) fn build(
        &self,
        client: &Client,
        token: Option<&str>,
        api_key: Option<&str>,
    ) -> RequestBuilder {
        let mut headers = self.headers.clone();
        headers.remove(AUTHORIZATION);

        let mut builder = client.request(self.method.clone(), &self.url).headers(headers);
        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }
        if let Some(key) = api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &self.body {
            builder = builder.json(body);
        }
        builder
    }
}
