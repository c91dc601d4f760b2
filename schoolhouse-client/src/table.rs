//! Table access over the PostgREST-style data API.
//!
//! Every call goes through [`AuthClient::send`], so table reads and writes
//! get the same refresh-and-retry behavior as any other request.

use crate::error::{ClientError, ClientResult};
use crate::request::ApiRequest;
use crate::transport::AuthClient;
use reqwest::header::{HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;

/// Ask the data API to answer writes with the affected rows.
fn return_representation(request: ApiRequest) -> ApiRequest {
    request.header(
        HeaderName::from_static("prefer"),
        HeaderValue::from_static("return=representation"),
    )
}

impl AuthClient {
    /// Start a query against a table, e.g. `client.table("notices")`.
    pub fn table(&self, name: impl Into<String>) -> Table<'_> {
        Table {
            client: self,
            name: name.into(),
            columns: None,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }
}

/// Query builder for one table.
#[derive(Debug, Clone)]
pub struct Table<'a> {
    client: &'a AuthClient,
    name: String,
    columns: Option<String>,
    filters: Vec<(String, String)>,
    order: Option<String>,
    limit: Option<usize>,
}

impl Table<'_> {
    /// Columns to return (defaults to all).
    #[must_use]
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    /// Keep rows where `column` equals `value`.
    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: impl Display) -> Self {
        self.filters.push((column.into(), format!("eq.{value}")));
        self
    }

    /// Sort by `column`.
    #[must_use]
    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order = Some(format!("{}.{}", column.into(), direction));
        self
    }

    /// Return at most `n` rows.
    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Read matching rows.
    pub async fn fetch<T: DeserializeOwned>(&self) -> ClientResult<Vec<T>> {
        let mut request = self.with_filters(ApiRequest::get(self.url()));
        request = request.query("select", self.columns.as_deref().unwrap_or("*"));
        if let Some(order) = &self.order {
            request = request.query("order", order.as_str());
        }
        if let Some(limit) = self.limit {
            request = request.query("limit", limit.to_string());
        }

        let response = self.client.send(request).await?;
        Ok(response.json().await?)
    }

    /// Insert one row and return what was stored.
    pub async fn insert<B, T>(&self, row: &B) -> ClientResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = return_representation(ApiRequest::post(self.url())).json(row)?;

        let response = self.client.send(request).await?;
        Ok(response.json().await?)
    }

    /// Apply `patch` to matching rows and return them.
    pub async fn update<B, T>(&self, patch: &B) -> ClientResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.require_filter("update")?;
        let request =
            return_representation(self.with_filters(ApiRequest::patch(self.url()))).json(patch)?;

        let response = self.client.send(request).await?;
        Ok(response.json().await?)
    }

    /// Delete matching rows.
    pub async fn delete(&self) -> ClientResult<()> {
        self.require_filter("delete")?;
        let request = self.with_filters(ApiRequest::delete(self.url()));
        self.client.send(request).await?;
        Ok(())
    }

    fn url(&self) -> String {
        format!("{}/{}", self.client.config().rest_url(), self.name)
    }

    fn with_filters(&self, request: ApiRequest) -> ApiRequest {
        self.filters
            .iter()
            .fold(request, |request, (column, value)| {
                request.query(column.as_str(), value.as_str())
            })
    }

    fn require_filter(&self, operation: &str) -> ClientResult<()> {
        if self.filters.is_empty() {
            return Err(ClientError::InvalidRequest(format!(
                "refusing to {operation} every row of {}",
                self.name
            )));
        }
        Ok(())
    }
}
