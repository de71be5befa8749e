//! Thin client for the search service REST API.
//!
//! One `SearchClient` per service (source or target). Every request carries
//! the `api-key` header and an `api-version` query parameter. There are no
//! retries: each operation is a single request/response exchange, and any
//! non-success status surfaces as an error.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::schema::IndexDefinition;

/// A document: an ordered mapping from field name to opaque JSON value.
///
/// Field values are never inspected or converted; order is preserved so
/// uploads read like the source service's responses.
pub type Document = serde_json::Map<String, serde_json::Value>;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Batch action kinds understood by the documents endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IndexActionType {
    /// Insert, or fully replace an existing document.
    Upload,
    /// Update fields of an existing document; fails if it is absent.
    Merge,
    /// Update fields, inserting the document if it is absent.
    MergeOrUpload,
    /// Remove the document.
    Delete,
}

/// One pending document operation in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct IndexAction {
    /// What to do with the document.
    #[serde(rename = "@search.action")]
    pub action: IndexActionType,
    /// The document fields, flattened next to the action marker.
    #[serde(flatten)]
    pub document: Document,
}

impl IndexAction {
    /// Wraps a document in an upload action.
    #[must_use]
    pub fn upload(document: Document) -> Self {
        Self {
            action: IndexActionType::Upload,
            document,
        }
    }
}

/// A list of pending document actions, submitted in one request.
#[derive(Debug, Clone, Serialize)]
pub struct IndexBatch {
    /// Actions in submission order.
    pub value: Vec<IndexAction>,
}

/// Wildcard search request with paging parameters.
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    search: &'a str,
    top: usize,
    skip: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    value: Vec<Document>,
}

/// Client for one search service.
pub struct SearchClient {
    http: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
}

impl SearchClient {
    /// Creates a client for the configured service.
    ///
    /// # Errors
    ///
    /// Returns an error if the service endpoint cannot be resolved.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            http: create_http_client(),
            endpoint: config.endpoint_url()?,
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
        })
    }

    /// Base URL this client talks to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}?api-version={}", self.endpoint, path, self.api_version)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http.request(method, url).header("api-key", &self.api_key)
    }

    /// Maps non-success statuses to errors, recovering the body for context.
    async fn check(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(handle_http_error(status.as_u16(), body, &self.endpoint))
    }

    /// Fetches an index definition. The index must exist.
    pub async fn get_index(&self, name: &str) -> Result<IndexDefinition> {
        let url = self.url(&format!("indexes/{name}"));
        let response = self.request(Method::GET, &url).send().await?;
        let response = self.check(response).await?;
        response
            .json()
            .await
            .map_err(|e| Error::Decode(format!("index definition: {e}")))
    }

    /// Fetches an index definition, mapping 404 to `None`.
    pub async fn get_index_if_exists(&self, name: &str) -> Result<Option<IndexDefinition>> {
        let url = self.url(&format!("indexes/{name}"));
        let response = self.request(Method::GET, &url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = self.check(response).await?;
        let index = response
            .json()
            .await
            .map_err(|e| Error::Decode(format!("index definition: {e}")))?;
        Ok(Some(index))
    }

    /// Deletes an index and everything in it.
    pub async fn delete_index(&self, name: &str) -> Result<()> {
        let url = self.url(&format!("indexes/{name}"));
        let response = self.request(Method::DELETE, &url).send().await?;
        self.check(response).await?;
        Ok(())
    }

    /// Creates an index from a definition.
    pub async fn create_index(&self, index: &IndexDefinition) -> Result<()> {
        let url = self.url("indexes");
        let response = self.request(Method::POST, &url).json(index).send().await?;
        self.check(response).await?;
        Ok(())
    }

    /// Returns the number of documents in an index.
    ///
    /// The `$count` endpoint answers with a plain-text integer, sometimes
    /// prefixed with a UTF-8 BOM.
    pub async fn count_documents(&self, index: &str) -> Result<u64> {
        let url = self.url(&format!("indexes/{index}/docs/$count"));
        let response = self.request(Method::GET, &url).send().await?;
        let response = self.check(response).await?;
        let body = response.text().await?;
        parse_count(&body)
    }

    /// Fetches one page of documents with a wildcard search.
    pub async fn search_page(&self, index: &str, skip: u64, top: usize) -> Result<Vec<Document>> {
        let url = self.url(&format!("indexes/{index}/docs/search"));
        let body = SearchRequest { search: "*", top, skip };
        let response = self.request(Method::POST, &url).json(&body).send().await?;
        let response = self.check(response).await?;
        let page: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Decode(format!("search response: {e}")))?;
        Ok(page.value)
    }

    /// Submits a batch of document actions to an index.
    pub async fn upload_batch(&self, index: &str, batch: &IndexBatch) -> Result<()> {
        let url = self.url(&format!("indexes/{index}/docs/index"));
        let response = self.request(Method::POST, &url).json(batch).send().await?;
        self.check(response).await?;
        Ok(())
    }
}

fn create_http_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Maps a non-success status to the matching error variant.
fn handle_http_error(status: u16, body: String, endpoint: &str) -> Error {
    match status {
        401 | 403 => Error::Authentication(format!("{}: {}", endpoint, body)),
        _ => Error::Service { status, body },
    }
}

/// Parses the `$count` endpoint's plain-text body, tolerating a BOM.
fn parse_count(body: &str) -> Result<u64> {
    let trimmed = body.trim_start_matches('\u{feff}').trim();
    trimmed
        .parse()
        .map_err(|_| Error::Decode(format!("document count: '{trimmed}' is not a number")))
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
