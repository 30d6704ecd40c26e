//! The remote collection contract and its HTTP implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{DirectoryError, Result};
use crate::query::RemoteQuery;
use crate::types::{Incident, IncidentPage, Page, Pagination};

/// A paginated, filterable, read-only record collection.
///
/// Implementations must return records in the order given by the query's
/// sort keys and report pagination metadata for the requested window.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    async fn fetch(&self, query: &RemoteQuery) -> Result<IncidentPage>;
}

#[async_trait]
impl<T: RemoteCollection + ?Sized> RemoteCollection for Arc<T> {
    async fn fetch(&self, query: &RemoteQuery) -> Result<IncidentPage> {
        (**self).fetch(query).await
    }
}

/// Connection settings for a Strapi REST collection.
#[derive(Debug, Clone)]
pub struct StrapiConfig {
    /// Origin of the content repository, e.g. `https://cms.example.org`.
    pub base_url: String,
    /// Plural collection name, e.g. `the-wall-of-shames`.
    pub collection: String,
    /// Per-request timeout. `None` leaves it to the transport.
    pub timeout: Option<Duration>,
}

impl StrapiConfig {
    pub fn new(base_url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            collection: collection.into(),
            timeout: None,
        }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/api/{}",
            self.base_url.trim_end_matches('/'),
            self.collection.trim_matches('/')
        )
    }
}

/// [`RemoteCollection`] backed by a Strapi REST endpoint.
///
/// Requests are never retried; any transport error, non-success status or
/// undecodable body surfaces as an error.
#[derive(Debug, Clone)]
pub struct StrapiClient {
    http: reqwest::Client,
    endpoint: String,
}

impl StrapiClient {
    pub fn new(config: &StrapiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, config))
    }

    pub fn with_client(http: reqwest::Client, config: &StrapiConfig) -> Self {
        Self {
            http,
            endpoint: config.endpoint(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteCollection for StrapiClient {
    async fn fetch(&self, query: &RemoteQuery) -> Result<IncidentPage> {
        let params = query.to_params();
        debug!(endpoint = %self.endpoint, locale = %query.locale, page = ?query.page, "fetching");

        let response = self.http.get(&self.endpoint).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let url = response.url().to_string();
            warn!(status = status.as_u16(), %url, "remote returned an error status");
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        decode_page(&body)
    }
}

#[derive(Deserialize)]
struct Envelope {
    data: Vec<Incident>,
    #[serde(default)]
    meta: Meta,
}

#[derive(Default, Deserialize)]
struct Meta {
    #[serde(default)]
    pagination: Pagination,
}

/// Decodes a `{ data: [...], meta: { pagination } }` response body.
pub fn decode_page(body: &[u8]) -> Result<IncidentPage> {
    let envelope: Envelope = serde_json::from_slice(body)?;
    Ok(Page {
        items: envelope.data,
        pagination: envelope.meta.pagination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_cleanly() {
        let config = StrapiConfig::new("https://cms.example.org/", "/the-wall-of-shames");
        assert_eq!(
            config.endpoint(),
            "https://cms.example.org/api/the-wall-of-shames"
        );
        let client = StrapiClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), config.endpoint());
    }

    #[test]
    fn test_decode_page() {
        let body = br#"{
            "data": [
                {"id": 1, "slug": "a", "incident_date": "2024-03-01"},
                {"id": 2, "slug": "b", "incident_date": "2024-02-01"}
            ],
            "meta": {"pagination": {"page": 1, "pageSize": 2, "pageCount": 5, "total": 9}}
        }"#;
        let page = decode_page(body).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].slug, "b");
        assert_eq!(page.pagination.page_count, 5);
        assert_eq!(page.pagination.total, 9);
    }

    #[test]
    fn test_decode_rejects_non_json() {
        let err = decode_page(b"<html>Bad gateway</html>").unwrap_err();
        assert_eq!(err.error_code(), "malformed_response");
    }

    #[test]
    fn test_decode_rejects_missing_data() {
        let err = decode_page(br#"{"error": {"status": 404}}"#).unwrap_err();
        assert!(matches!(err, DirectoryError::Decode(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let client = StrapiClient::new(&StrapiConfig::new("http://127.0.0.1:1", "items")).unwrap();
        let err = client.fetch(&RemoteQuery::new("fr-CH")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Transport(_)));
        assert!(!err.is_validation());
    }
}
