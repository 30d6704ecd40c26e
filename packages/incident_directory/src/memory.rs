//! In-memory [`RemoteCollection`] over a fixed record set.
//!
//! Behaves like the remote API (locale scoping, filter evaluation, sort,
//! page-size cap, pagination metadata) and records every query it receives.
//! Used for fixtures, offline runs and tests.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError, RwLock};

use crate::error::{DirectoryError, Result};
use crate::query::{MAX_PAGE_SIZE, PageRequest, RemoteQuery, compare_by};
use crate::remote::RemoteCollection;
use crate::types::{Incident, IncidentPage, Page, Pagination};

pub struct InMemoryCollection {
    records: RwLock<Vec<Incident>>,
    page_cap: u32,
    requests: Mutex<Vec<RemoteQuery>>,
    fail_on_request: Option<usize>,
}

impl InMemoryCollection {
    pub fn new(records: Vec<Incident>) -> Self {
        Self {
            records: RwLock::new(records),
            page_cap: MAX_PAGE_SIZE,
            requests: Mutex::new(Vec::new()),
            fail_on_request: None,
        }
    }

    /// Largest page the collection serves; bigger requests are silently capped.
    pub fn with_page_cap(mut self, page_cap: u32) -> Self {
        self.page_cap = page_cap.max(1);
        self
    }

    /// Makes the n-th request (1-based) fail with a remote error.
    pub fn fail_on_request(mut self, n: usize) -> Self {
        self.fail_on_request = Some(n);
        self
    }

    /// Every query received so far, in arrival order.
    pub fn requests(&self) -> Vec<RemoteQuery> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn clear_requests(&self) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Swaps the record set, as if the remote repository had been edited.
    pub fn replace_records(&self, records: Vec<Incident>) {
        *self.records.write().unwrap_or_else(PoisonError::into_inner) = records;
    }

    fn matching(&self, query: &RemoteQuery) -> Vec<Incident> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut matched: Vec<Incident> = records
            .iter()
            .filter(|r| r.locale.as_deref().is_none_or(|l| l == query.locale))
            .filter(|r| query.filter.as_ref().is_none_or(|f| f.matches(r)))
            .cloned()
            .collect();
        matched.sort_by(|a, b| compare_by(&query.sort, a, b));
        matched
    }
}

#[async_trait]
impl RemoteCollection for InMemoryCollection {
    async fn fetch(&self, query: &RemoteQuery) -> Result<IncidentPage> {
        let n = {
            let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
            requests.push(query.clone());
            requests.len()
        };
        if self.fail_on_request == Some(n) {
            return Err(DirectoryError::Remote(format!("request {n} failed")));
        }

        let matched = self.matching(query);
        let total = matched.len() as u64;

        let page = match query.page {
            PageRequest::Page { page, size } => {
                let size = size.clamp(1, self.page_cap);
                let start = (page.max(1) as usize - 1) * size as usize;
                Page {
                    items: matched.into_iter().skip(start).take(size as usize).collect(),
                    pagination: Pagination::for_page(page, size, total),
                }
            }
            PageRequest::Offset { start, limit } => {
                let limit = limit.clamp(1, self.page_cap);
                Page {
                    items: matched
                        .into_iter()
                        .skip(start as usize)
                        .take(limit as usize)
                        .collect(),
                    pagination: Pagination {
                        total,
                        start: Some(start),
                        limit: Some(limit as u64),
                        ..Default::default()
                    },
                }
            }
        };
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Field, Filter};
    use crate::test_helpers::{fixture, incident};

    #[tokio::test]
    async fn test_page_window_and_meta() {
        let collection = InMemoryCollection::new(fixture(7)).with_page_cap(3);
        let page = collection
            .fetch(&RemoteQuery::new("fr-CH").with_page(3, 50))
            .await
            .unwrap();
        assert_eq!(page.pagination.page_size, 3);
        assert_eq!(page.pagination.page_count, 3);
        assert_eq!(page.pagination.total, 7);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].slug, "r7");
    }

    #[tokio::test]
    async fn test_offset_window() {
        let collection = InMemoryCollection::new(fixture(5));
        let page = collection
            .fetch(&RemoteQuery::new("fr-CH").with_offset(2, 1))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].slug, "r3");
        assert_eq!(page.pagination.start, Some(2));
        assert_eq!(page.pagination.total, 5);
    }

    #[tokio::test]
    async fn test_locale_scoping_and_filter() {
        let mut records = fixture(3);
        records.push(incident("de-1", "de-CH", "2024-01-01", "x"));
        let collection = InMemoryCollection::new(records);

        let de = collection
            .fetch(&RemoteQuery::new("de-CH").with_page(1, 10))
            .await
            .unwrap();
        assert_eq!(de.pagination.total, 1);

        let filtered = collection
            .fetch(
                &RemoteQuery::new("fr-CH")
                    .with_filter(Some(Filter::eq(Field::Slug, "r2")))
                    .with_page(1, 10),
            )
            .await
            .unwrap();
        assert_eq!(filtered.items.len(), 1);
        assert_eq!(filtered.items[0].slug, "r2");
    }

    #[tokio::test]
    async fn test_injected_failure_and_request_log() {
        let collection = InMemoryCollection::new(fixture(2)).fail_on_request(2);
        assert!(collection.fetch(&RemoteQuery::new("fr-CH")).await.is_ok());
        let err = collection.fetch(&RemoteQuery::new("fr-CH")).await.unwrap_err();
        assert_eq!(err.error_code(), "remote_failed");
        assert_eq!(collection.request_count(), 2);
        collection.clear_requests();
        assert_eq!(collection.request_count(), 0);
    }
}
