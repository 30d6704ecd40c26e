//! # Incident Directory
//!
//! Query and navigation engine over a paginated, locale-partitioned remote
//! collection of incident records (a Strapi-style REST content repository).
//!
//! ## Overview
//!
//! The remote serves at most `page_cap` records per request. On top of that
//! this library provides:
//! - Filtered, paginated listings built from optional search facets
//! - Facet statistics (category, affiliation, year) over a whole locale
//! - Previous/next navigation for a record within its ordering context
//! - Uniform random selection using two one-record requests
//! - Sitemap entries and single-record lookup by slug
//!
//! Every ordered result uses one comparator: incident date descending, then
//! creation time descending.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use incident_directory::{FilterCriteria, IncidentDirectory, OrderingContext};
//! use incident_directory::remote::{StrapiClient, StrapiConfig};
//!
//! # async fn run() -> incident_directory::Result<()> {
//! let client = StrapiClient::new(&StrapiConfig::new(
//!     "https://cms.example.org",
//!     "the-wall-of-shames",
//! ))?;
//! let directory = IncidentDirectory::new(client);
//!
//! // One page of a filtered listing
//! let criteria = FilterCriteria::new().with_year("2024").with_category("hate_speech");
//! let page = directory.list("fr-CH", &criteria).await?;
//!
//! // Neighbors of the first hit inside the same search
//! if let Some(first) = page.items.first() {
//!     let adjacent = directory
//!         .adjacent(&first.slug, "fr-CH", &OrderingContext::Search(criteria.clone()))
//!         .await?;
//!     println!("{adjacent:?}");
//! }
//!
//! // Facet values for the search form
//! let stats = directory.facet_stats("fr-CH").await?;
//! println!("{} categories", stats.categories.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Caching
//!
//! Two time-bounded caches sit in front of the remote: unfiltered listing
//! pages (60 s by default) and facet statistics per locale (one hour by
//! default). Filtered listings, navigation and random picks always hit the
//! remote.

pub mod cache;
pub mod criteria;
pub mod error;
pub mod memory;
pub mod navigator;
pub mod query;
pub mod random;
pub mod remote;
pub mod stats;
pub mod types;
pub mod walker;

#[cfg(test)]
mod test_helpers;

pub use cache::TtlCache;
pub use criteria::{FilterCriteria, OrderingContext};
pub use error::{DirectoryError, ErrorResponse, Result};
pub use memory::InMemoryCollection;
pub use query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, RemoteQuery};
pub use remote::{RemoteCollection, StrapiClient, StrapiConfig};
pub use types::{
    Adjacent, FacetCount, FacetStats, Incident, IncidentPage, Page, Pagination, SitemapEntry,
};

use std::time::Duration;
use tracing::debug;

use crate::query::{Field, Filter, PageRequest, build_query};

/// How long an unfiltered listing page is served from cache.
pub const DEFAULT_LISTING_TTL: Duration = Duration::from_secs(60);

/// How long facet statistics for a locale are served from cache.
pub const DEFAULT_STATS_TTL: Duration = Duration::from_secs(3600);

type ListingKey = (String, u32, u32);

/// Entry point: every directory operation over one remote collection.
pub struct IncidentDirectory<R> {
    remote: R,
    page_cap: u32,
    listing_cache: TtlCache<ListingKey, IncidentPage>,
    stats_cache: TtlCache<String, FacetStats>,
}

impl<R: RemoteCollection> IncidentDirectory<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            page_cap: MAX_PAGE_SIZE,
            listing_cache: TtlCache::new(DEFAULT_LISTING_TTL),
            stats_cache: TtlCache::new(DEFAULT_STATS_TTL),
        }
    }

    /// Largest page size requested from the remote; must not exceed what it serves.
    pub fn with_page_cap(mut self, page_cap: u32) -> Self {
        self.page_cap = page_cap.max(1);
        self
    }

    pub fn with_listing_ttl(mut self, ttl: Duration) -> Self {
        self.listing_cache = TtlCache::new(ttl);
        self
    }

    pub fn with_stats_ttl(mut self, ttl: Duration) -> Self {
        self.stats_cache = TtlCache::new(ttl);
        self
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// One page of records matching `criteria`, in canonical order.
    ///
    /// Listings without any facet are cached briefly per locale and window.
    pub async fn list(&self, locale: &str, criteria: &FilterCriteria) -> Result<IncidentPage> {
        let query = build_query(locale, criteria, self.page_cap)?;

        let key = match (criteria.has_facets(), query.page) {
            (false, PageRequest::Page { page, size }) => Some((locale.to_string(), page, size)),
            _ => None,
        };

        if let Some(key) = &key {
            if let Some(page) = self.listing_cache.get(key) {
                debug!(locale, page = key.1, "listing cache hit");
                return Ok(page);
            }
        }

        let page = self.remote.fetch(&query).await?;
        if let Some(key) = key {
            self.listing_cache.insert(key, page.clone());
        }
        Ok(page)
    }

    /// The record with `slug` in `locale`, with its relations populated.
    pub async fn by_slug(&self, locale: &str, slug: &str) -> Result<Option<Incident>> {
        let query = RemoteQuery::new(locale)
            .with_filter(Some(Filter::eq(Field::Slug, slug)))
            .with_page(1, 1);
        let page = self.remote.fetch(&query).await?;
        Ok(page.items.into_iter().next())
    }

    /// Facet statistics over the whole unfiltered locale collection.
    pub async fn facet_stats(&self, locale: &str) -> Result<FacetStats> {
        let key = locale.to_string();
        if let Some(stats) = self.stats_cache.get(&key) {
            debug!(locale, "stats cache hit");
            return Ok(stats);
        }

        let records = walker::walk_all(&self.remote, &RemoteQuery::new(locale), self.page_cap).await?;
        let stats = stats::aggregate(&records);
        debug!(
            locale,
            records = records.len(),
            categories = stats.categories.len(),
            "computed facet stats"
        );
        self.stats_cache.insert(key, stats.clone());
        Ok(stats)
    }

    /// Previous/next slugs of `slug` within `context`.
    pub async fn adjacent(
        &self,
        slug: &str,
        locale: &str,
        context: &OrderingContext,
    ) -> Result<Adjacent> {
        navigator::adjacent(&self.remote, slug, locale, context, self.page_cap).await
    }

    /// A uniformly random record of `locale`, or `None` if it has none.
    pub async fn random(&self, locale: &str) -> Result<Option<Incident>> {
        random::pick(&self.remote, locale).await
    }

    /// Every slug of `locale` with its last modification time, in canonical order.
    pub async fn sitemap_entries(&self, locale: &str) -> Result<Vec<SitemapEntry>> {
        let query = RemoteQuery::new(locale).with_fields(&[Field::Slug, Field::UpdatedAt]);
        let records = walker::walk_all(&self.remote, &query, self.page_cap).await?;
        Ok(records
            .into_iter()
            .filter(|r| !r.slug.is_empty())
            .map(|r| SitemapEntry {
                slug: r.slug,
                updated_at: r.updated_at,
            })
            .collect())
    }

    /// Drops every cached listing page and statistics entry.
    pub fn invalidate_caches(&self) {
        self.listing_cache.clear();
        self.stats_cache.clear();
    }
}
