//! Previous/next navigation within an ordering context.

use tracing::debug;

use crate::criteria::OrderingContext;
use crate::error::Result;
use crate::query::{Field, RemoteQuery, build_filter};
use crate::remote::RemoteCollection;
use crate::types::Adjacent;
use crate::walker::walk_all;

/// Attributes a navigation walk needs: the slug plus the ordering keys.
const NAVIGATION_FIELDS: &[Field] = &[Field::Slug, Field::IncidentDate, Field::CreatedAt];

/// Finds the neighbors of `slug` in the ordering defined by `context`.
///
/// Walks the whole ordered set and scans it linearly, so the cost grows with
/// the size of the context (one request per `page_cap` records). A slug that
/// is not in the set yields no neighbors; that is not an error.
///
/// Malformed search criteria fail before any remote request is made.
pub async fn adjacent<R>(
    remote: &R,
    slug: &str,
    locale: &str,
    context: &OrderingContext,
    page_cap: u32,
) -> Result<Adjacent>
where
    R: RemoteCollection + ?Sized,
{
    let filter = build_filter(&context.criteria())?;
    let query = RemoteQuery::new(locale)
        .with_filter(filter)
        .with_fields(NAVIGATION_FIELDS);

    let records = walk_all(remote, &query, page_cap).await?;

    let Some(idx) = records.iter().position(|r| r.slug == slug) else {
        debug!(slug, context = context.name(), "slug not in ordering");
        return Ok(Adjacent::none());
    };

    Ok(Adjacent {
        previous: idx
            .checked_sub(1)
            .and_then(|i| records.get(i))
            .map(|r| r.slug.clone()),
        next: records.get(idx + 1).map(|r| r.slug.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::FilterCriteria;
    use crate::memory::InMemoryCollection;
    use crate::query::Projection;
    use crate::test_helpers::{fixture, incident};

    async fn neighbors(collection: &InMemoryCollection, slug: &str) -> Adjacent {
        adjacent(collection, slug, "fr-CH", &OrderingContext::Default, 2)
            .await
            .unwrap()
    }

    fn pair(previous: Option<&str>, next: Option<&str>) -> Adjacent {
        Adjacent {
            previous: previous.map(str::to_string),
            next: next.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_middle_first_and_last() {
        let collection = InMemoryCollection::new(fixture(5)).with_page_cap(2);
        assert_eq!(neighbors(&collection, "r3").await, pair(Some("r2"), Some("r4")));
        assert_eq!(neighbors(&collection, "r1").await, pair(None, Some("r2")));
        assert_eq!(neighbors(&collection, "r5").await, pair(Some("r4"), None));
    }

    #[tokio::test]
    async fn test_absent_slug_has_no_neighbors() {
        let collection = InMemoryCollection::new(fixture(5));
        assert_eq!(neighbors(&collection, "missing").await, Adjacent::none());
    }

    #[tokio::test]
    async fn test_single_record() {
        let collection = InMemoryCollection::new(fixture(1));
        assert_eq!(neighbors(&collection, "r1").await, Adjacent::none());
    }

    #[tokio::test]
    async fn test_search_context_skips_non_matching() {
        let mut records = fixture(5);
        records[1].category = Some("other".to_string());
        records[3].category = Some("other".to_string());
        let collection = InMemoryCollection::new(records).with_page_cap(2);

        let context = OrderingContext::Search(FilterCriteria::new().with_category("hate_speech"));
        let adj = adjacent(&collection, "r3", "fr-CH", &context, 2)
            .await
            .unwrap();
        assert_eq!(adj, pair(Some("r1"), Some("r5")));
    }

    #[tokio::test]
    async fn test_page_boundary_neighbors() {
        // r2 ends page 1, r3 starts page 2
        let collection = InMemoryCollection::new(fixture(6)).with_page_cap(2);
        assert_eq!(neighbors(&collection, "r2").await, pair(Some("r1"), Some("r3")));
        assert_eq!(collection.request_count(), 3);
    }

    #[tokio::test]
    async fn test_walk_uses_light_projection() {
        let collection = InMemoryCollection::new(fixture(3));
        neighbors(&collection, "r2").await;
        for q in collection.requests() {
            assert_eq!(q.projection, Projection::Fields(NAVIGATION_FIELDS.to_vec()));
        }
    }

    #[tokio::test]
    async fn test_same_date_ordered_by_creation_newest_first() {
        use chrono::{TimeZone, Utc};

        let created = |hour| Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).single();
        let mut early = incident("early", "fr-CH", "2024-05-01", "hate_speech");
        early.created_at = created(8);
        let mut late = incident("late", "fr-CH", "2024-05-01", "hate_speech");
        late.created_at = created(20);
        let newer = incident("newer", "fr-CH", "2024-05-02", "hate_speech");
        let older = incident("older", "fr-CH", "2024-04-30", "hate_speech");

        // stored out of order
        let collection = InMemoryCollection::new(vec![early, older, newer, late]);
        assert_eq!(neighbors(&collection, "late").await, pair(Some("newer"), Some("early")));
        assert_eq!(neighbors(&collection, "early").await, pair(Some("late"), Some("older")));
    }

    #[tokio::test]
    async fn test_other_locale_not_in_ordering() {
        let mut records = fixture(2);
        records.push(incident("de-1", "de-CH", "2024-12-31", "hate_speech"));
        let collection = InMemoryCollection::new(records);
        assert_eq!(neighbors(&collection, "de-1").await, Adjacent::none());
    }

    #[tokio::test]
    async fn test_invalid_criteria_fail_before_fetch() {
        let collection = InMemoryCollection::new(fixture(3));
        let context = OrderingContext::Search(FilterCriteria::new().with_year("20x4"));
        let err = adjacent(&collection, "r1", "fr-CH", &context, 10)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(collection.request_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let collection = InMemoryCollection::new(fixture(5))
            .with_page_cap(2)
            .fail_on_request(3);
        let err = adjacent(&collection, "r1", "fr-CH", &OrderingContext::Default, 2)
            .await
            .unwrap_err();
        assert!(!err.is_validation());
    }
}
