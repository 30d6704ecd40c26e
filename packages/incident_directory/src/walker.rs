//! Exhaustive pagination: collect every record matching a query from a
//! collection whose page size is capped far below its total size.

use tracing::debug;

use crate::error::Result;
use crate::query::RemoteQuery;
use crate::remote::RemoteCollection;
use crate::types::Incident;

/// Fetches every page of `query` at `page_cap` records per page and returns
/// the concatenation in page order.
///
/// The number of pages is read from the first response and never re-read, so
/// the walk terminates even if the collection grows while it runs. A page that
/// comes back empty ends the walk early (the collection shrank). Any failed
/// page aborts the whole walk; callers never see a partial sequence.
///
/// Pages are requested strictly one after another: the accumulated order is
/// the browsing order.
pub async fn walk_all<R>(remote: &R, query: &RemoteQuery, page_cap: u32) -> Result<Vec<Incident>>
where
    R: RemoteCollection + ?Sized,
{
    let page_cap = page_cap.max(1);
    let first = remote.fetch(&query.clone().with_page(1, page_cap)).await?;
    let page_count = first.pagination.page_count;
    let mut records = first.items;

    debug!(
        locale = %query.locale,
        page_count,
        total = first.pagination.total,
        "walking collection"
    );

    for page in 2..=page_count {
        let next = remote.fetch(&query.clone().with_page(page, page_cap)).await?;
        if next.items.is_empty() {
            debug!(page, page_count, "empty page before the end, stopping walk");
            break;
        }
        records.extend(next.items);
    }

    debug!(locale = %query.locale, records = records.len(), "walk complete");
    Ok(records)
}
