//! Uniform random record selection without loading the collection.

use rand::Rng;
use tracing::debug;

use crate::error::Result;
use crate::query::RemoteQuery;
use crate::remote::RemoteCollection;
use crate::types::Incident;

/// Picks one record of `locale` uniformly at random.
///
/// Two requests: a one-record probe to learn the total, then a one-record
/// read at a random offset under the canonical sort. Returns `Ok(None)` for an
/// empty collection. Results are never cached.
pub async fn pick<R>(remote: &R, locale: &str) -> Result<Option<Incident>>
where
    R: RemoteCollection + ?Sized,
{
    let total = count(remote, locale).await?;
    if total == 0 {
        return Ok(None);
    }
    // the thread-local rng must not live across an await
    let offset = rand::rng().random_range(0..total);
    fetch_at(remote, locale, offset).await
}

/// Like [`pick`], drawing the offset from `rng`.
pub async fn pick_with<R, G>(remote: &R, locale: &str, rng: &mut G) -> Result<Option<Incident>>
where
    R: RemoteCollection + ?Sized,
    G: Rng + ?Sized,
{
    let total = count(remote, locale).await?;
    if total == 0 {
        return Ok(None);
    }
    fetch_at(remote, locale, rng.random_range(0..total)).await
}

async fn count<R>(remote: &R, locale: &str) -> Result<u64>
where
    R: RemoteCollection + ?Sized,
{
    let probe = remote
        .fetch(&RemoteQuery::new(locale).with_page(1, 1))
        .await?;
    Ok(probe.pagination.total)
}

async fn fetch_at<R>(remote: &R, locale: &str, offset: u64) -> Result<Option<Incident>>
where
    R: RemoteCollection + ?Sized,
{
    debug!(locale, offset, "random pick");
    let page = remote
        .fetch(&RemoteQuery::new(locale).with_offset(offset, 1))
        .await?;
    Ok(page.items.into_iter().next())
}
