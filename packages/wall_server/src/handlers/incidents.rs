use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use incident_directory::query::build_filter;
use incident_directory::{Adjacent, FilterCriteria, Incident, OrderingContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, error};

use super::ApiError;
use crate::AppState;
use crate::metrics::Operation;

const CACHE_LISTING: &str = "public, max-age=60";
const CACHE_HOURLY: &str = "public, max-age=3600";
const NO_STORE: &str = "no-store";

#[derive(Debug, Default, Deserialize)]
pub struct LangQuery {
    lang: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    lang: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
}

/// Free-text facet: `query`, or its short alias `q` when `query` is blank.
fn free_text(query: &Option<String>, q: &Option<String>) -> Option<String> {
    [query, q]
        .into_iter()
        .flatten()
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Search form parameters. `q` is accepted as a short alias of `query`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    lang: Option<String>,
    year: Option<String>,
    category: Option<String>,
    canton: Option<String>,
    affiliation: Option<String>,
    query: Option<String>,
    q: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
}

impl SearchQuery {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            year: self.year.clone(),
            category: self.category.clone(),
            region: self.canton.clone(),
            affiliation: self.affiliation.clone(),
            query: free_text(&self.query, &self.q),
            page: self.page,
            page_size: self.page_size,
        }
        .normalized()
    }
}

/// Detail page parameters: locale, the browsing context the visitor came
/// from and, for `ctx=search`, the criteria of that search.
#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    lang: Option<String>,
    ctx: Option<String>,
    year: Option<String>,
    category: Option<String>,
    canton: Option<String>,
    affiliation: Option<String>,
    query: Option<String>,
    q: Option<String>,
}

/// How the visitor reached a record.
enum Browsing {
    Ordered(OrderingContext),
    /// Random browsing has no sequence, hence no neighbors.
    Random,
}

impl DetailQuery {
    /// A search without any facet orders like the default context.
    fn browsing(&self) -> Browsing {
        match self.ctx.as_deref() {
            Some("random") => Browsing::Random,
            Some("search") => {
                let criteria = FilterCriteria {
                    year: self.year.clone(),
                    category: self.category.clone(),
                    region: self.canton.clone(),
                    affiliation: self.affiliation.clone(),
                    query: free_text(&self.query, &self.q),
                    page: None,
                    page_size: None,
                };
                if criteria.has_facets() {
                    Browsing::Ordered(OrderingContext::Search(criteria))
                } else {
                    Browsing::Ordered(OrderingContext::Default)
                }
            }
            _ => Browsing::Ordered(OrderingContext::Default),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IncidentDetail {
    pub incident: Incident,
    /// Locale → slug of every translation, for the language switcher.
    pub slugs: BTreeMap<String, String>,
    pub adjacent: Adjacent,
    pub context: &'static str,
}

/// `GET /api/incidents` - one page of the unfiltered locale collection
pub async fn list_incidents(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let lang = state.locales.resolve(q.lang.as_deref());
    let criteria = FilterCriteria {
        page: q.page,
        page_size: q.page_size,
        ..Default::default()
    };

    let page = state
        .directory
        .list(lang, &criteria)
        .await
        .map_err(|e| ApiError::from_directory(&state.metrics, e))?;

    state.metrics.served(Operation::Listing);
    Ok(([(header::CACHE_CONTROL, CACHE_LISTING)], Json(page)).into_response())
}

/// `GET /api/search` - one page of the records matching the search facets
pub async fn search_incidents(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    let lang = state.locales.resolve(q.lang.as_deref());
    let criteria = q.criteria();
    debug!(lang, ?criteria, "search");

    let page = state
        .directory
        .list(lang, &criteria)
        .await
        .map_err(|e| ApiError::from_directory(&state.metrics, e))?;

    state.metrics.served(Operation::Search);
    Ok(([(header::CACHE_CONTROL, NO_STORE)], Json(page)).into_response())
}

/// `GET /api/incidents/{slug}` - one record with its neighbors in the browsing context
pub async fn get_incident(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(q): Query<DetailQuery>,
) -> Result<Response, ApiError> {
    let lang = state.locales.resolve(q.lang.as_deref());
    let browsing = q.browsing();

    if let Browsing::Ordered(context) = &browsing {
        build_filter(&context.criteria())
            .map_err(|e| ApiError::from_directory(&state.metrics, e))?;
    }

    let incident = state
        .directory
        .by_slug(lang, &slug)
        .await
        .map_err(|e| ApiError::from_directory(&state.metrics, e))?
        .ok_or_else(|| {
            ApiError::not_found(&state.metrics, format!("no incident {slug:?} in {lang}"))
        })?;

    let (adjacent, context) = match &browsing {
        Browsing::Random => (Adjacent::none(), "random"),
        Browsing::Ordered(context) => {
            let adjacent = state
                .directory
                .adjacent(&slug, lang, context)
                .await
                .map_err(|e| ApiError::from_directory(&state.metrics, e))?;
            (adjacent, context.name())
        }
    };

    state.metrics.served(Operation::Detail);
    let detail = IncidentDetail {
        slugs: incident.slugs(),
        incident,
        adjacent,
        context,
    };
    Ok(([(header::CACHE_CONTROL, NO_STORE)], Json(detail)).into_response())
}

/// `GET /api/stats` - facet values for the search form
pub async fn stats_handler(
    State(state): State<AppState>,
    Query(q): Query<LangQuery>,
) -> Result<Response, ApiError> {
    let lang = state.locales.resolve(q.lang.as_deref());
    let stats = state
        .directory
        .facet_stats(lang)
        .await
        .map_err(|e| ApiError::from_directory(&state.metrics, e))?;

    state.metrics.served(Operation::Stats);
    Ok(([(header::CACHE_CONTROL, CACHE_HOURLY)], Json(stats)).into_response())
}

/// `GET /api/random` - redirect to a random record's page
///
/// Falls back to the locale home page when the locale is empty or the remote
/// fails; the visitor always gets a redirect.
pub async fn random_incident(
    State(state): State<AppState>,
    Query(q): Query<LangQuery>,
) -> Response {
    let lang = state.locales.resolve(q.lang.as_deref());
    let home = format!("/{lang}");

    let target = match state.directory.random(lang).await {
        Ok(Some(incident)) => format!("/{lang}/the-wall-of-shame/{}?ctx=random", incident.slug),
        Ok(None) => home,
        Err(e) => {
            state.metrics.remote_error();
            error!(error = %e, lang, "random pick failed, redirecting home");
            home
        }
    };

    state.metrics.served(Operation::Random);
    (
        [(header::CACHE_CONTROL, NO_STORE)],
        Redirect::temporary(&target),
    )
        .into_response()
}

/// `GET /api/sitemap` - every slug of a locale with its last modification time
pub async fn sitemap_handler(
    State(state): State<AppState>,
    Query(q): Query<LangQuery>,
) -> Result<Response, ApiError> {
    let lang = state.locales.resolve(q.lang.as_deref());
    let entries = state
        .directory
        .sitemap_entries(lang)
        .await
        .map_err(|e| ApiError::from_directory(&state.metrics, e))?;

    state.metrics.served(Operation::Sitemap);
    Ok(([(header::CACHE_CONTROL, CACHE_HOURLY)], Json(entries)).into_response())
}
