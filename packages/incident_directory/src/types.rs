use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One incident entry as served by the remote collection.
///
/// Every field except `id` is optional on the wire: walks request narrow field
/// projections, so a record may arrive with only its slug and ordering keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: u64,

    #[serde(rename = "documentId", default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,

    #[serde(default)]
    pub slug: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequence: Option<String>,

    #[serde(rename = "incident_date", default)]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(rename = "incident_location", default)]
    pub location: Option<String>,

    #[serde(default)]
    pub locale: Option<String>,

    #[serde(rename = "sujet", default)]
    pub subject: Option<Subject>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_role: Option<String>,

    #[serde(default)]
    pub sources: Vec<SourceLink>,

    #[serde(rename = "evidence_image", default)]
    pub evidence: Vec<Evidence>,

    #[serde(default)]
    pub localizations: Vec<Localization>,

    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Incident {
    /// Calendar year of the incident date, if the record carries one.
    pub fn year(&self) -> Option<i32> {
        self.date.map(|d| d.year())
    }

    /// Locale → slug map for cross-locale navigation, including this record's own locale.
    pub fn slugs(&self) -> BTreeMap<String, String> {
        let mut map: BTreeMap<String, String> = self
            .localizations
            .iter()
            .filter(|l| !l.locale.is_empty() && !l.slug.is_empty())
            .map(|l| (l.locale.clone(), l.slug.clone()))
            .collect();
        if let Some(locale) = &self.locale {
            if !self.slug.is_empty() {
                map.insert(locale.clone(), self.slug.clone());
            }
        }
        map
    }

    pub fn affiliation(&self) -> Option<&str> {
        self.subject.as_ref().and_then(|s| s.affiliation.as_deref())
    }
}

/// The person or organisation an incident is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default)]
    pub name: String,

    /// Administrative region code (e.g. "VD", "ZH", "CH" for federal).
    #[serde(default)]
    pub canton: Option<String>,

    #[serde(default)]
    pub affiliation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<MediaRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLink {
    #[serde(default)]
    pub id: u64,
    pub url: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(default)]
    pub id: u64,
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Localization {
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub slug: String,
}

/// Pagination metadata as reported by the remote collection.
///
/// Page-based requests fill `page`/`page_size`/`page_count`; offset-based
/// requests fill `start`/`limit`. `total` is always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl Pagination {
    /// Page metadata for a page-based response over `total` records.
    pub fn for_page(page: u32, page_size: u32, total: u64) -> Self {
        let page_count = if page_size == 0 {
            0
        } else {
            total.div_ceil(page_size as u64) as u32
        };
        Self {
            page,
            page_size,
            page_count,
            total,
            start: None,
            limit: None,
        }
    }
}

/// One page of records plus its pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

pub type IncidentPage = Page<Incident>;

/// Previous/next neighbors of a record in an ordering.
///
/// `previous` is the more recent neighbor (lists are newest-first).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjacent {
    pub previous: Option<String>,
    pub next: Option<String>,
}

impl Adjacent {
    pub fn none() -> Self {
        Self::default()
    }
}

/// A distinct facet value and how many records carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub value: String,
    pub count: usize,
}

/// Facet value lists for the search form.
///
/// `categories` and `affiliations` are ranked by frequency; `years` is
/// deduplicated and sorted newest first regardless of frequency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetStats {
    pub categories: Vec<FacetCount>,
    pub affiliations: Vec<FacetCount>,
    pub years: Vec<i32>,
}

/// A slug and its last modification time, for sitemap generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub slug: String,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRAPI_RECORD: &str = r#"{
        "id": 42,
        "documentId": "k3x9",
        "title": "Propos haineux en séance",
        "slug": "propos-haineux-en-seance",
        "incident_date": "2023-05-14",
        "category": "hate_speech",
        "description": "Lors de la séance du conseil...",
        "incident_location": "Lausanne",
        "consequence": null,
        "subject_role": "Conseiller communal",
        "locale": "fr-CH",
        "createdAt": "2023-06-01T08:30:00.000Z",
        "updatedAt": "2024-01-10T12:00:00.000Z",
        "publishedAt": "2023-06-01T08:31:00.000Z",
        "sujet": {
            "id": 7,
            "name": "Jean Exemple",
            "canton": "VD",
            "affiliation": "UDC",
            "picture": { "id": 3, "url": "/uploads/jean.jpg" }
        },
        "sources": [
            { "id": 1, "url": "https://news.example/article", "label": "Article" }
        ],
        "evidence_image": [
            { "id": 9, "url": "/uploads/capture.png", "width": 800, "height": 600 }
        ],
        "localizations": [
            { "id": 43, "locale": "de-CH", "slug": "hassrede-in-der-sitzung" }
        ]
    }"#;

    #[test]
    fn test_deserialize_strapi_record() {
        let incident: Incident = serde_json::from_str(STRAPI_RECORD).unwrap();
        assert_eq!(incident.id, 42);
        assert_eq!(incident.document_id.as_deref(), Some("k3x9"));
        assert_eq!(incident.year(), Some(2023));
        assert_eq!(incident.category.as_deref(), Some("hate_speech"));
        assert_eq!(incident.location.as_deref(), Some("Lausanne"));
        assert_eq!(incident.affiliation(), Some("UDC"));
        assert_eq!(incident.subject.as_ref().unwrap().canton.as_deref(), Some("VD"));
        assert_eq!(incident.sources.len(), 1);
        assert_eq!(incident.evidence[0].width, Some(800));
        assert!(incident.consequence.is_none());
        assert!(incident.created_at.is_some());
    }

    #[test]
    fn test_deserialize_projected_record() {
        let incident: Incident =
            serde_json::from_str(r#"{"id": 1, "slug": "a", "incident_date": "2021-02-03"}"#)
                .unwrap();
        assert_eq!(incident.slug, "a");
        assert!(incident.subject.is_none());
        assert!(incident.sources.is_empty());
        assert!(incident.created_at.is_none());
    }

    #[test]
    fn test_slug_map_includes_own_locale() {
        let incident: Incident = serde_json::from_str(STRAPI_RECORD).unwrap();
        let slugs = incident.slugs();
        assert_eq!(slugs.len(), 2);
        assert_eq!(slugs["fr-CH"], "propos-haineux-en-seance");
        assert_eq!(slugs["de-CH"], "hassrede-in-der-sitzung");
    }

    #[test]
    fn test_pagination_wire_names() {
        let p: Pagination =
            serde_json::from_str(r#"{"page":2,"pageSize":25,"pageCount":4,"total":90}"#).unwrap();
        assert_eq!(p.page_size, 25);
        assert_eq!(p.page_count, 4);

        let offset: Pagination =
            serde_json::from_str(r#"{"start":17,"limit":1,"total":90}"#).unwrap();
        assert_eq!(offset.start, Some(17));
        assert_eq!(offset.page_count, 0);
        assert_eq!(offset.total, 90);
    }

    #[test]
    fn test_pagination_for_page() {
        assert_eq!(Pagination::for_page(1, 10, 25).page_count, 3);
        assert_eq!(Pagination::for_page(1, 10, 20).page_count, 2);
        assert_eq!(Pagination::for_page(1, 10, 0).page_count, 0);
    }
}
