//! Remote query model and the filter predicate builder.
//!
//! A [`RemoteQuery`] is a typed description of one read against the remote
//! collection: locale, optional filter tree, sort keys, page window and field
//! projection. [`build_query`] turns user-facing [`FilterCriteria`] into one;
//! [`RemoteQuery::to_params`] encodes it as Strapi-style bracket parameters.

use std::cmp::Ordering;

use crate::criteria::FilterCriteria;
use crate::error::Result;
use crate::types::Incident;

/// Page size used for listings when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page the remote collection serves (Strapi's default `maxLimit`).
pub const MAX_PAGE_SIZE: u32 = 100;

/// Remote fields the engine filters, sorts or projects on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Slug,
    Title,
    Description,
    IncidentDate,
    CreatedAt,
    UpdatedAt,
    Category,
    SubjectName,
    SubjectRegion,
    SubjectAffiliation,
}

impl Field {
    /// Attribute path on the remote record; nested fields go through the `sujet` relation.
    pub fn path(self) -> &'static [&'static str] {
        match self {
            Self::Slug => &["slug"],
            Self::Title => &["title"],
            Self::Description => &["description"],
            Self::IncidentDate => &["incident_date"],
            Self::CreatedAt => &["createdAt"],
            Self::UpdatedAt => &["updatedAt"],
            Self::Category => &["category"],
            Self::SubjectName => &["sujet", "name"],
            Self::SubjectRegion => &["sujet", "canton"],
            Self::SubjectAffiliation => &["sujet", "affiliation"],
        }
    }

    /// Dotted name, e.g. `sujet.affiliation`.
    pub fn name(self) -> String {
        self.path().join(".")
    }

    /// The field's value on a record, rendered the way the remote compares it.
    /// Dates are ISO-8601 so lexical order matches chronological order.
    pub fn value_of(self, incident: &Incident) -> Option<String> {
        let subject = incident.subject.as_ref();
        match self {
            Self::Slug => Some(incident.slug.clone()),
            Self::Title => Some(incident.title.clone()),
            Self::Description => Some(incident.description.clone()),
            Self::IncidentDate => incident.date.map(|d| d.format("%Y-%m-%d").to_string()),
            Self::CreatedAt => incident
                .created_at
                .map(|t| t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()),
            Self::UpdatedAt => incident
                .updated_at
                .map(|t| t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()),
            Self::Category => incident.category.clone(),
            Self::SubjectName => subject.map(|s| s.name.clone()),
            Self::SubjectRegion => subject.and_then(|s| s.canton.clone()),
            Self::SubjectAffiliation => subject.and_then(|s| s.affiliation.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    /// Case-insensitive substring match.
    ContainsI,
    Gte,
    Lte,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::ContainsI => "$containsi",
            Self::Gte => "$gte",
            Self::Lte => "$lte",
        }
    }

    fn holds(self, actual: &str, expected: &str) -> bool {
        match self {
            Self::Eq => actual == expected,
            Self::ContainsI => actual.to_lowercase().contains(&expected.to_lowercase()),
            Self::Gte => actual >= expected,
            Self::Lte => actual <= expected,
        }
    }
}

/// Composable filter tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Condition {
        field: Field,
        op: Operator,
        value: String,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn condition(field: Field, op: Operator, value: impl Into<String>) -> Self {
        Self::Condition {
            field,
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: Field, value: impl Into<String>) -> Self {
        Self::condition(field, Operator::Eq, value)
    }

    /// AND of `filters`; `None` when empty, the lone filter when there is one.
    pub fn all(mut filters: Vec<Filter>) -> Option<Self> {
        match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(Self::And(filters)),
        }
    }

    /// Evaluates the filter against a record. Absent fields never match.
    pub fn matches(&self, incident: &Incident) -> bool {
        match self {
            Self::Condition { field, op, value } => field
                .value_of(incident)
                .is_some_and(|actual| op.holds(&actual, value)),
            Self::And(children) => children.iter().all(|c| c.matches(incident)),
            Self::Or(children) => children.iter().any(|c| c.matches(incident)),
        }
    }

    fn encode(&self, prefix: &str, out: &mut Vec<(String, String)>) {
        match self {
            Self::Condition { field, op, value } => {
                let mut key = prefix.to_string();
                for segment in field.path() {
                    key.push_str(&format!("[{segment}]"));
                }
                key.push_str(&format!("[{}]", op.as_str()));
                out.push((key, value.clone()));
            }
            Self::And(children) => encode_group(prefix, "$and", children, out),
            Self::Or(children) => encode_group(prefix, "$or", children, out),
        }
    }
}

fn encode_group(prefix: &str, op: &str, children: &[Filter], out: &mut Vec<(String, String)>) {
    for (i, child) in children.iter().enumerate() {
        child.encode(&format!("{prefix}[{op}][{i}]"), out);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: Field,
    pub direction: Direction,
}

impl SortKey {
    pub fn desc(field: Field) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }

    fn encode(&self) -> String {
        let dir = match self.direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        format!("{}:{dir}", self.field.name())
    }

    /// Compares two records on this key. Records missing the field sort last.
    pub fn compare(&self, a: &Incident, b: &Incident) -> Ordering {
        match (self.field.value_of(a), self.field.value_of(b)) {
            (Some(x), Some(y)) => match self.direction {
                Direction::Asc => x.cmp(&y),
                Direction::Desc => y.cmp(&x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// The one comparator used for listing, statistics and navigation:
/// incident date descending, creation time descending as tie-break.
pub fn canonical_sort() -> Vec<SortKey> {
    vec![
        SortKey::desc(Field::IncidentDate),
        SortKey::desc(Field::CreatedAt),
    ]
}

/// Compares two records under a list of sort keys, first key first.
pub fn compare_by(keys: &[SortKey], a: &Incident, b: &Incident) -> Ordering {
    keys.iter()
        .map(|k| k.compare(a, b))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Which window of the ordered result set to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    /// 1-based page index and page size.
    Page { page: u32, size: u32 },
    /// Zero-based offset and record count.
    Offset { start: u64, limit: u32 },
}

/// Which attributes the remote should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// All attributes plus first-level relations (`populate=*`).
    Full,
    /// Only the listed top-level attributes, no relations.
    Fields(Vec<Field>),
}

/// One typed read against the remote collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteQuery {
    pub locale: String,
    pub filter: Option<Filter>,
    pub sort: Vec<SortKey>,
    pub page: PageRequest,
    pub projection: Projection,
}

impl RemoteQuery {
    /// Unfiltered query over a locale with the canonical sort, first page.
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            filter: None,
            sort: canonical_sort(),
            page: PageRequest::Page {
                page: 1,
                size: DEFAULT_PAGE_SIZE,
            },
            projection: Projection::Full,
        }
    }

    pub fn with_filter(mut self, filter: Option<Filter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_page(mut self, page: u32, size: u32) -> Self {
        self.page = PageRequest::Page { page, size };
        self
    }

    pub fn with_offset(mut self, start: u64, limit: u32) -> Self {
        self.page = PageRequest::Offset { start, limit };
        self
    }

    pub fn with_fields(mut self, fields: &[Field]) -> Self {
        self.projection = Projection::Fields(fields.to_vec());
        self
    }

    /// Encodes the query as Strapi REST parameters.
    ///
    /// No `filters` parameter is emitted when the query has no filter, which
    /// the remote treats as "every record" rather than "no record".
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("locale".to_string(), self.locale.clone())];

        if let Some(filter) = &self.filter {
            filter.encode("filters", &mut params);
        }

        for (i, key) in self.sort.iter().enumerate() {
            params.push((format!("sort[{i}]"), key.encode()));
        }

        match self.page {
            PageRequest::Page { page, size } => {
                params.push(("pagination[page]".to_string(), page.to_string()));
                params.push(("pagination[pageSize]".to_string(), size.to_string()));
            }
            PageRequest::Offset { start, limit } => {
                params.push(("pagination[start]".to_string(), start.to_string()));
                params.push(("pagination[limit]".to_string(), limit.to_string()));
            }
        }

        match &self.projection {
            Projection::Full => params.push(("populate".to_string(), "*".to_string())),
            Projection::Fields(fields) => {
                for (i, field) in fields.iter().enumerate() {
                    params.push((format!("fields[{i}]"), field.name()));
                }
            }
        }

        params
    }
}

/// Translates facet criteria into a filter tree.
///
/// Returns `Ok(None)` when no facet is active. Fails only on a malformed year.
pub fn build_filter(criteria: &FilterCriteria) -> Result<Option<Filter>> {
    let criteria = criteria.normalized();
    let mut conditions = Vec::new();

    if let Some(year) = criteria.parsed_year()? {
        conditions.push(Filter::condition(
            Field::IncidentDate,
            Operator::Gte,
            format!("{year:04}-01-01"),
        ));
        conditions.push(Filter::condition(
            Field::IncidentDate,
            Operator::Lte,
            format!("{year:04}-12-31"),
        ));
    }

    if let Some(category) = criteria.category {
        conditions.push(Filter::eq(Field::Category, category));
    }

    if let Some(region) = criteria.region {
        conditions.push(Filter::eq(Field::SubjectRegion, region));
    }

    if let Some(affiliation) = criteria.affiliation {
        conditions.push(Filter::eq(Field::SubjectAffiliation, affiliation));
    }

    if let Some(text) = criteria.query {
        conditions.push(Filter::Or(
            [Field::Title, Field::Description, Field::SubjectName]
                .into_iter()
                .map(|field| Filter::condition(field, Operator::ContainsI, text.clone()))
                .collect(),
        ));
    }

    Ok(Filter::all(conditions))
}

/// Builds the full remote query for one listing page.
///
/// Page defaults to 1 and page size to [`DEFAULT_PAGE_SIZE`]; the size is
/// clamped to `[1, page_cap]`.
pub fn build_query(locale: &str, criteria: &FilterCriteria, page_cap: u32) -> Result<RemoteQuery> {
    let filter = build_filter(criteria)?;
    let page = criteria.page.unwrap_or(1).max(1);
    let size = criteria
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, page_cap.max(1));
    Ok(RemoteQuery::new(locale)
        .with_filter(filter)
        .with_page(page, size))
}
