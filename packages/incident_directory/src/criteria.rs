use serde::{Deserialize, Serialize};

use crate::error::{DirectoryError, Result};

/// User-facing search criteria. Every field is independently optional and
/// absence means "no constraint on that dimension".
///
/// Blank strings (what an HTML form sends for "all years") count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub year: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub affiliation: Option<String>,
    pub query: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }

    /// Trims every text facet and drops the blank ones.
    pub fn normalized(&self) -> Self {
        Self {
            year: non_blank(&self.year),
            category: non_blank(&self.category),
            region: non_blank(&self.region),
            affiliation: non_blank(&self.affiliation),
            query: non_blank(&self.query),
            page: self.page,
            page_size: self.page_size,
        }
    }

    /// True when at least one facet constrains the result set.
    /// Page and page size are not facets.
    pub fn has_facets(&self) -> bool {
        let n = self.normalized();
        n.year.is_some()
            || n.category.is_some()
            || n.region.is_some()
            || n.affiliation.is_some()
            || n.query.is_some()
    }

    /// Parses the year facet, if present, as a four-digit calendar year.
    pub fn parsed_year(&self) -> Result<Option<i32>> {
        match non_blank(&self.year) {
            None => Ok(None),
            Some(raw) => parse_year(&raw).map(Some),
        }
    }

    /// Facet-only copy, without paging. Used for navigation, which always walks every page.
    pub fn facets_only(&self) -> Self {
        Self {
            page: None,
            page_size: None,
            ..self.normalized()
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_year(raw: &str) -> Result<i32> {
    if raw.len() != 4 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DirectoryError::InvalidYear(raw.to_string()));
    }
    raw.parse::<i32>()
        .map_err(|_| DirectoryError::InvalidYear(raw.to_string()))
}

/// Which ordering defines "previous" and "next" for a record.
///
/// The search variant carries the exact criteria the list view was built
/// from. With no facets it walks the same set as `Default`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "context", content = "criteria", rename_all = "snake_case")]
pub enum OrderingContext {
    /// Whole locale collection, newest first.
    Default,
    /// The filtered subset, same comparator.
    Search(FilterCriteria),
}

impl OrderingContext {
    /// Criteria that define this context's record set.
    pub fn criteria(&self) -> FilterCriteria {
        match self {
            Self::Default => FilterCriteria::default(),
            Self::Search(criteria) => criteria.facets_only(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Search(_) => "search",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_facets_are_absent() {
        let criteria = FilterCriteria {
            year: Some("".into()),
            category: Some("   ".into()),
            query: Some(" udc ".into()),
            ..Default::default()
        };
        let n = criteria.normalized();
        assert!(n.year.is_none());
        assert!(n.category.is_none());
        assert_eq!(n.query.as_deref(), Some("udc"));
        assert!(criteria.has_facets());
    }

    #[test]
    fn test_paging_is_not_a_facet() {
        let criteria = FilterCriteria::new().with_page(3, 10);
        assert!(!criteria.has_facets());
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(
            FilterCriteria::new().with_year("2021").parsed_year().unwrap(),
            Some(2021)
        );
        assert_eq!(FilterCriteria::new().parsed_year().unwrap(), None);
        assert_eq!(
            FilterCriteria::new().with_year(" 1999 ").parsed_year().unwrap(),
            Some(1999)
        );
    }

    #[test]
    fn test_reject_malformed_year() {
        for bad in ["21", "20211", "20x1", "-202", "２０２１", "year"] {
            let err = FilterCriteria::new().with_year(bad).parsed_year().unwrap_err();
            assert!(err.is_validation(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_context_criteria_drop_paging() {
        let ctx = OrderingContext::Search(
            FilterCriteria::new().with_category("x").with_page(4, 10),
        );
        let c = ctx.criteria();
        assert_eq!(c.category.as_deref(), Some("x"));
        assert!(c.page.is_none());
        assert!(c.page_size.is_none());
        assert_eq!(OrderingContext::Default.criteria(), FilterCriteria::default());
    }

    #[test]
    fn test_facetless_search_matches_default_set() {
        let ctx = OrderingContext::Search(FilterCriteria::new().with_category("  "));
        assert_eq!(ctx.criteria(), OrderingContext::Default.criteria());
        assert_eq!(ctx.name(), "search");
    }
}
