//! Facet statistics for the search form.

use std::collections::{BTreeSet, HashMap};

use crate::types::{FacetCount, FacetStats, Incident};

/// Aggregates facet values over a record set.
///
/// Categories and affiliations are ranked by count, highest first; equal
/// counts keep the order in which each value was first seen. Missing or blank
/// values are not a facet value. Years are the distinct incident years,
/// newest first.
pub fn aggregate(records: &[Incident]) -> FacetStats {
    FacetStats {
        categories: rank(records.iter().map(|r| r.category.as_deref())),
        affiliations: rank(records.iter().map(Incident::affiliation)),
        years: distinct_years(records),
    }
}

fn rank<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<FacetCount> {
    let mut counts: Vec<FacetCount> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for value in values.flatten().map(str::trim).filter(|v| !v.is_empty()) {
        match index.get(value) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(value, counts.len());
                counts.push(FacetCount {
                    value: value.to_string(),
                    count: 1,
                });
            }
        }
    }

    // stable: ties stay in first-seen order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

fn distinct_years(records: &[Incident]) -> Vec<i32> {
    let years: BTreeSet<i32> = records.iter().filter_map(Incident::year).collect();
    years.into_iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{incident, with_affiliation};

    fn values(counts: &[FacetCount]) -> Vec<(&str, usize)> {
        counts.iter().map(|c| (c.value.as_str(), c.count)).collect()
    }

    #[test]
    fn test_categories_ranked_with_first_seen_ties() {
        let records: Vec<Incident> = ["A", "A", "B", "A", "C"]
            .iter()
            .enumerate()
            .map(|(i, cat)| incident(&format!("r{i}"), "fr-CH", "2024-01-01", cat))
            .collect();
        let stats = aggregate(&records);
        assert_eq!(values(&stats.categories), vec![("A", 3), ("B", 1), ("C", 1)]);
    }

    #[test]
    fn test_tie_order_follows_input_not_value() {
        let records: Vec<Incident> = ["Z", "M", "M", "Z", "A"]
            .iter()
            .enumerate()
            .map(|(i, cat)| incident(&format!("r{i}"), "fr-CH", "2024-01-01", cat))
            .collect();
        let stats = aggregate(&records);
        assert_eq!(values(&stats.categories), vec![("Z", 2), ("M", 2), ("A", 1)]);
    }

    #[test]
    fn test_missing_and_blank_values_excluded() {
        let mut blank = incident("b", "fr-CH", "2024-01-01", "  ");
        blank.date = None;
        let mut none = incident("n", "fr-CH", "2023-01-01", "x");
        none.category = None;
        let records = vec![
            with_affiliation(incident("a", "fr-CH", "2024-01-01", "x"), "PLR"),
            with_affiliation(blank, ""),
            none,
        ];
        let stats = aggregate(&records);
        assert_eq!(values(&stats.categories), vec![("x", 1)]);
        assert_eq!(values(&stats.affiliations), vec![("PLR", 1)]);
        assert_eq!(stats.years, vec![2024, 2023]);
    }

    #[test]
    fn test_years_distinct_and_descending_not_by_frequency() {
        let records = vec![
            incident("a", "fr-CH", "2019-03-01", "x"),
            incident("b", "fr-CH", "2022-03-01", "x"),
            incident("c", "fr-CH", "2019-05-01", "x"),
            incident("d", "fr-CH", "2019-07-01", "x"),
            incident("e", "fr-CH", "2021-03-01", "x"),
        ];
        assert_eq!(aggregate(&records).years, vec![2022, 2021, 2019]);
    }

    #[test]
    fn test_affiliations_ranked() {
        let records = vec![
            with_affiliation(incident("a", "fr-CH", "2024-01-01", "x"), "UDC"),
            with_affiliation(incident("b", "fr-CH", "2024-01-01", "x"), "PS"),
            with_affiliation(incident("c", "fr-CH", "2024-01-01", "x"), "PS"),
        ];
        let stats = aggregate(&records);
        assert_eq!(values(&stats.affiliations), vec![("PS", 2), ("UDC", 1)]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(aggregate(&[]), FacetStats::default());
    }
}
