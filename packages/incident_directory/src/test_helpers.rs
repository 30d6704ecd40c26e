use chrono::{Duration, NaiveDate, TimeZone, Utc};

use crate::types::{Incident, Subject};

/// A minimal record in `locale` dated `date` (YYYY-MM-DD).
pub fn incident(slug: &str, locale: &str, date: &str, category: &str) -> Incident {
    Incident {
        id: 0,
        document_id: None,
        slug: slug.to_string(),
        title: format!("Incident {slug}"),
        description: String::new(),
        consequence: None,
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
        category: Some(category.to_string()),
        location: None,
        locale: Some(locale.to_string()),
        subject: None,
        subject_role: None,
        sources: vec![],
        evidence: vec![],
        localizations: vec![],
        created_at: None,
        updated_at: None,
    }
}

pub fn with_affiliation(mut incident: Incident, affiliation: &str) -> Incident {
    incident.subject = Some(Subject {
        name: format!("Subject of {}", incident.slug),
        canton: Some("VD".to_string()),
        affiliation: Some(affiliation.to_string()),
        picture: None,
    });
    incident
}

/// `n` fr-CH records `r1..rn`, already in canonical order (r1 is the newest).
pub fn fixture(n: usize) -> Vec<Incident> {
    let newest = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default();
    (1..=n)
        .map(|i| {
            let date = newest - Duration::days(i as i64);
            let mut record = incident(
                &format!("r{i}"),
                "fr-CH",
                &date.format("%Y-%m-%d").to_string(),
                "hate_speech",
            );
            record.id = i as u64;
            record.created_at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single();
            record
        })
        .collect()
}
