use incident_directory::{InMemoryCollection, Incident, IncidentDirectory, RemoteCollection};
use std::sync::Arc;

use crate::AppState;
use crate::config::LocaleConfig;
use crate::metrics::ServerMetrics;

/// `n` fr-CH records `r1..rn`, newest first, all in 2024 and one category.
pub fn fixture(n: usize) -> Vec<Incident> {
    (1..=n)
        .map(|i| {
            serde_json::from_value(serde_json::json!({
                "id": i,
                "slug": format!("r{i}"),
                "title": format!("Incident r{i}"),
                "incident_date": format!("2024-12-{:02}", 31 - i.min(30)),
                "category": "hate_speech",
                "locale": "fr-CH",
                "createdAt": "2025-01-01T00:00:00.000Z",
                "updatedAt": "2025-02-01T00:00:00.000Z",
            }))
            .unwrap()
        })
        .collect()
}

/// Build an `AppState` backed by an in-memory collection of `n` records.
///
/// Returns the collection as well so tests can inspect the queries it received.
pub fn test_app_state(n: usize) -> (AppState, Arc<InMemoryCollection>) {
    test_app_state_with(n, None)
}

/// Like `test_app_state`, optionally failing the given (1-based) remote request.
pub fn test_app_state_with(
    n: usize,
    fail_on_request: Option<usize>,
) -> (AppState, Arc<InMemoryCollection>) {
    let mut collection = InMemoryCollection::new(fixture(n));
    if let Some(request) = fail_on_request {
        collection = collection.fail_on_request(request);
    }
    let collection = Arc::new(collection);
    let remote: Arc<dyn RemoteCollection> = collection.clone();

    let state = AppState {
        directory: Arc::new(IncidentDirectory::new(remote)),
        locales: Arc::new(LocaleConfig::default()),
        metrics: Arc::new(ServerMetrics::new()),
    };

    (state, collection)
}
