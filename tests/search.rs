//! Remote and client search against a live HTTP server

use hms_client::{
    filter_items, ApiClient, CacheKey, ClientConfig, LogNavigator, MemorySession, QueryCache, RemoteSearch,
    SearchOptions, SearchState,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Patient {
    id: i64,
    name: String,
}

fn client(server: &MockServer) -> ApiClient {
    ApiClient::with_navigator(
        ClientConfig::new(server.uri()),
        Arc::new(MemorySession::with_token("t")),
        Arc::new(LogNavigator),
    )
    .unwrap()
}

async fn settled(search: &RemoteSearch<Patient>, key: &CacheKey) -> SearchState<Patient> {
    let mut states = search.subscribe();
    let state = tokio::time::timeout(Duration::from_secs(5), states.wait_for(|s| s.is_settled_for(key)))
        .await
        .expect("search settled")
        .unwrap()
        .clone();
    state
}

async fn mount_patients(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/patients"))
        .and(query_param("search", "jane"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 2, "name": "Jane"}])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/patients"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "John"}, {"id": 2, "name": "Jane"}])),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_search_term_sent_trimmed_as_query_param() {
    let server = MockServer::start().await;
    mount_patients(&server).await;

    let options = SearchOptions::new("/api/patients", "patient-search").debounce_ms(20);
    let search = RemoteSearch::<Patient>::new(client(&server), QueryCache::new(), options.clone());

    let all = settled(&search, &options.key_for("")).await;
    assert_eq!(all.data.map(|rows| rows.len()), Some(2));

    search.set_term("  jane ");
    let found = settled(&search, &options.key_for("  jane ")).await;
    assert_eq!(found.data, Some(vec![Patient { id: 2, name: "Jane".into() }]));

    let received = server.received_requests().await.unwrap();
    let queries: Vec<Option<String>> = received.iter().map(|r| r.url.query().map(str::to_string)).collect();
    assert_eq!(queries, vec![None, Some("search=jane".to_string())]);
}

#[tokio::test]
async fn test_mutation_refreshes_open_search() {
    let server = MockServer::start().await;
    mount_patients(&server).await;

    let cache = QueryCache::new();
    let options = SearchOptions::new("/api/patients", "patient-search").debounce_ms(20);
    let search = RemoteSearch::<Patient>::new(client(&server), cache.clone(), options.clone());
    settled(&search, &options.key_for("")).await;

    cache
        .mutate(&[CacheKey::new("patient-search")], async { Ok(()) })
        .await
        .unwrap();

    let refetched = tokio::time::timeout(Duration::from_secs(5), async {
        while server.received_requests().await.unwrap().len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(refetched.is_ok(), "no refetch after invalidation");

    let state = settled(&search, &options.key_for("")).await;
    assert_eq!(state.data.map(|rows| rows.len()), Some(2));
}

#[tokio::test]
async fn test_fetched_list_filters_locally() {
    let server = MockServer::start().await;
    mount_patients(&server).await;

    let rows: Vec<Patient> = client(&server).get_json("/api/patients").await.unwrap();
    let matched = filter_items(Some(rows.as_slice()), "JO", &["name"], &[]);

    assert_eq!(matched, vec![Patient { id: 1, name: "John".into() }]);
}
