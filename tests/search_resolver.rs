use httpmock::prelude::*;
use serde_json::json;

use steamlist::search::{self, SearchConfig, SearchError};

fn cfg_for(server: &MockServer) -> SearchConfig {
    SearchConfig {
        api_key: "test-key".into(),
        engine_id: "test-engine".into(),
        endpoint: server.url("/customsearch/v1"),
    }
}

#[tokio::test]
async fn resolve_keeps_only_detail_pages() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/customsearch/v1")
                .query_param("key", "test-key")
                .query_param("cx", "test-engine")
                .query_param("q", "Portal 2");
            then.status(200).json_body(json!({
                "items": [
                    { "link": "https://store.steampowered.com/app/620/Portal_2/" },
                    { "link": "https://steamcommunity.com/games/620/announcements" },
                    { "link": "https://store.steampowered.com/news/app/620" },
                    { "link": "https://store.steampowered.com/app/400/Portal/" }
                ]
            }));
        })
        .await;

    let client = reqwest::Client::new();
    let links = search::resolve(&client, &cfg_for(&server), "Portal 2")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(
        links,
        vec![
            "https://store.steampowered.com/app/620/Portal_2/".to_string(),
            "https://store.steampowered.com/app/400/Portal/".to_string(),
        ]
    );
}

#[tokio::test]
async fn resolve_reports_no_results_when_items_missing() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/customsearch/v1");
            then.status(200).json_body(json!({ "kind": "customsearch#search" }));
        })
        .await;

    let client = reqwest::Client::new();
    let err = search::resolve(&client, &cfg_for(&server), "nothing")
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::NoResults));
}

#[tokio::test]
async fn resolve_reports_no_results_when_filter_drops_everything() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/customsearch/v1");
            then.status(200).json_body(json!({
                "items": [
                    { "link": "https://store.steampowered.com/search/?term=portal" },
                    { "link": "https://steamcommunity.com/games/620" }
                ]
            }));
        })
        .await;

    let client = reqwest::Client::new();
    let err = search::resolve(&client, &cfg_for(&server), "portal")
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::NoResults));
}
