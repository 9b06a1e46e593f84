// Search Resolver: Google Custom Search scoped to the Steam storefront.
//
// The engine (cx) is configured to search store.steampowered.com only; this
// module narrows the hits further to canonical product detail pages of the
// form https://store.steampowered.com/app/<id>/... and discards everything
// else (community hubs, search pages, news).

use serde::Deserialize;
use tracing::{debug, info};

pub const CUSTOM_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

#[derive(Clone)]
pub struct SearchConfig {
    pub api_key: String,
    pub engine_id: String,
    /// Custom Search endpoint; overridable so tests can point at a mock server.
    pub endpoint: String,
}

impl SearchConfig {
    pub fn new(api_key: String, engine_id: String) -> Self {
        Self {
            api_key,
            engine_id,
            endpoint: CUSTOM_SEARCH_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("no results found")]
    NoResults,
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
pub struct SearchItem {
    pub link: String,
}

/// Resolve a free-text query to product detail page URLs.
///
/// Fails with `SearchError::NoResults` when the API returned no items or none
/// of them survived the detail-page filter. Empty queries are the caller's
/// problem; they must be rejected before reaching this function.
pub async fn resolve(
    client: &reqwest::Client,
    cfg: &SearchConfig,
    query: &str,
) -> Result<Vec<String>, SearchError> {
    let url = format!(
        "{}?key={}&cx={}&q={}",
        cfg.endpoint,
        cfg.api_key,
        cfg.engine_id,
        urlencoding::encode(query)
    );

    let resp: SearchResponse = client.get(&url).send().await?.json().await?;

    let items = match resp.items {
        Some(items) if !items.is_empty() => items,
        _ => {
            info!(query, "custom search returned no items");
            return Err(SearchError::NoResults);
        }
    };

    let links = filter_app_links(&items);
    debug!(query, kept = links.len(), total = items.len(), "filtered search hits");
    if links.is_empty() {
        return Err(SearchError::NoResults);
    }
    Ok(links)
}

/// Keep only detail-page links, preserving API result order.
pub fn filter_app_links(items: &[SearchItem]) -> Vec<String> {
    items
        .iter()
        .filter(|it| is_app_link(&it.link))
        .map(|it| it.link.clone())
        .collect()
}

// Matches the storefront's canonical layout "https://<host>/app/<id>/...":
// splitting on '/' puts "app" at index 3 ("https:", "", host, "app").
pub fn is_app_link(link: &str) -> bool {
    link.split('/').nth(3) == Some("app")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_detail_pages() {
        assert!(is_app_link("https://store.steampowered.com/app/620/Portal_2/"));
        assert!(is_app_link("https://store.steampowered.com/app/620"));
        assert!(!is_app_link(
            "https://steamcommunity.com/games/620/announcements"
        ));
        assert!(!is_app_link("https://store.steampowered.com/search/?term=portal"));
        assert!(!is_app_link("https://store.steampowered.com/"));
    }

    #[test]
    fn filter_preserves_order() {
        let items = vec![
            SearchItem {
                link: "https://store.steampowered.com/app/620/Portal_2/".into(),
            },
            SearchItem {
                link: "https://store.steampowered.com/news/app/620".into(),
            },
            SearchItem {
                link: "https://store.steampowered.com/app/400/Portal/".into(),
            },
        ];
        let links = filter_app_links(&items);
        assert_eq!(
            links,
            vec![
                "https://store.steampowered.com/app/620/Portal_2/".to_string(),
                "https://store.steampowered.com/app/400/Portal/".to_string(),
            ]
        );
    }
}
