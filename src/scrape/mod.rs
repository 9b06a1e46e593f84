// Listing Extractor: drives a headless Chromium instance per detail page.
//
// The storefront shows an age/region interstitial unless the bypass cookies
// are already present when the detail page first loads, so every extraction
// visits the storefront root, plants the cookies, and only then navigates to
// the target URL. Browser instances are capped by a semaphore and every
// extraction runs under a timeout; the browser process is released on every
// exit path.

pub mod schema;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, TimeSinceEpoch};
use chromiumoxide::Page;
use chrono::Utc;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use schema::{build_collect_script, classify, ExtractionSchema, RawPage};

pub const STOREFRONT_ROOT: &str = "https://store.steampowered.com";
const STOREFRONT_DOMAIN: &str = "store.steampowered.com";
const COOKIE_TTL_SECS: i64 = 3600;

// Age-gate bypass: a birthtime safely in the past plus the mature-content
// acknowledgment.
const GATE_COOKIES: [(&str, &str); 2] = [
    ("birthtime", "817783201"),
    ("wants_mature_content", "1"),
];

/// Price or percent field that is a bare number for free/flat variants and
/// the storefront's own text for discounted ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceField {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingInfo {
    pub title: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOption {
    pub title: String,
    pub original: String,
    #[serde(rename = "finally")]
    pub final_price: PriceField,
    pub discount: PriceField,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingResult {
    pub link: String,
    pub info: ListingInfo,
    pub prices: Vec<PurchaseOption>,
}

/// Which purchase-option positions to keep.
///
/// Positions index the page's non-subscription purchase nodes in DOM order.
/// They are what the saved-list feature persists, so they are only meaningful
/// against the page as it renders right now; a storefront reorder silently
/// shifts what a saved index points at.
#[derive(Debug, Clone)]
pub enum IndexFilter {
    All,
    Only(BTreeSet<usize>),
}

impl IndexFilter {
    pub fn admits(&self, index: usize) -> bool {
        match self {
            IndexFilter::All => true,
            IndexFilter::Only(set) => set.contains(&index),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("page did not match the detail-page layout")]
    LayoutMismatch,
    #[error("selector missed: {0}")]
    SelectorMiss(&'static str),
    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),
    #[error("browser config: {0}")]
    Config(String),
    #[error("page payload did not decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),
}

/// Bounded pool of headless-browser extractions.
#[derive(Clone)]
pub struct ScrapePool {
    semaphore: Arc<Semaphore>,
    timeout: Duration,
    schema: ExtractionSchema,
}

impl ScrapePool {
    pub fn new(max_browsers: usize, timeout: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_browsers.max(1))),
            timeout,
            schema: schema::STEAM,
        }
    }

    /// Extract one detail page. Launches an isolated browser, which is closed
    /// unconditionally before returning, including on timeout and error.
    pub async fn extract(
        &self,
        url: &str,
        filter: &IndexFilter,
    ) -> Result<ListingResult, ScrapeError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ScrapeError::Config("scrape pool closed".into()))?;

        info!(url, ?filter, "extracting listing");
        let mut session = BrowserSession::launch().await?;
        let outcome = tokio::time::timeout(
            self.timeout,
            run_extraction(&session.page, &self.schema, url, filter),
        )
        .await;
        session.close().await;

        match outcome {
            Err(_) => Err(ScrapeError::Timeout(self.timeout)),
            Ok(result) => result,
        }
    }
}

async fn run_extraction(
    page: &Page,
    schema: &ExtractionSchema,
    url: &str,
    filter: &IndexFilter,
) -> Result<ListingResult, ScrapeError> {
    // Cookies must exist before the detail page first loads.
    page.set_cookies(gate_cookies()).await?;
    page.goto(url).await?;
    page.wait_for_navigation().await?;
    debug!(url, "detail page loaded");

    let raw: Option<RawPage> = page
        .evaluate(build_collect_script(schema))
        .await?
        .into_value()?;
    let raw = raw.ok_or(ScrapeError::LayoutMismatch)?;

    let mut prices = Vec::new();
    for (index, node) in raw.options.iter().enumerate() {
        if !filter.admits(index) {
            continue;
        }
        let node = node
            .as_ref()
            .ok_or(ScrapeError::SelectorMiss("game_purchase_action_bg"))?;
        prices.push(classify(node)?);
    }

    Ok(ListingResult {
        link: url.to_string(),
        info: ListingInfo {
            title: raw.title,
            image: raw.image,
        },
        prices,
    })
}

fn gate_cookies() -> Vec<CookieParam> {
    let expires = (Utc::now().timestamp() + COOKIE_TTL_SECS) as f64;
    GATE_COOKIES
        .iter()
        .filter_map(|(name, value)| {
            CookieParam::builder()
                .name(*name)
                .value(*value)
                .domain(STOREFRONT_DOMAIN)
                .path("/")
                .expires(TimeSinceEpoch::new(expires))
                .build()
                .ok()
        })
        .collect()
}

struct BrowserSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    async fn launch() -> Result<Self, ScrapeError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(ScrapeError::Config)?;

        let (mut browser, mut handler) = Browser::launch(config).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler event error");
                }
            }
        });

        // Land on the storefront root first so cookie domain scoping applies.
        let page = match browser.new_page(STOREFRONT_ROOT).await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(ScrapeError::Browser(e));
            }
        };

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    async fn close(&mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "browser close failed");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_option(action_children: u32) -> schema::RawOption {
        schema::RawOption {
            title: format!("Option {action_children}"),
            action_children,
            nested_children: 0,
            flat_text: Some("$1.99".into()),
            original: None,
            final_price: None,
            pct: None,
        }
    }

    fn assemble(
        options: Vec<Option<schema::RawOption>>,
        filter: &IndexFilter,
    ) -> Result<Vec<PurchaseOption>, ScrapeError> {
        let mut prices = Vec::new();
        for (index, node) in options.iter().enumerate() {
            if !filter.admits(index) {
                continue;
            }
            let node = node
                .as_ref()
                .ok_or(ScrapeError::SelectorMiss("game_purchase_action_bg"))?;
            prices.push(classify(node)?);
        }
        Ok(prices)
    }

    #[test]
    fn all_filter_keeps_every_option() {
        let options: Vec<_> = (0..5).map(|_| Some(raw_option(2))).collect();
        let prices = assemble(options, &IndexFilter::All).unwrap();
        assert_eq!(prices.len(), 5);
    }

    #[test]
    fn index_filter_selects_by_position() {
        let options: Vec<_> = (0..5)
            .map(|i| Some(if i == 2 { raw_option(1) } else { raw_option(2) }))
            .collect();
        let filter = IndexFilter::Only(BTreeSet::from([2]));
        let prices = assemble(options, &filter).unwrap();
        assert_eq!(prices.len(), 1);
        // Position 2 is the free option in this fixture.
        assert_eq!(prices[0].original, "Free");
    }

    #[test]
    fn missing_price_container_fails_the_extraction() {
        let options = vec![Some(raw_option(2)), None];
        assert!(matches!(
            assemble(options, &IndexFilter::All),
            Err(ScrapeError::SelectorMiss(_))
        ));
    }

    #[test]
    fn purchase_option_wire_shape() {
        let free = PurchaseOption {
            title: "Play Portal 2".into(),
            original: "Free".into(),
            final_price: PriceField::Number(0),
            discount: PriceField::Number(0),
        };
        let json = serde_json::to_value(&free).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "title": "Play Portal 2",
                "original": "Free",
                "finally": 0,
                "discount": 0
            })
        );

        let discounted = PurchaseOption {
            title: "Buy Portal 2".into(),
            original: "$9.99".into(),
            final_price: PriceField::Text("$4.99".into()),
            discount: PriceField::Text("-50%".into()),
        };
        let json = serde_json::to_value(&discounted).unwrap();
        assert_eq!(json["finally"], "$4.99");
        assert_eq!(json["discount"], "-50%");
    }
}
