//! Scrape orchestration
//!
//! Drives fetch → parse → chunk over the planned URL list. Strictly
//! sequential: the run self-throttles with a fixed inter-request delay to
//! respect the wiki's load. One bad page never aborts the run.

use crate::chunker::{create_default_chunks, Chunk};
use crate::parser::{parse_wiki_page, WikiPage};
use crate::sitemap::SitemapPlanner;
use paliabot_core::{BotError, BotResult, ScraperConfig};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = "PaliaWikiBot/1.0 (Educational Project; Q&A Bot)";

/// Called before each page fetch with (current, total, url).
pub type ProgressCallback = dyn Fn(usize, usize, &str) + Send + Sync;

/// Scraper for the Palia wiki.
pub struct WikiScraper {
    client: reqwest::Client,
    planner: SitemapPlanner,
    config: ScraperConfig,
}

impl WikiScraper {
    pub fn new(config: ScraperConfig) -> BotResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                BotError::network_with_source("failed to build HTTP client", "scraper", e)
            })?;

        let planner = SitemapPlanner::new(client.clone(), config.clone());

        Ok(Self {
            client,
            planner,
            config,
        })
    }

    /// Fetch a single wiki page body.
    pub async fn fetch_page(&self, url: &str) -> BotResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BotError::network_with_source(format!("GET {} failed", url), "scraper", e))?
            .error_for_status()
            .map_err(|e| {
                BotError::network_with_source(format!("GET {} failed", url), "scraper", e)
            })?;

        response.text().await.map_err(|e| {
            BotError::network_with_source(format!("reading body of {} failed", url), "scraper", e)
        })
    }

    /// Fetch and parse a single wiki page.
    pub async fn scrape_page(&self, url: &str) -> BotResult<WikiPage> {
        let html = self.fetch_page(url).await?;
        Ok(parse_wiki_page(&html, url))
    }

    /// Scrape all planned pages and return their chunks. URLs present in
    /// `skip_urls` are left out (incremental mode); the caller is
    /// responsible for persisting the result.
    pub async fn scrape_all(
        &self,
        progress_callback: Option<&ProgressCallback>,
        skip_urls: &HashSet<String>,
    ) -> Vec<Chunk> {
        let discovered = self.planner.discover().await;
        let urls: Vec<String> = discovered
            .into_iter()
            .filter(|url| !skip_urls.contains(url))
            .collect();
        let total = urls.len();
        info!("Scraping {} pages", total);

        let mut all_chunks = Vec::new();
        for (i, url) in urls.iter().enumerate() {
            if let Some(callback) = progress_callback {
                callback(i + 1, total, url);
            }

            match self.scrape_page(url).await {
                Ok(page) => {
                    let chunks = create_default_chunks(&page);
                    debug!("Scraped {}: {} chunks", url, chunks.len());
                    all_chunks.extend(chunks);
                }
                Err(e) => warn!("Skipping {}: {}", url, e),
            }

            // Rate limiting; no need to sleep after the last request.
            if i + 1 < total {
                tokio::time::sleep(Duration::from_millis(self.config.delay_ms)).await;
            }
        }

        info!(
            "Scraping complete: {} total chunks from {} pages",
            all_chunks.len(),
            total
        );
        all_chunks
    }
}

/// Scrape one page and return its chunks, without pacing.
pub async fn scrape_single_page(url: &str) -> BotResult<Vec<Chunk>> {
    let config = ScraperConfig {
        delay_ms: 0,
        ..ScraperConfig::default()
    };
    let scraper = WikiScraper::new(config)?;
    let page = scraper.scrape_page(url).await?;
    Ok(create_default_chunks(&page))
}
