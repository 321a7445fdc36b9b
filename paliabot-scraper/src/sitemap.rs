//! Sitemap discovery and URL planning
//!
//! Fetches the wiki's sitemap index, fans out to child sitemaps, and turns
//! the union of their URLs into a filtered, priority-ordered crawl list.
//! XML parsing is a pure function over bytes so the filtering and ordering
//! rules are testable without a network.

use flate2::read::GzDecoder;
use paliabot_core::{BotError, BotResult, ScraperConfig};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::io::Read;
use std::time::Duration;
use tracing::{info, warn};

/// URL substrings that mark non-content namespaces
pub const SKIP_PATTERNS: &[&str] = &[
    "/wiki/File:",
    "/wiki/Template:",
    "/wiki/Category:",
    "/wiki/Special:",
    "/wiki/User:",
    "/wiki/Talk:",
    "/wiki/Module:",
    "/wiki/MediaWiki:",
    "/wiki/Guide:",
    "?action=",
    "/wiki/Main_Page",
];

/// Language suffixes to skip (keep only English)
pub const LANGUAGE_SUFFIXES: &[&str] = &[
    "/de", "/es", "/fr", "/it", "/ja", "/ko", "/pl", "/pt-br", "/ru", "/th", "/tr", "/uk", "/vi",
    "/zh-hans", "/zh-tw",
];

/// Pages to scrape first, most useful for Q&A. Earlier index = higher
/// priority; URLs matching none sort last.
pub const PRIORITY_PATTERNS: &[&str] = &[
    r"/wiki/[A-Z][a-z]+$", // simple page names (often characters/items)
    r"/wiki/Quests",
    r"/wiki/Skills",
    r"/wiki/Locations",
    r"/wiki/Gifting",
];

/// Delay between child-sitemap fetches
const SITEMAP_FETCH_DELAY: Duration = Duration::from_millis(500);

/// One parsed sitemap document: either an index pointing at child sitemaps
/// or a leaf listing page URLs (rarely both).
#[derive(Debug, Default, Clone)]
pub struct SitemapDocument {
    pub sitemaps: Vec<String>,
    pub urls: Vec<String>,
}

impl SitemapDocument {
    pub fn is_index(&self) -> bool {
        !self.sitemaps.is_empty()
    }
}

/// Parse sitemap XML. `<sitemap><loc>` entries land in `sitemaps`,
/// `<url><loc>` entries in `urls`.
pub fn parse_sitemap(bytes: &[u8]) -> BotResult<SitemapDocument> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut doc = SitemapDocument::default();
    let mut buf = Vec::new();
    let mut in_sitemap = false;
    let mut in_url = false;
    let mut in_loc = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"sitemap" => in_sitemap = true,
                b"url" => in_url = true,
                b"loc" => in_loc = true,
                _ => {}
            },
            Ok(Event::Text(ref t)) if in_loc => {
                let loc = t
                    .unescape()
                    .map_err(|e| BotError::parse(format!("invalid sitemap text: {}", e), "sitemap"))?
                    .trim()
                    .to_string();
                if !loc.is_empty() {
                    if in_sitemap {
                        doc.sitemaps.push(loc);
                    } else if in_url {
                        doc.urls.push(loc);
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"sitemap" => in_sitemap = false,
                b"url" => in_url = false,
                b"loc" => in_loc = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(BotError::parse(
                    format!("malformed sitemap XML: {}", e),
                    "sitemap",
                ))
            }
        }
        buf.clear();
    }

    Ok(doc)
}

/// Gunzip the body when the URL points at a compressed sitemap.
pub fn decode_body(url: &str, bytes: Vec<u8>) -> BotResult<Vec<u8>> {
    if !url.ends_with(".gz") {
        return Ok(bytes);
    }
    let mut decoder = GzDecoder::new(bytes.as_slice());
    let mut decoded = Vec::new();
    decoder
        .read_to_end(&mut decoded)
        .map_err(|e| BotError::parse(format!("bad gzip data from {}: {}", url, e), "sitemap"))?;
    Ok(decoded)
}

/// Whether a URL should be excluded from the crawl.
pub fn should_skip_url(url: &str) -> bool {
    if SKIP_PATTERNS.iter().any(|pattern| url.contains(pattern)) {
        return true;
    }
    LANGUAGE_SUFFIXES.iter().any(|suffix| url.ends_with(suffix))
}

/// Sort key: index of the first matching priority pattern, or one past the
/// end for URLs matching none. Used with a stable sort so ties keep their
/// original relative order.
pub fn priority_key(url: &str, patterns: &[Regex]) -> usize {
    patterns
        .iter()
        .position(|pattern| pattern.is_match(url))
        .unwrap_or(patterns.len())
}

fn compile_priority_patterns() -> Vec<Regex> {
    PRIORITY_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("priority pattern"))
        .collect()
}

/// Apply the skip filter, priority ordering, and optional cap to a raw URL
/// list.
pub fn plan_urls(urls: Vec<String>, max_pages: Option<usize>) -> Vec<String> {
    let patterns = compile_priority_patterns();

    let mut urls: Vec<String> = urls.into_iter().filter(|u| !should_skip_url(u)).collect();
    urls.sort_by_key(|u| priority_key(u, &patterns));

    match max_pages {
        Some(cap) if cap > 0 => {
            urls.truncate(cap);
            urls
        }
        _ => urls,
    }
}

/// Discovers candidate page URLs from the wiki's sitemap tree.
pub struct SitemapPlanner {
    client: reqwest::Client,
    config: ScraperConfig,
}

impl SitemapPlanner {
    pub fn new(client: reqwest::Client, config: ScraperConfig) -> Self {
        Self { client, config }
    }

    /// Fetch the sitemap tree and return the ordered crawl list. Fetch or
    /// parse failure at any node yields an empty result for that node, never
    /// a hard failure of the whole discovery.
    pub async fn discover(&self) -> Vec<String> {
        info!(
            "Fetching sitemap index from {}",
            self.config.sitemap_index_url
        );

        let root = match self.fetch_sitemap(&self.config.sitemap_index_url).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Failed to fetch sitemap index: {}", e);
                return Vec::new();
            }
        };

        let mut all_urls = Vec::new();
        if root.is_index() {
            info!("Found sitemap index with {} sitemaps", root.sitemaps.len());
            for (i, loc) in root.sitemaps.iter().enumerate() {
                if i > 0 {
                    // Be polite between sitemap fetches.
                    tokio::time::sleep(SITEMAP_FETCH_DELAY).await;
                }
                info!("Fetching sitemap: {}", loc);
                match self.fetch_sitemap(loc).await {
                    Ok(child) => all_urls.extend(child.urls),
                    Err(e) => warn!("Failed to fetch sitemap {}: {}", loc, e),
                }
            }
        } else {
            all_urls = root.urls;
        }

        info!("Found {} total URLs from sitemaps", all_urls.len());
        let planned = plan_urls(all_urls, self.config.max_pages);
        info!("Planned {} URLs after filtering", planned.len());
        planned
    }

    async fn fetch_sitemap(&self, url: &str) -> BotResult<SitemapDocument> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BotError::network_with_source(format!("GET {} failed", url), "sitemap", e))?
            .error_for_status()
            .map_err(|e| BotError::network_with_source(format!("GET {} failed", url), "sitemap", e))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| {
                BotError::network_with_source(format!("reading body of {} failed", url), "sitemap", e)
            })?
            .to_vec();

        parse_sitemap(&decode_body(url, bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const SITEMAP_INDEX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <sitemap><loc>https://palia.wiki.gg/sitemaps/sitemap-1.xml</loc></sitemap>
            <sitemap><loc>https://palia.wiki.gg/sitemaps/sitemap-2.xml.gz</loc></sitemap>
        </sitemapindex>"#;

    const SITEMAP_LEAF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <url><loc>https://palia.wiki.gg/wiki/Sturgeon</loc><lastmod>2024-01-01</lastmod></url>
            <url><loc>https://palia.wiki.gg/wiki/Hassian</loc></url>
        </urlset>"#;

    #[test]
    fn parses_sitemap_index() {
        let doc = parse_sitemap(SITEMAP_INDEX.as_bytes()).unwrap();
        assert!(doc.is_index());
        assert_eq!(doc.sitemaps.len(), 2);
        assert!(doc.urls.is_empty());
        assert_eq!(doc.sitemaps[0], "https://palia.wiki.gg/sitemaps/sitemap-1.xml");
    }

    #[test]
    fn parses_leaf_sitemap() {
        let doc = parse_sitemap(SITEMAP_LEAF.as_bytes()).unwrap();
        assert!(!doc.is_index());
        assert_eq!(
            doc.urls,
            vec![
                "https://palia.wiki.gg/wiki/Sturgeon".to_string(),
                "https://palia.wiki.gg/wiki/Hassian".to_string(),
            ]
        );
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        assert!(parse_sitemap(b"<urlset><url><loc>ht").is_err() || parse_sitemap(b"not xml at all <<<").is_err());
    }

    #[test]
    fn gzip_bodies_are_decoded_by_extension() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SITEMAP_LEAF.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let decoded = decode_body("https://x/sitemap.xml.gz", compressed).unwrap();
        assert_eq!(decoded, SITEMAP_LEAF.as_bytes());

        // plain bodies pass through untouched
        let plain = decode_body("https://x/sitemap.xml", b"abc".to_vec()).unwrap();
        assert_eq!(plain, b"abc");
    }

    #[test]
    fn skip_filter_excludes_non_content_namespaces() {
        assert!(should_skip_url("https://palia.wiki.gg/wiki/Category:Fish"));
        assert!(should_skip_url("https://palia.wiki.gg/wiki/File:Sturgeon.png"));
        assert!(should_skip_url("https://palia.wiki.gg/wiki/Template:Infobox"));
        assert!(should_skip_url("https://palia.wiki.gg/wiki/Main_Page"));
        assert!(should_skip_url("https://palia.wiki.gg/index.php?action=edit"));
        assert!(!should_skip_url("https://palia.wiki.gg/wiki/Sturgeon"));
    }

    #[test]
    fn skip_filter_excludes_non_english_pages() {
        assert!(should_skip_url("https://palia.wiki.gg/wiki/Sturgeon/de"));
        assert!(should_skip_url("https://palia.wiki.gg/wiki/Sturgeon/zh-hans"));
        assert!(!should_skip_url("https://palia.wiki.gg/wiki/Sturgeon"));
    }

    #[test]
    fn priority_sort_is_stable_and_ranked() {
        let urls = vec![
            "https://palia.wiki.gg/wiki/Ancient_Battlegrounds".to_string(),
            "https://palia.wiki.gg/wiki/Gifting_Preferences".to_string(),
            "https://palia.wiki.gg/wiki/Fish".to_string(),
            "https://palia.wiki.gg/wiki/Another_Compound_Page".to_string(),
            "https://palia.wiki.gg/wiki/Reth".to_string(),
        ];
        let planned = plan_urls(urls, None);

        // simple names first (original order preserved among them), then the
        // Gifting hub pages, then everything else in original order
        assert_eq!(
            planned,
            vec![
                "https://palia.wiki.gg/wiki/Fish".to_string(),
                "https://palia.wiki.gg/wiki/Reth".to_string(),
                "https://palia.wiki.gg/wiki/Gifting_Preferences".to_string(),
                "https://palia.wiki.gg/wiki/Ancient_Battlegrounds".to_string(),
                "https://palia.wiki.gg/wiki/Another_Compound_Page".to_string(),
            ]
        );
    }

    #[test]
    fn cap_truncates_the_ordered_list() {
        let urls = vec![
            "https://palia.wiki.gg/wiki/Zeki_Page_Long".to_string(),
            "https://palia.wiki.gg/wiki/Fish".to_string(),
            "https://palia.wiki.gg/wiki/Bugs".to_string(),
        ];
        let planned = plan_urls(urls, Some(1));
        assert_eq!(planned, vec!["https://palia.wiki.gg/wiki/Fish".to_string()]);
    }

    #[test]
    fn filter_runs_before_ordering_and_cap() {
        let urls = vec![
            "https://palia.wiki.gg/wiki/Category:Fish".to_string(),
            "https://palia.wiki.gg/wiki/Sturgeon/de".to_string(),
            "https://palia.wiki.gg/wiki/Sturgeon".to_string(),
        ];
        let planned = plan_urls(urls, Some(10));
        assert_eq!(planned, vec!["https://palia.wiki.gg/wiki/Sturgeon".to_string()]);
    }
}
