//! Wiki scraping pipeline: sitemap discovery, HTML parsing, and chunking.
//!
//! Build-time data flow: [`sitemap::SitemapPlanner`] discovers URLs,
//! [`orchestrator::WikiScraper`] fetches them, [`parser::parse_wiki_page`]
//! structures each page, and [`chunker::create_chunks`] produces the
//! retrieval units.

pub mod chunker;
pub mod orchestrator;
pub mod parser;
pub mod sitemap;
pub mod splitter;

pub use chunker::{create_chunks, create_default_chunks, Chunk, ChunkMetadata};
pub use orchestrator::{scrape_single_page, ProgressCallback, WikiScraper};
pub use parser::{clean_text, format_infobox, parse_wiki_page, WikiPage, WikiSection};
pub use sitemap::{parse_sitemap, plan_urls, should_skip_url, SitemapPlanner};
pub use splitter::split_text;
