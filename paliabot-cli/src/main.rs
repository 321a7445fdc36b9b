//! Command-line interface for the Palia wiki Q&A bot
//!
//! Builds the scrape and query pipelines from explicit parts at startup:
//! embedding client, vector index, LLM client, engine. No global state.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use paliabot_core::{init_logging, BotConfig, LoggingConfig};
use paliabot_rag::{AnswerEngine, SiumaiEmbeddings, SiumaiGenerator, VectorIndex};
use paliabot_scraper::orchestrator::ProgressCallback;
use paliabot_scraper::WikiScraper;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "paliabot")]
#[command(about = "Scrape the Palia wiki and answer questions about it")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the wiki and populate the vector index
    Scrape {
        /// Maximum number of pages to scrape (for testing)
        #[arg(long)]
        max_pages: Option<usize>,

        /// Delay between requests in milliseconds
        #[arg(long, default_value = "1000")]
        delay_ms: u64,

        /// Clear the existing index before scraping
        #[arg(long)]
        clear: bool,

        /// Only scrape pages not already in the index
        #[arg(long)]
        incremental: bool,
    },

    /// Ask a question about Palia
    Ask {
        /// Question to ask
        question: String,

        /// Number of chunks to retrieve
        #[arg(long, default_value = "5")]
        top_k: usize,
    },

    /// Show the wiki sources a question would draw on
    Sources {
        /// Question to look up
        question: String,

        /// Number of sources to return
        #[arg(long, default_value = "3")]
        top_k: usize,
    },

    /// Show index statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let logging = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };
    init_logging(&logging).map_err(|e| anyhow::anyhow!("failed to init logging: {}", e))?;

    let config = BotConfig::load(cli.config.as_deref())?.apply_env();

    match cli.command {
        Commands::Scrape {
            max_pages,
            delay_ms,
            clear,
            incremental,
        } => {
            let mut config = config;
            if max_pages.is_some() {
                config.scraper.max_pages = max_pages;
            }
            config.scraper.delay_ms = delay_ms;
            run_scrape(config, clear, incremental).await
        }
        Commands::Ask { question, top_k } => {
            let mut config = config;
            config.engine.retrieval_k = top_k;
            let engine = build_engine(&config).await?;
            let answer = engine.query(&question).await?;
            println!("{}", answer);
            Ok(())
        }
        Commands::Sources { question, top_k } => {
            let engine = build_engine(&config).await?;
            let sources = engine.get_sources(&question, top_k).await?;
            if sources.is_empty() {
                println!("No sources found.");
            }
            for source in sources {
                println!("- {} [{}]: {}", source.title, source.section, source.url);
            }
            Ok(())
        }
        Commands::Stats => {
            let engine = build_engine(&config).await?;
            println!("Indexed documents: {}", engine.indexed_documents());
            println!("Cached responses:  {}", engine.cached_responses());
            Ok(())
        }
    }
}

async fn build_engine(config: &BotConfig) -> anyhow::Result<AnswerEngine> {
    let embedder = Arc::new(SiumaiEmbeddings::new(config.embedding.clone()).await?);
    let index = Arc::new(VectorIndex::open(
        &config.storage,
        &config.embedding,
        embedder,
    )?);
    let generator = Arc::new(SiumaiGenerator::new(config.llm.clone()).await?);
    Ok(AnswerEngine::new(
        index,
        generator,
        config.engine.clone(),
        config.cache.clone(),
    ))
}

async fn run_scrape(config: BotConfig, clear: bool, incremental: bool) -> anyhow::Result<()> {
    println!("Palia Wiki Scraper");
    println!("Vector index: {:?}", config.storage.base_dir.join(&config.storage.collection));

    let embedder = Arc::new(SiumaiEmbeddings::new(config.embedding.clone()).await?);
    let mut index = VectorIndex::open(&config.storage, &config.embedding, embedder)?;

    let skip_urls: HashSet<String> = if clear {
        println!("Clearing existing index...");
        index.clear()?;
        HashSet::new()
    } else if incremental {
        let urls = index.indexed_urls();
        println!("Incremental mode: {} URLs already indexed", urls.len());
        urls
    } else {
        HashSet::new()
    };

    println!(
        "Starting scrape (delay: {}ms, max pages: {})",
        config.scraper.delay_ms,
        config
            .scraper
            .max_pages
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unlimited".to_string())
    );

    let scraper = WikiScraper::new(config.scraper.clone())?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    let progress_bar = pb.clone();
    let progress = move |current: usize, total: usize, url: &str| {
        progress_bar.set_length(total as u64);
        progress_bar.set_position(current as u64);
        progress_bar.set_message(url.to_string());
    };

    let chunks = scraper
        .scrape_all(Some(&progress as &ProgressCallback), &skip_urls)
        .await;
    pb.finish_with_message("scrape complete");

    if chunks.is_empty() {
        if incremental {
            println!("No new pages to scrape. Index is up to date.");
            return Ok(());
        }
        anyhow::bail!("no chunks were scraped; check the logs for errors");
    }

    println!("Scraped {} chunks; adding to vector index...", chunks.len());
    let added = index.add_chunks(&chunks).await?;
    index.save()?;

    println!(
        "Done! Added {} chunks; index now contains {} documents.",
        added,
        index.count()
    );
    Ok(())
}
