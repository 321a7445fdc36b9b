//! Web server for the Palia wiki Q&A bot.

use clap::Parser;
use paliabot_core::{init_logging, BotConfig, LoggingConfig};
use paliabot_rag::{AnswerEngine, SiumaiEmbeddings, SiumaiGenerator, VectorIndex};
use paliabot_web::{create_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "paliabot-web")]
#[command(about = "HTTP interface for the Palia wiki Q&A bot")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let logging = LoggingConfig {
        level: args.log_level.clone(),
        ..LoggingConfig::default()
    };
    init_logging(&logging).map_err(|e| anyhow::anyhow!("failed to init logging: {}", e))?;

    let config = BotConfig::load(args.config.as_deref())?.apply_env();

    // Build the engine from explicit parts; an unopenable index is a
    // service-level failure, so the process exits here rather than serving
    // queries it cannot answer.
    let embedder = Arc::new(SiumaiEmbeddings::new(config.embedding.clone()).await?);
    let index = Arc::new(VectorIndex::open(
        &config.storage,
        &config.embedding,
        embedder,
    )?);
    info!("Vector index ready with {} documents", index.count());

    let generator = Arc::new(SiumaiGenerator::new(config.llm.clone()).await?);
    let engine = Arc::new(AnswerEngine::new(
        index,
        generator,
        config.engine.clone(),
        config.cache.clone(),
    ));

    let app = create_router(AppState { engine });

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
