use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

mod config;
mod dashboard;
mod db;
mod engine;

use config::Config;
use dashboard::AppState;
use db::Database;
use engine::endgame::FinalRoundOdds;
use engine::model::SoftmaxModel;
use engine::ProbabilityEngine;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    // Open database
    let db = Database::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path);

    // Optional archive import before serving
    if let Some(path) = &config.import_path {
        let (games, clues) = db.import_archive(path)?;
        info!("Imported {} game(s) / {} clue(s) from {}", games, clues, path);
    }
    let stats = db.stats()?;
    info!("Archive holds {} game(s), {} clue(s)", stats.games, stats.clues);

    // Load the outcome model (file overrides the embedded weights)
    let model = match &config.model_path {
        Some(path) => SoftmaxModel::from_path(Path::new(path))?,
        None => SoftmaxModel::embedded()?,
    };
    info!(
        "Outcome model {} loaded ({} training games, log-loss {:.4})",
        model.metadata.version, model.metadata.trained_games, model.metadata.log_loss
    );

    // Load the final-round odds table the same way
    let odds = match &config.final_odds_path {
        Some(path) => FinalRoundOdds::from_path(Path::new(path))?,
        None => FinalRoundOdds::embedded()?,
    };
    info!(
        "Final-round odds table {} loaded ({} entries, {} sampled games)",
        odds.version(),
        odds.len(),
        odds.games_sampled()
    );

    let engine = ProbabilityEngine::new(Arc::new(model), odds, config.board_rules())?;

    // Start the dashboard HTTP server
    let state = AppState {
        db,
        engine: Arc::new(engine),
        search_limit: config.search_result_limit,
    };
    let app = dashboard::router(state);
    let addr: SocketAddr = config.dashboard_addr.parse()?;
    info!("Dashboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run dashboard server (blocks until shutdown)
    axum::serve(listener, app).await?;

    Ok(())
}
