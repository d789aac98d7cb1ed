use clap::Parser;

use crate::engine::BoardRules;

/// Quiz show archive dashboard with win-probability modelling
#[derive(Parser, Debug, Clone)]
#[command(name = "gameshow-dash", version, about)]
pub struct Config {
    /// Dashboard listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "0.0.0.0:8080")]
    pub dashboard_addr: String,

    /// SQLite archive database path
    #[arg(long, env = "DATABASE_PATH", default_value = "gameshow.db")]
    pub database_path: String,

    /// JSON archive dump to import at startup (optional)
    #[arg(long, env = "IMPORT_PATH")]
    pub import_path: Option<String>,

    /// Outcome model weights file (JSON); omit to use the embedded model
    #[arg(long, env = "MODEL_PATH")]
    pub model_path: Option<String>,

    /// Final-round odds table file (JSON); omit to use the embedded table
    #[arg(long, env = "FINAL_ODDS_PATH")]
    pub final_odds_path: Option<String>,

    /// Total face value printed on the two scored-round boards
    #[arg(long, env = "BOARD_VALUE_TOTAL", default_value = "54000")]
    pub board_value_total: i64,

    /// Hidden-wager clues per game across the two scored rounds
    #[arg(long, env = "WAGER_CLUES_TOTAL", default_value = "3")]
    pub wager_clues_total: u32,

    /// Maximum rows returned by a clue search
    #[arg(long, env = "SEARCH_RESULT_LIMIT", default_value = "250")]
    pub search_result_limit: i64,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.dashboard_addr.parse::<std::net::SocketAddr>().is_err() {
            anyhow::bail!(
                "dashboard_addr '{}' is not a valid listen address",
                self.dashboard_addr
            );
        }
        if self.board_value_total <= 0 {
            anyhow::bail!("board_value_total must be positive");
        }
        if self.wager_clues_total == 0 {
            anyhow::bail!("wager_clues_total must be at least 1");
        }
        if self.search_result_limit <= 0 {
            anyhow::bail!("search_result_limit must be positive");
        }
        Ok(())
    }

    /// Board constants handed to the probability engine
    pub fn board_rules(&self) -> BoardRules {
        BoardRules {
            board_value_total: self.board_value_total,
            wager_clues_total: self.wager_clues_total,
        }
    }
}
