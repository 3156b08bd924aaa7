mod research_cmd;
mod status_cmd;
mod terminal_output;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use sportsgpt_config::SportsGptConfig;
use sportsgpt_gateway::{GatewayState, Housekeeper, start_server};

use research_cmd::ResearchOptions;

const DEFAULT_URL: &str = "http://localhost:8080";

#[derive(Parser)]
#[command(name = "sportsgpt")]
#[command(about = "Sports GPT: cricket research with live progress")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Sports GPT gateway server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show gateway health
    Status {
        #[arg(long, default_value = DEFAULT_URL)]
        url: String,
    },
    /// Run a research query and follow its progress
    Research {
        query: String,
        #[arg(long, default_value = DEFAULT_URL)]
        url: String,
        /// Delay between progress polls
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
        /// Give up if no terminal event arrives within this many seconds
        #[arg(long, default_value_t = 330)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let mut config = sportsgpt_config::from_env()?;
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await?;
        }
        Commands::Status { url } => status_cmd::run(&url).await?,
        Commands::Research {
            query,
            url,
            interval_ms,
            timeout_secs,
        } => {
            let options = ResearchOptions {
                interval: Duration::from_millis(interval_ms),
                timeout: Duration::from_secs(timeout_secs),
            };
            research_cmd::run(&url, &query, options).await?;
        }
    }

    Ok(())
}

async fn run_server(config: SportsGptConfig) -> Result<()> {
    if !sportsgpt_logging::init_logger(&config.logging.dir, &config.logging.level) {
        warn!("Logger was already initialised");
    }
    sportsgpt_config::ensure_valid(&config)?;
    tracing::debug!(
        config = %sportsgpt_config::redact(&serde_json::to_value(&config)?),
        "Loaded config"
    );

    let addr = config.listen_addr();
    info!(
        addr = %addr,
        environment = ?config.environment,
        providers = ?config.research.providers,
        "Starting Sports GPT gateway"
    );

    let state = GatewayState::from_config(&config);
    let housekeeper = Housekeeper::new(
        Arc::clone(&state.store),
        config.research.session_ttl(),
        config.research.housekeeping_interval(),
    );

    start_server(&addr, state, housekeeper).await
}
