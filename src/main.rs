use anyhow::Result;
use clap::{Parser, Subcommand};
use opsboard::config::{create_sample_env_file, Config};
use opsboard::dashboard::{DashboardService, TimeRange};
use opsboard::mcp::McpServer;
use opsboard::upstream::{CachedAdapter, IncidentSource, UpstreamClient};
use opsboard::BoundedCache;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "opsboard")]
#[command(about = "Incident dashboard MCP server backed by a cached aggregation engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server (stdio mode for IDE/desktop clients)
    Serve,
    /// Fetch and print the full dashboard payload once
    Dashboard {
        /// Window to aggregate: 24h, 7d or 30d
        #[arg(long, default_value = "24h")]
        time_range: String,
    },
    /// Fetch and print live poll stats once
    Poll,
    /// Generate a sample .env.example file
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Stdio mode owns stdout for JSON-RPC; route logs to stderr there and
    // skip the pretty formatter entirely for one-shot commands' output.
    let is_stdio = matches!(cli.command, None | Some(Commands::Serve));
    if is_stdio {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    match cli.command {
        Some(Commands::InitConfig) => {
            create_sample_env_file()?;
            Ok(())
        }
        Some(Commands::Dashboard { time_range }) => {
            let range = TimeRange::parse(&time_range)?;
            let dashboard = build_dashboard()?;
            let payload = dashboard.full_fetch(range).await?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
            eprintln!("{}", payload.summary_line());
            Ok(())
        }
        Some(Commands::Poll) => {
            let dashboard = build_dashboard()?;
            let stats = dashboard.live_poll().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Some(Commands::Serve) | None => {
            let config = Config::from_env()?;
            let mut server = McpServer::new(&config)?;
            server.run().await
        }
    }
}

fn build_dashboard() -> Result<DashboardService> {
    let config = Config::from_env()?;
    let cache = BoundedCache::new();
    let client = Arc::new(UpstreamClient::new(&config)?);
    let adapter: Arc<dyn IncidentSource> =
        Arc::new(CachedAdapter::from_config(client, cache, &config));
    Ok(DashboardService::new(adapter))
}
