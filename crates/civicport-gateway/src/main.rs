//! Civicport — citizen services portal gateway

use civicport_core::config::BindMode;
use civicport_core::PortalConfig;
use civicport_gateway::start_portal;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "civicport", about = "Civicport — citizen services portal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the portal API server
    Serve {
        /// Port override (config: gateway.port)
        #[arg(short, long)]
        port: Option<u16>,
        /// Bind mode: loopback or lan
        #[arg(short, long)]
        bind: Option<String>,
        /// Config file (default: ./civicport.json or $CIVICPORT_CONFIG)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port, bind, config }) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| "civicport=info,tower_http=info".into()),
                )
                .with(tracing_subscriber::fmt::layer())
                .init();

            let mut portal_config = match config {
                Some(path) => PortalConfig::load(&path),
                None => PortalConfig::discover(),
            };
            if let Some(port) = port {
                portal_config.gateway.port = port;
            }
            if let Some(bind) = bind {
                portal_config.gateway.bind = match bind.as_str() {
                    "loopback" | "localhost" | "127.0.0.1" => BindMode::Loopback,
                    _ => BindMode::Lan,
                };
            }

            start_portal(portal_config).await?;
        }

        Some(Commands::Version) => {
            println!("civicport v{}", env!("CARGO_PKG_VERSION"));
        }

        // no subcommand = serve with discovered config
        None => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| "civicport=info,tower_http=info".into()),
                )
                .with(tracing_subscriber::fmt::layer())
                .init();
            start_portal(PortalConfig::discover()).await?;
        }
    }

    Ok(())
}
