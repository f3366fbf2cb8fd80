use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use colab::Server;
use colab::client::{self, ClientOutcome};
use colab::config::{self, ClientConfig, FileConfig, ServerConfig};

#[derive(Parser)]
#[command(name = "colab")]
#[command(about = "Line-oriented collaborative editing over TCP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept editing sessions
    Server(ServerArgs),

    /// Open the terminal editor and mirror edits to a server
    Client(ClientArgs),
}

#[derive(Parser)]
struct ServerArgs {
    /// Port to listen on (invalid values fall back to the configured port)
    port: Option<String>,

    /// Host to bind to
    #[arg(short = 'b', long)]
    host: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Parser)]
struct ClientArgs {
    /// Server address as host:port
    address: Option<String>,

    /// Write logs to this file (the terminal belongs to the editor)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config: FileConfig = config::load_config()
        .extract()
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Server(args) => run_server(args, file_config).await,
        Commands::Client(args) => run_client(args, file_config).await,
    }
}

fn env_filter(debug: bool) -> tracing_subscriber::EnvFilter {
    let default_directive = if debug {
        "colab=debug,edit_core=debug,info"
    } else {
        "colab=info,edit_core=info,warn"
    };
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive))
}

async fn run_server(args: ServerArgs, file_config: FileConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter(args.debug))
        .init();

    let port = args.port.as_deref().and_then(|arg| {
        let port = config::parse_port(arg);
        if port.is_none() {
            warn!("Invalid port {:?}, using {}", arg, file_config.server.port);
        }
        port
    });
    let config = ServerConfig::from_file(&file_config.server, args.host.as_deref(), port);

    let server = Server::bind(&config).await?;
    let handle = server.handle();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, shutting down");
                handle.shutdown();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    server.serve().await?;
    Ok(())
}

async fn run_client(args: ClientArgs, file_config: FileConfig) -> Result<()> {
    // stderr is the editor's screen; logs go to a file or nowhere.
    let registry = tracing_subscriber::registry().with(env_filter(args.debug));
    match &args.log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
        }
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::sink))
            .init(),
    }

    let config = ClientConfig::from_file(&file_config.client, args.address.as_deref());
    let address = config.address.clone();
    let outcome = client::run_client(config).await?;
    if outcome == ClientOutcome::ServerClosed {
        eprintln!("Server at {} closed the connection.", address);
    }
    Ok(())
}
