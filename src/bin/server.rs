//! Pokedex Server Binary
//!
//! Starts the HTTP API for Pokedex.

use clap::Parser;
use pokedex::config::WalSyncStrategy;
use pokedex::network::{AppState, Server};
use pokedex::Config;
use tracing_subscriber::{fmt, EnvFilter};

/// Pokedex Server
#[derive(Parser, Debug)]
#[command(name = "pokedex-server")]
#[command(about = "Pokemon catalog CRUD service")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, env = "POKEDEX_DATA_DIR", default_value = "./pokedex_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, env = "POKEDEX_LISTEN", default_value = "127.0.0.1:3000")]
    listen: String,

    /// Port override (keeps the host from --listen)
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Page size when a list request omits `limit`
    #[arg(long, env = "DEFAULT_LIMIT", default_value = "10")]
    default_limit: u64,

    /// Source for GET /api/v2/seed
    #[arg(long, env = "POKEDEX_SEED_URL", default_value = pokedex::config::DEFAULT_SEED_URL)]
    seed_url: String,

    /// Outbound request timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    fetch_timeout_ms: u64,

    /// fsync the WAL after every N writes (1 = every write)
    #[arg(long, default_value = "1")]
    wal_sync_every: usize,
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pokedex=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let listen = match args.port {
        Some(port) => {
            let host = args.listen.rsplit_once(':').map(|(h, _)| h).unwrap_or("0.0.0.0");
            format!("{}:{}", host, port)
        }
        None => args.listen.clone(),
    };

    let wal_sync_strategy = if args.wal_sync_every <= 1 {
        WalSyncStrategy::EveryWrite
    } else {
        WalSyncStrategy::EveryNEntries {
            count: args.wal_sync_every,
        }
    };

    tracing::info!("Pokedex Server v{}", pokedex::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", listen);

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(listen)
        .default_limit(args.default_limit)
        .seed_url(&args.seed_url)
        .fetch_timeout_ms(args.fetch_timeout_ms)
        .wal_sync_strategy(wal_sync_strategy)
        .build();

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        std::process::exit(2);
    }

    let state = match AppState::open(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to open catalog: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Catalog opened successfully");

    let server = match Server::bind(&config, state).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
