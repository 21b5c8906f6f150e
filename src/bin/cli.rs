//! Pokedex CLI Client
//!
//! Command-line interface for reading from a running Pokedex server.

use clap::{Parser, Subcommand};
use pokedex::network::API_PREFIX;
use pokedex::seed::SEED_EXECUTED;
use pokedex::{HttpAdapter, ReqwestAdapter};
use reqwest::Url;
use serde_json::Value;

/// Pokedex CLI
#[derive(Parser, Debug)]
#[command(name = "pokedex-cli")]
#[command(about = "CLI for the Pokedex catalog")]
struct Args {
    /// Server base URL
    #[arg(short, long, default_value = "http://127.0.0.1:3000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Look up one pokemon by number, id or name
    Get {
        /// Number, ObjectId or name
        term: String,
    },

    /// List pokemon ordered by number
    List {
        /// Page size
        #[arg(short, long)]
        limit: Option<u64>,

        /// Page number
        #[arg(short, long)]
        offset: Option<u64>,
    },

    /// Reload the catalog from PokeAPI
    Seed,
}

/// Request URL for `command`; path segments are percent-encoded
fn endpoint(server: &str, command: &Commands) -> Result<Url, String> {
    let mut url = Url::parse(server).map_err(|e| format!("invalid server URL {}: {}", server, e))?;

    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| format!("{} cannot be used as a base URL", server))?;
        segments.pop_if_empty();
        segments.extend(API_PREFIX.split('/').filter(|s| !s.is_empty()));
        match command {
            Commands::Get { term } => {
                segments.push("pokemon").push(term);
            }
            Commands::List { .. } => {
                segments.push("pokemon");
            }
            Commands::Seed => {
                segments.push("seed");
            }
        }
    }

    if let Commands::List { limit, offset } = command {
        if limit.is_some() || offset.is_some() {
            let mut query = url.query_pairs_mut();
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
            if let Some(offset) = offset {
                query.append_pair("offset", &offset.to_string());
            }
        }
    }

    Ok(url)
}

/// The seed route answers with plain text rather than JSON
async fn run_seed(url: Url) -> Result<String, String> {
    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| e.to_string())?;
    let body = response.text().await.map_err(|e| e.to_string())?;

    if body.trim() == SEED_EXECUTED {
        Ok(body)
    } else {
        Err(format!("unexpected seed response: {}", body))
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let url = endpoint(&args.server, &args.command).unwrap_or_else(|e| fail(e));

    if let Commands::Seed = args.command {
        match run_seed(url).await {
            Ok(text) => println!("{}", text),
            Err(e) => fail(e),
        }
        return;
    }

    match ReqwestAdapter::new().get::<Value>(url.as_str()).await {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", value),
        },
        Err(e) => fail(e),
    }
}
