//! Network Module
//!
//! HTTP server exposing the catalog.
//!
//! ## Architecture
//! - axum router under the `/api/v2` prefix
//! - Handlers call the gateway / seed service through shared `AppState`
//! - Errors map to status codes in `response`

mod response;
mod routes;
mod server;

use std::sync::Arc;

use crate::config::Config;
use crate::error::{PokedexError, Result};
use crate::fetch::ReqwestAdapter;
use crate::pokemon::{Pokemon, PokemonService};
use crate::seed::SeedService;
use crate::store::DocumentCollection;

pub use response::ErrorBody;
pub use routes::{router, API_PREFIX};
pub use server::Server;

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub pokemon: Arc<PokemonService>,
    pub seed: Arc<SeedService<ReqwestAdapter>>,
}

impl AppState {
    pub fn new(pokemon: PokemonService, seed: SeedService<ReqwestAdapter>) -> Self {
        Self {
            pokemon: Arc::new(pokemon),
            seed: Arc::new(seed),
        }
    }

    /// Open the collection under `config.data_dir` and wire the services
    pub fn open(config: &Config) -> Result<Self> {
        let options = Pokemon::collection_options().wal_sync_strategy(config.wal_sync_strategy);
        let collection = DocumentCollection::open(&config.data_dir, options).map_err(|e| {
            tracing::error!("Failed to open collection in {}: {}", config.data_dir.display(), e);
            PokedexError::StorageFailure(format!("Can't open collection: {}", e))
        })?;
        let collection = Arc::new(collection);

        let pokemon = PokemonService::new(collection.clone()).with_default_limit(config.default_limit);
        let seed = SeedService::new(collection, ReqwestAdapter::with_timeout_ms(config.fetch_timeout_ms)?)
            .with_source_url(&config.seed_url);

        Ok(Self::new(pokemon, seed))
    }
}
