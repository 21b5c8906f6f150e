//! Configuration for Pokedex
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{PokedexError, Result};

/// Default seed source (PokeAPI list endpoint)
pub const DEFAULT_SEED_URL: &str = "https://pokeapi.co/api/v2/pokemon?limit=650";

/// Main configuration for a Pokedex instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the document collection
    /// Internal structure:
    ///   {data_dir}/
    ///     └── pokemons.wal     (write-ahead log, one per collection)
    pub data_dir: PathBuf,

    /// Sync strategy: how often to fsync the WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// HTTP listen address
    pub listen_addr: String,

    // -------------------------------------------------------------------------
    // Query Configuration
    // -------------------------------------------------------------------------
    /// Page size used when a list request omits `limit`
    pub default_limit: u64,

    // -------------------------------------------------------------------------
    // Outbound Fetch Configuration
    // -------------------------------------------------------------------------
    /// Source list fetched by the seed service
    pub seed_url: String,

    /// Outbound request timeout (milliseconds, 0 = no timeout)
    pub fetch_timeout_ms: u64,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./pokedex_data"),
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            listen_addr: "127.0.0.1:3000".to_string(),
            default_limit: 10,
            seed_url: DEFAULT_SEED_URL.to_string(),
            fetch_timeout_ms: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the services cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.default_limit == 0 {
            return Err(PokedexError::Config(
                "default_limit must be a positive number".to_string(),
            ));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(PokedexError::Config(
                "wal sync count must be a positive number".to_string(),
            ));
        }
        if self.listen_addr.trim().is_empty() {
            return Err(PokedexError::Config("listen address is empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the HTTP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the default page size for list requests
    pub fn default_limit(mut self, limit: u64) -> Self {
        self.config.default_limit = limit;
        self
    }

    /// Set the seed source URL
    pub fn seed_url(mut self, url: impl Into<String>) -> Self {
        self.config.seed_url = url.into();
        self
    }

    /// Set the outbound fetch timeout (in milliseconds)
    pub fn fetch_timeout_ms(mut self, ms: u64) -> Self {
        self.config.fetch_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
