//! Seed Service
//!
//! Replaces the catalog with the list published by PokeAPI.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_SEED_URL;
use crate::error::{PokedexError, Result};
use crate::fetch::HttpAdapter;
use crate::pokemon::CreatePokemon;
use crate::store::{Collection, Filter, StoreError};

/// Message returned after a successful seed
pub const SEED_EXECUTED: &str = "Seed Executed";

/// List endpoint response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokeResponse {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<SmallPokemon>,
}

/// One entry of the list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmallPokemon {
    pub name: String,

    /// e.g. `https://pokeapi.co/api/v2/pokemon/25/`
    pub url: String,
}

impl SmallPokemon {
    /// The number in the second-to-last path segment of `url`
    pub fn number(&self) -> Option<i64> {
        let segments: Vec<&str> = self.url.split('/').collect();
        if segments.len() < 2 {
            return None;
        }
        segments[segments.len() - 2].trim().parse().ok()
    }
}

/// Wipes the collection and reloads it from the seed source
pub struct SeedService<H> {
    collection: Arc<dyn Collection>,
    http: H,
    source_url: String,
}

impl<H: HttpAdapter> SeedService<H> {
    pub fn new(collection: Arc<dyn Collection>, http: H) -> Self {
        Self {
            collection,
            http,
            source_url: DEFAULT_SEED_URL.to_string(),
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Delete every record, fetch the list and insert it
    pub async fn execute(&self) -> Result<&'static str> {
        let removed = self
            .collection
            .delete_many(&Filter::All)
            .await
            .map_err(storage_failure)?;
        tracing::info!("Seed: removed {} existing records", removed);

        let data: PokeResponse = self.http.get(&self.source_url).await?;

        let mut records = Vec::with_capacity(data.results.len());
        for entry in &data.results {
            let Some(no) = entry.number() else {
                tracing::warn!("Seed: skipping {} with unparseable url {}", entry.name, entry.url);
                continue;
            };
            let record = CreatePokemon::new(no, entry.name.to_lowercase());
            if let Err(e) = record.validate() {
                tracing::warn!("Seed: skipping {} from {}: {}", entry.name, entry.url, e);
                continue;
            }
            records.push(record.into_document());
        }

        let inserted = self
            .collection
            .insert_many(records)
            .await
            .map_err(storage_failure)?;
        tracing::info!("Seed: inserted {} records from {}", inserted, self.source_url);

        Ok(SEED_EXECUTED)
    }
}

fn storage_failure(error: StoreError) -> PokedexError {
    tracing::error!("Seed failed: {}", error);
    PokedexError::StorageFailure("Can't seed pokemon - Check server logs".to_string())
}
