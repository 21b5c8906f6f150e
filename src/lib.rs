//! # Pokedex
//!
//! A catalog service for creature records ("Pokemon") with:
//! - Create / read / update / delete over an embedded document collection
//! - Lookup by number, ObjectId or name through a single endpoint
//! - Unique indexes on `no` and `name`, surfaced as duplicate-key errors
//! - Write-Ahead Logging (WAL) for durability and crash recovery
//! - A typed HTTP fetch adapter used to seed the catalog from PokeAPI
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     HTTP API (axum)                          │
//! │                       /api/v2/...                            │
//! └───────────────┬─────────────────────────────┬───────────────┘
//!                 │                             │
//!                 ▼                             ▼
//!   ┌──────────────────────────┐   ┌──────────────────────────┐
//!   │     PokemonService       │   │       SeedService        │
//!   │ (record store gateway)   │   │                          │
//!   └────────────┬─────────────┘   └─────┬──────────────┬─────┘
//!                │                       │              │
//!                ▼                       ▼              ▼
//!   ┌──────────────────────────────────────────┐ ┌─────────────┐
//!   │        Collection (document store)       │ │ HttpAdapter │
//!   └────────────────────┬─────────────────────┘ │  (reqwest)  │
//!                        │                       └─────────────┘
//!                        ▼
//!                 ┌─────────────┐
//!                 │     WAL     │
//!                 │  (Append)   │
//!                 └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod store;
pub mod pagination;
pub mod pokemon;
pub mod fetch;
pub mod seed;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FetchErrorKind, PokedexError, Result};
pub use config::Config;
pub use pagination::Pagination;
pub use pokemon::{CreatePokemon, Pokemon, PokemonService, UpdatePokemon};
pub use fetch::{HttpAdapter, ReqwestAdapter};
pub use seed::SeedService;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Pokedex
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
