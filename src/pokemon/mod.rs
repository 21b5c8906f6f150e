//! Pokemon Module
//!
//! The record store gateway for the creature catalog.
//!
//! ## Responsibilities
//! - Normalize names to lowercase on every write
//! - Resolve a free-form term (number, ObjectId or name) to one record
//! - Translate store failures: duplicates surface the conflicting key,
//!   everything else is logged and reported as an opaque storage failure

mod model;
mod service;

pub use model::{CreatePokemon, Pokemon, UpdatePokemon, COLLECTION_NAME};
pub use service::PokemonService;
