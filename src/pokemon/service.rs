//! Record Store Gateway
//!
//! CRUD over the `pokemons` collection.

use std::sync::Arc;

use serde_json::{Number, Value};

use crate::error::{PokedexError, Result};
use crate::pagination::Pagination;
use crate::store::{
    Collection, Document, Filter, FindOptions, ObjectId, SortOrder, StoreError, WriteFailure,
    VERSION_FIELD,
};

use super::{CreatePokemon, Pokemon, UpdatePokemon};

/// Page size used when neither the caller nor the builder sets one
const DEFAULT_LIMIT: u64 = 10;

/// Gateway between callers and the creature collection
///
/// The collection handle is injected; the gateway holds no other state.
pub struct PokemonService {
    collection: Arc<dyn Collection>,
    default_limit: u64,
}

impl PokemonService {
    pub fn new(collection: Arc<dyn Collection>) -> Self {
        Self {
            collection,
            default_limit: DEFAULT_LIMIT,
        }
    }

    /// Override the page size used when `limit` is omitted
    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit.max(1);
        self
    }

    pub fn default_limit(&self) -> u64 {
        self.default_limit
    }

    /// Insert a record with its name lowercased
    ///
    /// Invalid input is rejected before anything is written.
    pub async fn create(&self, mut input: CreatePokemon) -> Result<Pokemon> {
        input.validate()?;
        input.name = input.name.to_lowercase();

        let stored = self
            .collection
            .insert_one(input.into_document())
            .await
            .map_err(|e| self.write_error(e, "create"))?;

        self.decode(stored)
    }

    /// One page of records ordered by `no`, version metadata stripped
    pub async fn find_all(&self, pagination: &Pagination) -> Result<Vec<Pokemon>> {
        let options = FindOptions::new()
            .limit(pagination.limit_or(self.default_limit))
            .skip(pagination.skip(self.default_limit))
            .sort("no", SortOrder::Ascending)
            .exclude(VERSION_FIELD);

        let docs = self
            .collection
            .find(&Filter::All, &options)
            .await
            .map_err(|e| self.read_error(e))?;

        docs.into_iter().map(|doc| self.decode(doc)).collect()
    }

    /// Resolve `term` by `no`, then by ObjectId, then by name
    ///
    /// Each step only runs when the previous ones found nothing.
    pub async fn find_one(&self, term: &str) -> Result<Pokemon> {
        let mut found = None;

        if let Some(number) = parse_number(term) {
            tracing::debug!("Resolving {:?} by no", term);
            if let Some(value) = number_value(number) {
                found = self
                    .collection
                    .find_one(&Filter::eq("no", value))
                    .await
                    .map_err(|e| self.read_error(e))?;
            }
        }

        if found.is_none() && ObjectId::is_valid(term) {
            tracing::debug!("Resolving {:?} by _id", term);
            let id: ObjectId = term
                .parse()
                .map_err(|_| PokedexError::BadRequest(format!("{} is not a valid MongoID", term)))?;
            found = self
                .collection
                .find_by_id(&id)
                .await
                .map_err(|e| self.read_error(e))?;
        }

        if found.is_none() {
            let name = term.to_lowercase().trim().to_string();
            tracing::debug!("Resolving {:?} by name {:?}", term, name);
            found = self
                .collection
                .find_one(&Filter::eq("name", name))
                .await
                .map_err(|e| self.read_error(e))?;
        }

        match found {
            Some(doc) => self.decode(doc),
            None => Err(PokedexError::NotFound(format!(
                "Pokemon with id/name {} not found",
                term
            ))),
        }
    }

    /// Merge `patch` into the record `term` resolves to
    ///
    /// The returned view is the pre-update record with the patch laid over
    /// it; storage is not re-read.
    pub async fn update(&self, term: &str, mut patch: UpdatePokemon) -> Result<Pokemon> {
        patch.validate()?;
        let pokemon = self.find_one(term).await?;

        if let Some(name) = patch.name.take() {
            patch.name = Some(name.to_lowercase());
        }
        let fields = patch.into_document();

        self.collection
            .update_by_id(&pokemon.id, fields.clone())
            .await
            .map_err(|e| self.write_error(e, "update"))?;

        let mut view = pokemon.to_document().map_err(|e| self.decode_error(e))?;
        view.extend(fields);
        self.decode(view)
    }

    /// Delete the record stored under `id`
    pub async fn remove(&self, id: &str) -> Result<()> {
        let object_id: ObjectId = id
            .parse()
            .map_err(|_| PokedexError::BadRequest(format!("{} is not a valid MongoID", id)))?;

        let deleted = self
            .collection
            .delete_one(&Filter::Id(object_id))
            .await
            .map_err(|e| self.write_error(e, "delete"))?;

        if deleted == 0 {
            return Err(PokedexError::NotFound(format!(
                "Pokemon with id {} not found",
                id
            )));
        }

        Ok(())
    }

    // =========================================================================
    // Error Translation
    // =========================================================================

    fn write_error(&self, error: StoreError, action: &str) -> PokedexError {
        match self.collection.classify(&error) {
            WriteFailure::Duplicate { key_value, .. } => {
                PokedexError::DuplicateKey(key_value.to_string())
            }
            WriteFailure::Other => {
                tracing::error!("Failed to {} pokemon: {}", action, error);
                PokedexError::StorageFailure(format!(
                    "Can't {} pokemon - Check server logs",
                    action
                ))
            }
        }
    }

    fn read_error(&self, error: StoreError) -> PokedexError {
        tracing::error!("Failed to read pokemon: {}", error);
        PokedexError::StorageFailure("Can't read pokemon - Check server logs".to_string())
    }

    fn decode_error(&self, error: serde_json::Error) -> PokedexError {
        tracing::error!("Stored pokemon has an unexpected shape: {}", error);
        PokedexError::StorageFailure("Can't read pokemon - Check server logs".to_string())
    }

    fn decode(&self, doc: Document) -> Result<Pokemon> {
        Pokemon::from_document(doc).map_err(|e| self.decode_error(e))
    }
}

/// `Number(term)` as a browser would compute it, `None` for NaN
///
/// Surrounding whitespace is ignored and an empty string is zero.
fn parse_number(term: &str) -> Option<f64> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    let radix = match trimmed.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&trimmed[2..], radix).ok().map(|n| n as f64);
    }

    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    // Rust also accepts "inf" / "nan"; Number() does not
    let body = trimmed.trim_start_matches(['+', '-']);
    if !body.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }

    trimmed.parse::<f64>().ok()
}

/// JSON value to compare `no` against; `None` when nothing can match
fn number_value(number: f64) -> Option<Value> {
    if number.fract() == 0.0 && number.abs() < 9.0e15 {
        return Some(Value::from(number as i64));
    }
    Number::from_f64(number).map(Value::Number)
}
