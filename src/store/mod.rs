//! Store Module
//!
//! The storage collaborator behind the record gateway: a document collection
//! with unique indexes, filtered/sorted/paged reads and WAL durability.
//!
//! ## Responsibilities
//! - Assign primary identifiers (`_id`) and version metadata (`__v`) on insert
//! - Enforce unique indexes atomically at write time
//! - Answer equality filters with skip / limit / sort / projection
//! - Classify write failures for callers (`Duplicate | Other`)
//!
//! ## Layout
//! ```text
//! ┌──────────────────────────────┐
//! │   Collection (async trait)   │
//! └──────────────┬───────────────┘
//!                │
//! ┌──────────────▼───────────────┐      ┌─────────────┐
//! │      DocumentCollection      │─────▶│     WAL     │
//! │ BTreeMap<ObjectId, Document> │      │  (Append)   │
//! │ + unique indexes (RwLock)    │      └─────────────┘
//! └──────────────────────────────┘
//! ```

mod collection;
mod error;
mod object_id;
mod query;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use collection::{CollectionOptions, DocumentCollection};
pub use error::{StoreError, StoreResult, WriteFailure};
pub use object_id::{ObjectId, OBJECT_ID_HEX_LEN};
pub use query::{compare_values, values_equal};

/// A stored document: a JSON object
pub type Document = Map<String, Value>;

/// Primary identifier field
pub const ID_FIELD: &str = "_id";

/// Version metadata field
pub const VERSION_FIELD: &str = "__v";

/// Which documents an operation applies to
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every document
    All,

    /// The document with this primary identifier
    Id(ObjectId),

    /// Documents whose `field` equals `value`
    Eq { field: String, value: Value },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether `doc` (stored under `id`) matches
    pub fn matches(&self, id: &ObjectId, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Id(target) => target == id,
            Filter::Eq { field, value } => doc
                .get(field)
                .map(|stored| values_equal(stored, value))
                .unwrap_or(false),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Paging, ordering and projection for `find`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Documents to skip after sorting
    pub skip: u64,

    /// Maximum documents returned (`None` = unbounded)
    pub limit: Option<u64>,

    /// Sort key; ties keep primary-identifier order
    pub sort: Option<(String, SortOrder)>,

    /// Fields removed from every returned document
    pub exclude: Vec<String>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some((field.into(), order));
        self
    }

    pub fn exclude(mut self, field: impl Into<String>) -> Self {
        self.exclude.push(field.into());
        self
    }
}

/// Abstract document collection
///
/// All operations are async and return explicit errors. A write that breaks
/// a unique index fails with [`StoreError::DuplicateKey`] and changes nothing.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Collection name (used in error messages and file names)
    fn name(&self) -> &str;

    /// Insert a document, assigning `_id` if absent and `__v: 0`
    ///
    /// Returns the stored document.
    async fn insert_one(&self, doc: Document) -> StoreResult<Document>;

    /// Insert documents in order, stopping at the first failure
    ///
    /// Documents inserted before the failure stay inserted.
    async fn insert_many(&self, docs: Vec<Document>) -> StoreResult<usize>;

    /// Find matching documents
    async fn find(&self, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>>;

    /// First matching document in primary-identifier order
    async fn find_one(&self, filter: &Filter) -> StoreResult<Option<Document>>;

    /// Document stored under `id`
    async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<Document>>;

    /// Merge `patch` into the document under `id`
    ///
    /// Returns the number of documents matched (0 or 1).
    async fn update_by_id(&self, id: &ObjectId, patch: Document) -> StoreResult<u64>;

    /// Delete the first matching document, returning the deleted count
    async fn delete_one(&self, filter: &Filter) -> StoreResult<u64>;

    /// Delete every matching document, returning the deleted count
    async fn delete_many(&self, filter: &Filter) -> StoreResult<u64>;

    /// Number of matching documents
    async fn count(&self, filter: &Filter) -> StoreResult<u64>;

    /// Classify a failed write
    fn classify(&self, error: &StoreError) -> WriteFailure {
        match error {
            StoreError::DuplicateKey {
                index, key_value, ..
            } => WriteFailure::Duplicate {
                index: index.clone(),
                key_value: key_value.clone(),
            },
            _ => WriteFailure::Other,
        }
    }
}
