//! Document Collection
//!
//! The embedded document store: an ordered map of documents plus unique
//! indexes, made durable by the WAL.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};

use crate::config::WalSyncStrategy;
use crate::wal::{Operation, WalRecovery, WalWriter};

use super::query::{compare_values, index_key};
use super::{
    Collection, Document, Filter, FindOptions, ObjectId, SortOrder, StoreError, StoreResult,
    ID_FIELD, VERSION_FIELD,
};

/// Index name reported for primary-identifier conflicts
const ID_INDEX: &str = "_id_";

/// Static settings of a collection
#[derive(Debug, Clone)]
pub struct CollectionOptions {
    /// Collection name; the WAL file is `{name}.wal`
    pub name: String,

    /// Fields carrying a unique index, checked in this order
    ///
    /// Indexes are sparse: documents without the field are not indexed.
    pub unique: Vec<String>,

    /// Sync strategy for the WAL
    pub wal_sync_strategy: WalSyncStrategy,
}

impl CollectionOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unique: Vec::new(),
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
        }
    }

    /// Add a unique index on `field`
    pub fn unique(mut self, field: impl Into<String>) -> Self {
        self.unique.push(field.into());
        self
    }

    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.wal_sync_strategy = strategy;
        self
    }
}

/// Documents plus their unique indexes
#[derive(Default)]
struct State {
    docs: BTreeMap<ObjectId, Document>,

    /// field → canonical value → owner
    indexes: HashMap<String, HashMap<String, ObjectId>>,
}

/// Embedded document collection
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes**: serialized by `write_lock`. Each write validates against
///   the current state, appends to the WAL, then applies under the state
///   write lock, so a unique-index check and its write are atomic.
/// - **Reads**: take the state read lock only (many concurrent readers).
///
/// Writes block on the WAL (and fsync), so the async [`Collection`] methods
/// that write run them on tokio's blocking pool. Reads stay inline.
pub struct DocumentCollection {
    inner: Arc<Inner>,
}

struct Inner {
    options: CollectionOptions,

    /// Where the WAL lives (`None` for in-memory collections)
    wal_path: Option<PathBuf>,

    /// Write-ahead log (exclusive access needed)
    wal: Mutex<Option<WalWriter>>,

    state: RwLock<State>,

    /// Serializes write operations
    write_lock: Mutex<()>,
}

impl DocumentCollection {
    /// Open or create a collection stored under `dir`
    ///
    /// On startup:
    /// 1. Create the directory if needed
    /// 2. Recover the WAL if it exists and replay it
    /// 3. Checkpoint: rewrite the WAL as one insert per live document
    pub fn open(dir: &Path, options: CollectionOptions) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;
        let wal_path = dir.join(format!("{}.wal", options.name));

        let mut state = State::default();
        let writer = if wal_path.exists() {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
                tracing::info!(
                    "[{}] WAL recovery: {} entries recovered, {} corrupted, last_lsn={}",
                    options.name,
                    recovery.entries_recovered,
                    recovery.entries_corrupted,
                    recovery.last_lsn
                );
            }

            for entry in entries {
                state.replay(&options.unique, entry.operation)?;
            }

            let live = state.snapshot()?;
            tracing::debug!("[{}] Checkpointing {} live documents", options.name, live.len());

            let mut writer = WalWriter::open(&wal_path, options.wal_sync_strategy)?;
            writer.checkpoint(live)?;
            writer
        } else {
            WalWriter::open(&wal_path, options.wal_sync_strategy)?
        };

        Ok(Self::from_inner(Inner {
            options,
            wal_path: Some(wal_path),
            wal: Mutex::new(Some(writer)),
            state: RwLock::new(state),
            write_lock: Mutex::new(()),
        }))
    }

    /// A collection that lives only in memory
    pub fn in_memory(options: CollectionOptions) -> Self {
        Self::from_inner(Inner {
            options,
            wal_path: None,
            wal: Mutex::new(None),
            state: RwLock::new(State::default()),
            write_lock: Mutex::new(()),
        })
    }

    fn from_inner(inner: Inner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Rewrite the WAL so it holds only the live documents
    ///
    /// On failure the current log stays in use.
    pub fn compact(&self) -> StoreResult<()> {
        self.inner.compact()
    }

    /// Sync the WAL to disk
    pub fn sync(&self) -> StoreResult<()> {
        self.inner.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn options(&self) -> &CollectionOptions {
        &self.inner.options
    }

    /// Path of the WAL file, if persistent
    pub fn wal_path(&self) -> Option<&Path> {
        self.inner.wal_path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.inner.state.read().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.read().docs.is_empty()
    }

    /// Run a write on the blocking pool
    async fn blocking<T, F>(&self, write: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Inner) -> StoreResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || write(&inner))
            .await
            .map_err(std::io::Error::from)?
    }
}

impl Inner {
    // =========================================================================
    // Writes
    // =========================================================================

    fn insert_document(&self, mut doc: Document) -> StoreResult<Document> {
        let _write_guard = self.write_lock.lock();

        let id = match doc.get(ID_FIELD) {
            None => ObjectId::new(),
            Some(Value::String(s)) => s.parse()?,
            Some(other) => {
                return Err(StoreError::InvalidDocument(format!(
                    "{} must be an ObjectId string, got {}",
                    ID_FIELD, other
                )))
            }
        };
        doc.insert(ID_FIELD.to_string(), Value::String(id.to_hex()));
        doc.entry(VERSION_FIELD.to_string()).or_insert(json!(0));

        {
            let state = self.state.read();
            if state.docs.contains_key(&id) {
                return Err(self.duplicate(ID_INDEX, ID_FIELD, &Value::String(id.to_hex())));
            }
            self.check_unique(&state, &doc, None)?;
        }

        self.log(Operation::Insert {
            id: id.to_hex(),
            document: serde_json::to_string(&doc)?,
        })?;

        self.state.write().insert(&self.options.unique, id, doc.clone());
        Ok(doc)
    }

    fn update_document(&self, id: &ObjectId, mut patch: Document) -> StoreResult<u64> {
        let _write_guard = self.write_lock.lock();

        patch.remove(ID_FIELD);

        {
            let state = self.state.read();
            let Some(current) = state.docs.get(id) else {
                return Ok(0);
            };

            let mut merged = current.clone();
            merged.extend(patch.clone());
            self.check_unique(&state, &merged, Some(id))?;
        }

        if patch.is_empty() {
            return Ok(1);
        }

        self.log(Operation::Update {
            id: id.to_hex(),
            patch: serde_json::to_string(&patch)?,
        })?;

        self.state.write().update(&self.options.unique, id, patch);
        Ok(1)
    }

    fn delete_documents(&self, filter: &Filter, at_most_one: bool) -> StoreResult<u64> {
        let _write_guard = self.write_lock.lock();

        if filter == &Filter::All && !at_most_one {
            let count = self.state.read().docs.len() as u64;
            if count > 0 {
                self.log(Operation::Clear)?;
                self.state.write().clear();
            }
            return Ok(count);
        }

        let targets: Vec<ObjectId> = {
            let state = self.state.read();
            let matching = state
                .docs
                .iter()
                .filter(|(id, doc)| filter.matches(id, doc))
                .map(|(id, _)| *id);
            if at_most_one {
                matching.take(1).collect()
            } else {
                matching.collect()
            }
        };

        for id in &targets {
            self.log(Operation::Delete { id: id.to_hex() })?;
            self.state.write().remove(id);
        }

        Ok(targets.len() as u64)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    fn find_documents(&self, filter: &Filter, options: &FindOptions) -> Vec<Document> {
        let state = self.state.read();

        let mut matching: Vec<&Document> = match filter {
            Filter::Id(id) => state.docs.get(id).into_iter().collect(),
            _ => state
                .docs
                .iter()
                .filter(|(id, doc)| filter.matches(id, doc))
                .map(|(_, doc)| doc)
                .collect(),
        };

        if let Some((field, order)) = &options.sort {
            matching.sort_by(|a, b| {
                let ord = compare_values(a.get(field), b.get(field));
                match order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            });
        }

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        matching
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|doc| {
                let mut doc = doc.clone();
                for field in &options.exclude {
                    doc.remove(field);
                }
                doc
            })
            .collect()
    }

    fn first_match(&self, filter: &Filter) -> Option<Document> {
        let state = self.state.read();
        match filter {
            Filter::Id(id) => state.docs.get(id).cloned(),
            _ => state
                .docs
                .iter()
                .find(|(id, doc)| filter.matches(id, doc))
                .map(|(_, doc)| doc.clone()),
        }
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    fn compact(&self) -> StoreResult<()> {
        let _write_guard = self.write_lock.lock();
        let mut wal = self.wal.lock();

        let Some(writer) = wal.as_mut() else {
            return Ok(());
        };

        let live = self.state.read().snapshot()?;
        writer.checkpoint(live).map_err(|e| {
            tracing::error!("[{}] Compaction failed, keeping current WAL: {}", self.options.name, e);
            e
        })
    }

    fn sync(&self) -> StoreResult<()> {
        match self.wal.lock().as_mut() {
            Some(writer) => writer.sync(),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn log(&self, operation: Operation) -> StoreResult<()> {
        if let Some(writer) = self.wal.lock().as_mut() {
            writer.append(operation)?;
        }
        Ok(())
    }

    /// Fail if any unique field of `doc` is owned by a document other than `this`
    fn check_unique(&self, state: &State, doc: &Document, this: Option<&ObjectId>) -> StoreResult<()> {
        for field in &self.options.unique {
            let Some(value) = doc.get(field).filter(|v| !v.is_null()) else {
                continue;
            };
            let owner = state
                .indexes
                .get(field)
                .and_then(|index| index.get(&index_key(value)));

            if let Some(owner) = owner {
                if Some(owner) != this {
                    return Err(self.duplicate(&format!("{}_1", field), field, value));
                }
            }
        }
        Ok(())
    }

    fn duplicate(&self, index: &str, field: &str, value: &Value) -> StoreError {
        let mut key_value = serde_json::Map::new();
        key_value.insert(field.to_string(), value.clone());

        StoreError::DuplicateKey {
            collection: self.options.name.clone(),
            index: index.to_string(),
            key_value: Value::Object(key_value),
        }
    }
}

impl State {
    /// One insert per live document, in identifier order
    fn snapshot(&self) -> StoreResult<Vec<Operation>> {
        self.docs
            .iter()
            .map(|(id, doc)| -> StoreResult<Operation> {
                Ok(Operation::Insert {
                    id: id.to_hex(),
                    document: serde_json::to_string(doc)?,
                })
            })
            .collect()
    }

    fn insert(&mut self, unique: &[String], id: ObjectId, doc: Document) {
        self.index(unique, &id, &doc);
        self.docs.insert(id, doc);
    }

    fn update(&mut self, unique: &[String], id: &ObjectId, patch: Document) {
        let Some(mut doc) = self.docs.remove(id) else {
            return;
        };
        self.unindex(&doc);
        doc.extend(patch);
        self.index(unique, id, &doc);
        self.docs.insert(*id, doc);
    }

    fn remove(&mut self, id: &ObjectId) {
        if let Some(doc) = self.docs.remove(id) {
            self.unindex(&doc);
        }
    }

    fn clear(&mut self) {
        self.docs.clear();
        self.indexes.values_mut().for_each(HashMap::clear);
    }

    /// Apply a logged operation during recovery
    fn replay(&mut self, unique: &[String], operation: Operation) -> StoreResult<()> {
        match operation {
            Operation::Insert { id, document } => {
                let id: ObjectId = id.parse()?;
                let doc: Document = serde_json::from_str(&document)?;
                self.remove(&id);
                self.insert(unique, id, doc);
            }
            Operation::Update { id, patch } => {
                let id: ObjectId = id.parse()?;
                let patch: Document = serde_json::from_str(&patch)?;
                self.update(unique, &id, patch);
            }
            Operation::Delete { id } => {
                let id: ObjectId = id.parse()?;
                self.remove(&id);
            }
            Operation::Clear => self.clear(),
        }
        Ok(())
    }

    fn index(&mut self, unique: &[String], id: &ObjectId, doc: &Document) {
        for field in unique {
            if let Some(value) = doc.get(field).filter(|v| !v.is_null()) {
                self.indexes
                    .entry(field.clone())
                    .or_default()
                    .insert(index_key(value), *id);
            }
        }
    }

    fn unindex(&mut self, doc: &Document) {
        for (field, index) in self.indexes.iter_mut() {
            if let Some(value) = doc.get(field) {
                index.remove(&index_key(value));
            }
        }
    }
}

#[async_trait]
impl Collection for DocumentCollection {
    fn name(&self) -> &str {
        &self.inner.options.name
    }

    async fn insert_one(&self, doc: Document) -> StoreResult<Document> {
        self.blocking(move |inner| inner.insert_document(doc)).await
    }

    async fn insert_many(&self, docs: Vec<Document>) -> StoreResult<usize> {
        self.blocking(move |inner| {
            let mut inserted = 0;
            for doc in docs {
                inner.insert_document(doc)?;
                inserted += 1;
            }
            Ok(inserted)
        })
        .await
    }

    async fn find(&self, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>> {
        Ok(self.inner.find_documents(filter, options))
    }

    async fn find_one(&self, filter: &Filter) -> StoreResult<Option<Document>> {
        Ok(self.inner.first_match(filter))
    }

    async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<Document>> {
        Ok(self.inner.state.read().docs.get(id).cloned())
    }

    async fn update_by_id(&self, id: &ObjectId, patch: Document) -> StoreResult<u64> {
        let id = *id;
        self.blocking(move |inner| inner.update_document(&id, patch)).await
    }

    async fn delete_one(&self, filter: &Filter) -> StoreResult<u64> {
        let filter = filter.clone();
        self.blocking(move |inner| inner.delete_documents(&filter, true)).await
    }

    async fn delete_many(&self, filter: &Filter) -> StoreResult<u64> {
        let filter = filter.clone();
        self.blocking(move |inner| inner.delete_documents(&filter, false)).await
    }

    async fn count(&self, filter: &Filter) -> StoreResult<u64> {
        let state = self.inner.state.read();
        Ok(state
            .docs
            .iter()
            .filter(|(id, doc)| filter.matches(id, doc))
            .count() as u64)
    }
}
