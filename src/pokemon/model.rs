//! Record and payload types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PokedexError, Result};
use crate::store::{CollectionOptions, Document, ObjectId};

/// Name of the backing collection
pub const COLLECTION_NAME: &str = "pokemons";

/// A stored creature record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pokemon {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    /// Unique secondary key
    pub no: u32,

    /// Always lowercase
    pub name: String,

    #[serde(rename = "__v", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    /// Fields not modelled above, kept verbatim
    #[serde(flatten)]
    pub extra: Document,
}

impl Pokemon {
    /// Collection layout the gateway expects: unique `name` and `no`
    pub fn collection_options() -> CollectionOptions {
        CollectionOptions::new(COLLECTION_NAME)
            .unique("name")
            .unique("no")
    }

    pub fn from_document(doc: Document) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(doc))
    }

    pub fn to_document(&self) -> serde_json::Result<Document> {
        match serde_json::to_value(self)? {
            Value::Object(doc) => Ok(doc),
            _ => Ok(Document::new()),
        }
    }
}

/// Payload for creating a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePokemon {
    pub no: i64,
    pub name: String,

    #[serde(flatten)]
    pub extra: Document,
}

impl CreatePokemon {
    pub fn new(no: i64, name: impl Into<String>) -> Self {
        Self {
            no,
            name: name.into(),
            extra: Document::new(),
        }
    }

    /// Attach an additional field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_no(self.no)?;
        validate_name(&self.name)
    }

    pub(crate) fn into_document(self) -> Document {
        let mut doc = self.extra;
        doc.insert("no".to_string(), Value::from(self.no));
        doc.insert("name".to_string(), Value::String(self.name));
        doc
    }
}

/// Partial update payload; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePokemon {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub extra: Document,
}

impl UpdatePokemon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn no(mut self, no: i64) -> Self {
        self.no = Some(no);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(no) = self.no {
            validate_no(no)?;
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        Ok(())
    }

    /// Fields to `$set`, identifiers and version metadata removed
    ///
    /// `no` and `name` only come from the typed fields.
    pub(crate) fn into_document(self) -> Document {
        let mut doc = self.extra;
        for key in ["_id", "__v", "no", "name"] {
            doc.remove(key);
        }
        if let Some(no) = self.no {
            doc.insert("no".to_string(), Value::from(no));
        }
        if let Some(name) = self.name {
            doc.insert("name".to_string(), Value::String(name));
        }
        doc
    }
}

fn validate_no(no: i64) -> Result<()> {
    if no < 1 || no > i64::from(u32::MAX) {
        return Err(PokedexError::BadRequest(
            "no must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(PokedexError::BadRequest(
            "name must be longer than or equal to 1 characters".to_string(),
        ));
    }
    Ok(())
}
