//! Secondary indexes: declared key patterns, a B-tree per pattern, and the plan choice
//! between a collection scan and an index probe.

pub mod btree;
pub mod explain;

use bson::{Bson, Document as BsonDocument};

use crate::errors::DbError;
use crate::query::{Filter, Order, parse_order};
use crate::types::RecordId;

pub use btree::{BTreeIndex, CompoundKey, DirKey, IndexKeyKind, IndexScan, ValueKey, key_from_bson, value_key};
pub use explain::{ExplainReport, PlanStage};

/// An index declaration as the store receives it: `createIndex(keys, {name})`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexModel {
    pub keys: BsonDocument,
    pub name: Option<String>,
}

impl IndexModel {
    #[must_use]
    pub const fn new(keys: BsonDocument) -> Self {
        Self { keys, name: None }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Parsed key pattern plus its resolved name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub keys: Vec<(String, Order)>,
}

impl IndexSpec {
    /// # Errors
    /// Returns `DbError::Query` for an empty key pattern or a direction other than 1 / -1.
    pub fn from_model(model: &IndexModel) -> Result<Self, DbError> {
        if model.keys.is_empty() {
            return Err(DbError::query("index key pattern is empty"));
        }
        let keys = model
            .keys
            .iter()
            .map(|(field, v)| Ok((field.clone(), parse_order(field, v)?)))
            .collect::<Result<Vec<_>, DbError>>()?;
        let name = model.name.clone().unwrap_or_else(|| default_name(&keys));
        Ok(Self { name, keys })
    }

    /// Key pattern back as a document, e.g. `{author: 1, published_year: -1}`.
    #[must_use]
    pub fn keys_document(&self) -> BsonDocument {
        let mut d = BsonDocument::new();
        for (field, order) in &self.keys {
            d.insert(field.clone(), Bson::Int32(order.as_i32()));
        }
        d
    }

    #[must_use]
    pub fn to_model(&self) -> IndexModel {
        IndexModel::new(self.keys_document()).with_name(self.name.clone())
    }

    #[must_use]
    pub fn leading_field(&self) -> &str {
        self.keys.first().map_or("", |(f, _)| f.as_str())
    }
}

/// `title_1`, `author_1_published_year_-1`.
#[must_use]
pub fn default_name(keys: &[(String, Order)]) -> String {
    keys.iter()
        .map(|(f, o)| format!("{f}_{}", o.as_i32()))
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(Debug, Default)]
pub struct IndexManager {
    // declaration order; the first applicable index wins
    pub indexes: Vec<BTreeIndex>,
}

impl IndexManager {
    #[must_use]
    pub const fn new() -> Self {
        Self { indexes: Vec::new() }
    }

    /// Create an index and build it over `docs`. Re-creating an identical key pattern
    /// returns the existing name.
    ///
    /// # Errors
    /// Returns `DbError::Query` when the name or the key pattern is already taken by a
    /// different declaration.
    pub fn create_index<'a>(
        &mut self,
        spec: IndexSpec,
        docs: impl IntoIterator<Item = (RecordId, &'a BsonDocument)>,
    ) -> Result<(String, bool), DbError> {
        if let Some(existing) = self.indexes.iter().find(|i| i.spec.keys == spec.keys) {
            if existing.spec.name == spec.name {
                return Ok((spec.name, false));
            }
            return Err(DbError::query(format!(
                "index with the same keys already exists as {}",
                existing.spec.name
            )));
        }
        if self.indexes.iter().any(|i| i.spec.name == spec.name) {
            return Err(DbError::query(format!("index {} exists with different keys", spec.name)));
        }
        let mut idx = BTreeIndex::new(spec);
        for (id, doc) in docs {
            idx.insert(doc, id);
        }
        let name = idx.spec.name.clone();
        self.indexes.push(idx);
        Ok((name, true))
    }

    /// # Errors
    /// Returns `DbError::NoSuchIndex` when no index has that name.
    pub fn drop_index(&mut self, name: &str) -> Result<(), DbError> {
        let pos = self
            .indexes
            .iter()
            .position(|i| i.spec.name == name)
            .ok_or_else(|| DbError::NoSuchIndex(name.to_owned()))?;
        self.indexes.remove(pos);
        Ok(())
    }

    #[must_use]
    pub fn descriptors(&self) -> Vec<IndexSpec> {
        self.indexes.iter().map(|i| i.spec.clone()).collect()
    }

    pub fn insert_all(&mut self, doc: &BsonDocument, id: RecordId) {
        for idx in &mut self.indexes {
            idx.insert(doc, id);
        }
    }

    pub fn remove_all(&mut self, doc: &BsonDocument, id: RecordId) {
        for idx in &mut self.indexes {
            idx.remove(doc, id);
        }
    }

    /// Probe the first index whose leading key the filter pins with an equality.
    /// `None` means no index applies and the caller scans the collection.
    pub fn lookup_eq(&self, filter: &Filter) -> Option<(IndexSpec, IndexScan)> {
        self.indexes.iter().find_map(|idx| {
            let v = filter.eq_value(idx.spec.leading_field())?;
            let scan = idx.lookup_prefix_eq(v)?;
            Some((idx.spec.clone(), scan))
        })
    }
}
