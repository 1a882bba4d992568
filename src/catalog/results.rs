use bson::{Bson, Document as BsonDocument};
use serde::Serialize;

use crate::book::fields;
use crate::errors::DbError;
use crate::utils::num::bson_as_f64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreStats {
    pub genre: String,
    /// `None` when no book in the genre has a numeric price.
    pub avg_price: Option<f64>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorCount {
    pub author: String,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecadeCount {
    pub decade: String,
    pub count: u64,
}

fn id_string(doc: &BsonDocument) -> Result<String, DbError> {
    match doc.get(fields::ID) {
        Some(Bson::String(s)) => Ok(s.clone()),
        // books without the grouped field collapse into a null group
        Some(Bson::Null) | None => Ok(String::new()),
        Some(other) => Err(DbError::Schema(format!("group key is not a string: {other}"))),
    }
}

fn count(doc: &BsonDocument, field: &str) -> Result<u64, DbError> {
    match doc.get(field) {
        Some(Bson::Int32(n)) => u64::try_from(*n).map_err(|_| DbError::Schema(format!("negative {field}"))),
        Some(Bson::Int64(n)) => u64::try_from(*n).map_err(|_| DbError::Schema(format!("negative {field}"))),
        _ => Err(DbError::Schema(format!("missing integer field `{field}`"))),
    }
}

impl GenreStats {
    /// From `{_id: genre, avgPrice, count}`.
    ///
    /// # Errors
    /// Returns `DbError::Schema` if the group document has another shape.
    pub fn from_document(doc: &BsonDocument) -> Result<Self, DbError> {
        Ok(Self {
            genre: id_string(doc)?,
            avg_price: doc.get("avgPrice").and_then(bson_as_f64),
            count: count(doc, "count")?,
        })
    }
}

impl AuthorCount {
    /// From `{_id: author, total}`.
    ///
    /// # Errors
    /// Returns `DbError::Schema` if the group document has another shape.
    pub fn from_document(doc: &BsonDocument) -> Result<Self, DbError> {
        Ok(Self { author: id_string(doc)?, total: count(doc, "total")? })
    }
}

impl DecadeCount {
    /// From `{_id: decade, count}`.
    ///
    /// # Errors
    /// Returns `DbError::Schema` if the group document has another shape.
    pub fn from_document(doc: &BsonDocument) -> Result<Self, DbError> {
        Ok(Self { decade: id_string(doc)?, count: count(doc, "count")? })
    }
}
