//! The book record: the only entity in the `books` collection.

use crate::errors::DbError;
use crate::utils::num::bson_as_f64;
use bson::{Bson, Document as BsonDocument};
use serde::{Deserialize, Serialize};

/// Field names as stored in the collection.
pub mod fields {
    pub const ID: &str = "_id";
    pub const TITLE: &str = "title";
    pub const AUTHOR: &str = "author";
    pub const GENRE: &str = "genre";
    pub const PUBLISHED_YEAR: &str = "published_year";
    pub const PRICE: &str = "price";
    pub const IN_STOCK: &str = "in_stock";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_year: i32,
    pub price: f64,
    pub in_stock: bool,
}

impl Book {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
        published_year: i32,
        price: f64,
        in_stock: bool,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
            published_year,
            price,
            in_stock,
        }
    }

    /// Stored shape, without `_id` (the store assigns one).
    #[must_use]
    pub fn to_document(&self) -> BsonDocument {
        let mut d = BsonDocument::new();
        d.insert(fields::TITLE, self.title.as_str());
        d.insert(fields::AUTHOR, self.author.as_str());
        d.insert(fields::GENRE, self.genre.as_str());
        d.insert(fields::PUBLISHED_YEAR, self.published_year);
        d.insert(fields::PRICE, self.price);
        d.insert(fields::IN_STOCK, self.in_stock);
        d
    }

    /// Read a full record back. Extra fields such as `_id` are ignored; numeric fields accept
    /// any BSON number.
    ///
    /// # Errors
    /// Returns `DbError::Schema` if a field is missing or has the wrong type.
    pub fn from_document(doc: &BsonDocument) -> Result<Self, DbError> {
        Ok(Self {
            title: get_string(doc, fields::TITLE)?,
            author: get_string(doc, fields::AUTHOR)?,
            genre: get_string(doc, fields::GENRE)?,
            published_year: get_year(doc)?,
            price: get_number(doc, fields::PRICE)?,
            in_stock: match doc.get(fields::IN_STOCK) {
                Some(Bson::Boolean(b)) => *b,
                other => return Err(type_error(fields::IN_STOCK, "boolean", other)),
            },
        })
    }
}

fn type_error(field: &str, expected: &str, found: Option<&Bson>) -> DbError {
    match found {
        None => DbError::Schema(format!("missing field `{field}`")),
        Some(v) => DbError::Schema(format!(
            "field `{field}` expected {expected}, found {:?}",
            v.element_type()
        )),
    }
}

fn get_string(doc: &BsonDocument, field: &str) -> Result<String, DbError> {
    match doc.get(field) {
        Some(Bson::String(s)) => Ok(s.clone()),
        other => Err(type_error(field, "string", other)),
    }
}

fn get_number(doc: &BsonDocument, field: &str) -> Result<f64, DbError> {
    let v = doc.get(field);
    v.and_then(bson_as_f64).ok_or_else(|| type_error(field, "number", v))
}

fn get_year(doc: &BsonDocument) -> Result<i32, DbError> {
    let v = doc.get(fields::PUBLISHED_YEAR);
    match v {
        Some(Bson::Int32(y)) => Ok(*y),
        Some(Bson::Int64(y)) => i32::try_from(*y)
            .map_err(|_| DbError::Schema(format!("published_year out of range: {y}"))),
        Some(Bson::Double(y)) if y.fract() == 0.0 && y.abs() <= f64::from(i32::MAX) => {
            #[allow(clippy::cast_possible_truncation)]
            Ok(*y as i32)
        }
        other => Err(type_error(fields::PUBLISHED_YEAR, "integer", other)),
    }
}

/// Convert many documents, failing on the first malformed one.
///
/// # Errors
/// See [`Book::from_document`].
pub fn books_from_documents<'a>(
    docs: impl IntoIterator<Item = &'a BsonDocument>,
) -> Result<Vec<Book>, DbError> {
    docs.into_iter().map(Book::from_document).collect()
}
