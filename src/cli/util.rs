use bson::{Bson, Document as BsonDocument};

use crate::errors::DbError;
use crate::query::Order;

/// `"-price,title"` to `{price: -1, title: 1}`. A leading `+` is accepted too.
///
/// # Errors
/// Returns `DbError::Query` when no field is named.
pub fn parse_sort_arg(s: &str) -> Result<BsonDocument, DbError> {
    let mut doc = BsonDocument::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (order, field) = if let Some(rest) = part.strip_prefix('-') {
            (Order::Desc, rest)
        } else if let Some(rest) = part.strip_prefix('+') {
            (Order::Asc, rest)
        } else {
            (Order::Asc, part)
        };
        doc.insert(field, order.as_i32());
    }
    if doc.is_empty() {
        return Err(DbError::query(format!("empty sort argument {s:?}")));
    }
    Ok(doc)
}

/// `"title,author"` to the inclusion projection `{title: 1, author: 1}`; `"-_id"` excludes
/// `_id`.
///
/// # Errors
/// Returns `DbError::Query` when no field is named.
pub fn parse_project_arg(s: &str) -> Result<BsonDocument, DbError> {
    let mut doc = BsonDocument::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.strip_prefix('-') {
            Some(field) => doc.insert(field, 0),
            None => doc.insert(part, 1),
        };
    }
    if doc.is_empty() {
        return Err(DbError::query(format!("empty projection argument {s:?}")));
    }
    Ok(doc)
}

/// `asc` / `desc` (also `1` / `-1`).
///
/// # Errors
/// Returns `DbError::Query` for anything else.
pub fn parse_order_arg(s: &str) -> Result<Order, DbError> {
    match s.to_ascii_lowercase().as_str() {
        "asc" | "1" => Ok(Order::Asc),
        "desc" | "-1" => Ok(Order::Desc),
        other => Err(DbError::query(format!("unknown sort order {other:?}"))),
    }
}

/// Scalar as text for `key=value` output; strings are not quoted.
#[must_use]
pub fn plain_value(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "null".into(),
        other => other.to_string(),
    }
}

/// BSON scalar as relaxed JSON, used for rendering documents.
#[must_use]
pub fn bson_to_json(v: &Bson) -> serde_json::Value {
    match v {
        Bson::ObjectId(oid) => serde_json::Value::String(oid.to_hex()),
        Bson::Document(d) => {
            serde_json::Value::Object(d.iter().map(|(k, v)| (k.clone(), bson_to_json(v))).collect())
        }
        Bson::Array(a) => serde_json::Value::Array(a.iter().map(bson_to_json).collect()),
        other => other.clone().into_relaxed_extjson(),
    }
}
