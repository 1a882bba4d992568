use bson::{Bson, Document as BsonDocument};

use super::eval::{apply_projection, compare_docs, eval_filter};
use super::types::{Filter, FindOptions, UpdateDoc};
use crate::errors::DbError;
use crate::utils::num::bson_as_f64;

/// Run a parsed find over documents in collection order: filter, stable sort, skip, limit,
/// then projection. A skip past the end yields an empty result.
pub fn run_find<'a>(
    docs: impl IntoIterator<Item = &'a BsonDocument>,
    filter: &Filter,
    opts: &FindOptions,
) -> Vec<BsonDocument> {
    let mut matched: Vec<&BsonDocument> = docs.into_iter().filter(|d| eval_filter(d, filter)).collect();
    if let Some(sort) = &opts.sort {
        matched.sort_by(|a, b| compare_docs(a, b, sort));
    }
    let skip = opts.skip.unwrap_or(0);
    let limit = opts.limit.unwrap_or(usize::MAX);
    matched
        .into_iter()
        .skip(skip)
        .take(limit)
        .map(|d| match &opts.projection {
            Some(p) => apply_projection(d, p),
            None => d.clone(),
        })
        .collect()
}

/// Apply `$set`, `$inc`, `$unset` in place. Returns whether anything changed.
///
/// # Errors
/// Returns `DbError::Query` when `$inc` targets a non-numeric field or a dotted path runs
/// through a value that is not a document. `doc` may be partly updated on error.
pub fn apply_update(doc: &mut BsonDocument, upd: &UpdateDoc) -> Result<bool, DbError> {
    fn ensure_subdoc<'a>(
        root: &'a mut BsonDocument,
        key: &str,
        path: &str,
    ) -> Result<&'a mut BsonDocument, DbError> {
        if root.get(key).is_none() {
            root.insert(key.to_string(), Bson::Document(BsonDocument::new()));
        }
        match root.get_mut(key) {
            Some(Bson::Document(d)) => Ok(d),
            _ => Err(DbError::query(format!("cannot traverse {path}: {key} is not a document"))),
        }
    }
    fn traverse_to_parent<'a>(
        root: &'a mut BsonDocument,
        path: &str,
    ) -> Result<(&'a mut BsonDocument, String), DbError> {
        let mut cur = root;
        let mut iter = path.split('.').peekable();
        let mut last = String::new();
        while let Some(seg) = iter.next() {
            if iter.peek().is_none() {
                last = seg.to_string();
                break;
            }
            cur = ensure_subdoc(cur, seg, path)?;
        }
        Ok((cur, last))
    }
    fn set_path(root: &mut BsonDocument, path: &str, value: Bson) -> Result<bool, DbError> {
        let (parent, last) = traverse_to_parent(root, path)?;
        let old = parent.insert(last, value.clone());
        Ok(old.as_ref() != Some(&value))
    }
    fn unset_path(root: &mut BsonDocument, path: &str) -> Result<bool, DbError> {
        if super::eval::get_path(root, path).is_none() {
            return Ok(false);
        }
        let (parent, last) = traverse_to_parent(root, path)?;
        Ok(parent.remove(&last).is_some())
    }
    fn inc_value(path: &str, cur: Option<&Bson>, by: &Bson) -> Result<Bson, DbError> {
        Ok(match (cur, by) {
            (None | Some(Bson::Null), _) => by.clone(),
            (Some(Bson::Int32(a)), Bson::Int32(b)) => {
                a.checked_add(*b).map_or_else(|| Bson::Int64(i64::from(*a) + i64::from(*b)), Bson::Int32)
            }
            (Some(Bson::Int32(a)), Bson::Int64(b)) => Bson::Int64(i64::from(*a).saturating_add(*b)),
            (Some(Bson::Int64(a)), Bson::Int32(b)) => Bson::Int64(a.saturating_add(i64::from(*b))),
            (Some(Bson::Int64(a)), Bson::Int64(b)) => Bson::Int64(a.saturating_add(*b)),
            (Some(v), _) => match (bson_as_f64(v), bson_as_f64(by)) {
                (Some(x), Some(y)) => Bson::Double(x + y),
                _ => return Err(DbError::query(format!("cannot apply $inc to non-numeric field {path}"))),
            },
        })
    }

    let mut changed = false;
    for (k, v) in &upd.set {
        changed |= set_path(doc, k, v.clone())?;
    }
    for (k, by) in &upd.inc {
        let next = inc_value(k, super::eval::get_path(doc, k), by)?;
        changed |= set_path(doc, k, next)?;
    }
    for k in &upd.unset {
        changed |= unset_path(doc, k)?;
    }
    Ok(changed)
}
