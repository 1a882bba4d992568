use crate::errors::DbError;
use crate::utils::num::bson_to_usize;
use bson::{Bson, Document as BsonDocument};

use super::types::{
    CmpOp, Filter, FindOptions, FindQuery, MAX_FILTER_DEPTH, MAX_IN_SET, MAX_PROJECTION_FIELDS,
    MAX_SORT_FIELDS, MAX_UPDATE_FIELDS, Order, Projection, SortSpec, UpdateDoc,
};

/// Parse a filter literal such as `{genre: "x", published_year: {$gt: 2010}}`.
///
/// Top-level keys are a conjunction; a field whose value is a document starting with a
/// `$`-key is an operator predicate, anything else is implicit equality.
///
/// # Errors
/// Returns `DbError::Query` for unknown operators or malformed operands.
pub fn parse_filter(doc: &BsonDocument) -> Result<Filter, DbError> {
    parse_filter_at(doc, 0)
}

fn parse_filter_at(doc: &BsonDocument, depth: usize) -> Result<Filter, DbError> {
    if depth > MAX_FILTER_DEPTH {
        return Err(DbError::query("filter nested too deeply"));
    }
    let mut parts = Vec::with_capacity(doc.len());
    for (key, value) in doc {
        match key.as_str() {
            "$and" => parts.push(Filter::And(parse_clauses(key, value, depth)?)),
            "$or" => parts.push(Filter::Or(parse_clauses(key, value, depth)?)),
            "$nor" => parts.push(Filter::Not(Box::new(Filter::Or(parse_clauses(key, value, depth)?)))),
            k if k.starts_with('$') => {
                return Err(DbError::query(format!("unknown top-level operator {k}")));
            }
            path => parts.push(parse_field(path, value)?),
        }
    }
    Ok(match parts.len() {
        0 => Filter::True,
        1 => parts.remove(0),
        _ => Filter::And(parts),
    })
}

fn parse_clauses(op: &str, value: &Bson, depth: usize) -> Result<Vec<Filter>, DbError> {
    let Bson::Array(items) = value else {
        return Err(DbError::query(format!("{op} expects an array")));
    };
    if items.is_empty() {
        return Err(DbError::query(format!("{op} expects a non-empty array")));
    }
    items
        .iter()
        .map(|item| match item {
            Bson::Document(d) => parse_filter_at(d, depth + 1),
            _ => Err(DbError::query(format!("{op} entries must be documents"))),
        })
        .collect()
}

fn is_operator_doc(d: &BsonDocument) -> bool {
    d.keys().next().is_some_and(|k| k.starts_with('$'))
}

fn parse_field(path: &str, value: &Bson) -> Result<Filter, DbError> {
    match value {
        Bson::Document(ops) if is_operator_doc(ops) => parse_operators(path, ops),
        _ => Ok(Filter::Cmp { path: path.to_string(), op: CmpOp::Eq, value: value.clone() }),
    }
}

fn parse_operators(path: &str, ops: &BsonDocument) -> Result<Filter, DbError> {
    let mut parts = Vec::with_capacity(ops.len());
    for (op, operand) in ops {
        let cmp = |op: CmpOp| Filter::Cmp { path: path.to_string(), op, value: operand.clone() };
        let part = match op.as_str() {
            "$eq" => cmp(CmpOp::Eq),
            "$ne" => cmp(CmpOp::Ne),
            "$gt" => cmp(CmpOp::Gt),
            "$gte" => cmp(CmpOp::Gte),
            "$lt" => cmp(CmpOp::Lt),
            "$lte" => cmp(CmpOp::Lte),
            "$in" => Filter::In { path: path.to_string(), values: set_operand(op, operand)? },
            "$nin" => Filter::Nin { path: path.to_string(), values: set_operand(op, operand)? },
            "$exists" => Filter::Exists { path: path.to_string(), exists: truthy(operand) },
            "$not" => match operand {
                Bson::Document(inner) if is_operator_doc(inner) => {
                    Filter::Not(Box::new(parse_operators(path, inner)?))
                }
                _ => return Err(DbError::query("$not expects an operator document")),
            },
            other => return Err(DbError::query(format!("unknown operator {other} on {path}"))),
        };
        parts.push(part);
    }
    Ok(if parts.len() == 1 { parts.remove(0) } else { Filter::And(parts) })
}

fn set_operand(op: &str, operand: &Bson) -> Result<Vec<Bson>, DbError> {
    match operand {
        Bson::Array(vals) if vals.len() > MAX_IN_SET => {
            Err(DbError::query(format!("{op} list too long: {}", vals.len())))
        }
        Bson::Array(vals) => Ok(vals.clone()),
        _ => Err(DbError::query(format!("{op} expects an array"))),
    }
}

fn truthy(v: &Bson) -> bool {
    match v {
        Bson::Boolean(b) => *b,
        Bson::Int32(i) => *i != 0,
        Bson::Int64(i) => *i != 0,
        Bson::Double(f) => *f != 0.0,
        Bson::Null => false,
        _ => true,
    }
}

/// Parse an update literal: `{$set: {...}, $inc: {...}, $unset: {...}}`.
///
/// # Errors
/// Returns `DbError::Query` for replacement-style documents (no operators), unknown
/// operators, oversized operator documents, or non-numeric `$inc` amounts.
pub fn parse_update(doc: &BsonDocument) -> Result<UpdateDoc, DbError> {
    let mut out = UpdateDoc::default();
    for (op, operand) in doc {
        let Bson::Document(fields) = operand else {
            return Err(DbError::query(format!("{op} expects a document")));
        };
        if fields.len() > MAX_UPDATE_FIELDS {
            return Err(DbError::query(format!("{op} has too many fields: {}", fields.len())));
        }
        match op.as_str() {
            "$set" => {
                out.set.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            "$inc" => {
                for (k, v) in fields {
                    if !matches!(v, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) {
                        return Err(DbError::query("$inc requires numeric"));
                    }
                    out.inc.push((k.clone(), v.clone()));
                }
            }
            "$unset" => out.unset.extend(fields.keys().cloned()),
            k if k.starts_with('$') => {
                return Err(DbError::query(format!("unknown update operator {k}")));
            }
            k => {
                return Err(DbError::query(format!(
                    "update must use operators; found plain field {k}"
                )));
            }
        }
    }
    if out.is_empty() {
        return Err(DbError::query("update document is empty"));
    }
    Ok(out)
}

/// Parse a direction: `1`/`-1` (any numeric width).
///
/// # Errors
/// Returns `DbError::Query` for anything other than a positive or negative number.
pub fn parse_order(field: &str, v: &Bson) -> Result<Order, DbError> {
    let n = match v {
        Bson::Int32(i) => i64::from(*i),
        Bson::Int64(i) => *i,
        Bson::Double(f) if *f > 0.0 => 1,
        Bson::Double(f) if *f < 0.0 => -1,
        _ => 0,
    };
    match n.signum() {
        1 => Ok(Order::Asc),
        -1 => Ok(Order::Desc),
        _ => Err(DbError::query(format!("invalid direction for {field}"))),
    }
}

/// Parse a sort literal such as `{price: -1}`.
///
/// # Errors
/// Returns `DbError::Query` for invalid directions or too many keys.
pub fn parse_sort(doc: &BsonDocument) -> Result<Vec<SortSpec>, DbError> {
    if doc.len() > MAX_SORT_FIELDS {
        return Err(DbError::query(format!("sort spec too long: {}", doc.len())));
    }
    doc.iter()
        .map(|(field, v)| Ok(SortSpec { field: field.clone(), order: parse_order(field, v)? }))
        .collect()
}

/// Parse a projection literal such as `{_id: 0, title: 1}`.
///
/// # Errors
/// Returns `DbError::Query` when inclusion and exclusion are mixed on fields other than `_id`.
pub fn parse_projection(doc: &BsonDocument) -> Result<Projection, DbError> {
    if doc.len() > MAX_PROJECTION_FIELDS {
        return Err(DbError::query(format!("projection too long: {}", doc.len())));
    }
    let mut include = Vec::new();
    let mut exclude = Vec::new();
    let mut id = true;
    for (field, v) in doc {
        let keep = truthy(v);
        if field == crate::book::fields::ID {
            id = keep;
        } else if keep {
            include.push(field.clone());
        } else {
            exclude.push(field.clone());
        }
    }
    match (include.is_empty(), exclude.is_empty()) {
        (false, false) => Err(DbError::query("cannot mix inclusion and exclusion in projection")),
        (false, true) => Ok(Projection::Include { fields: include, id }),
        // `{_id: 1}` alone keeps only the id
        (true, true) if id && !doc.is_empty() => Ok(Projection::Include { fields: include, id }),
        (true, _) => {
            if !id {
                exclude.push(crate::book::fields::ID.to_string());
            }
            Ok(Projection::Exclude { fields: exclude })
        }
    }
}

/// Parse every literal of a [`FindQuery`].
///
/// # Errors
/// Propagates filter, sort, and projection parse errors.
pub fn parse_find(q: &FindQuery) -> Result<(Filter, FindOptions), DbError> {
    let filter = parse_filter(&q.filter)?;
    let opts = FindOptions {
        projection: q.projection.as_ref().map(parse_projection).transpose()?,
        sort: q.sort.as_ref().map(parse_sort).transpose()?,
        skip: q.skip.map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
        limit: q.limit.map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
    };
    Ok((filter, opts))
}

/// # Errors
/// Returns an error if the JSON string cannot be parsed into a filter.
pub fn parse_filter_json(json: &str) -> Result<Filter, DbError> {
    parse_filter(&crate::utils::json::parse_json_to_bson_document(json)?)
}

/// # Errors
/// Returns an error if the JSON string cannot be parsed into an update.
pub fn parse_update_json(json: &str) -> Result<UpdateDoc, DbError> {
    parse_update(&crate::utils::json::parse_json_to_bson_document(json)?)
}

/// Numeric stage argument (`$limit`, `$skip`, `$substr` bounds).
pub(crate) fn usize_arg(op: &str, v: &Bson) -> Result<usize, DbError> {
    bson_to_usize(v).ok_or_else(|| DbError::query(format!("{op} expects a non-negative integer")))
}
