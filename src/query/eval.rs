use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;

use super::types::{
    CmpOp, Filter, MAX_PATH_DEPTH, MAX_SORT_FIELDS, Order, Projection, SortSpec,
};
use crate::utils::num::bson_as_f64;

pub fn eval_filter(doc: &BsonDocument, filter: &Filter) -> bool {
    match filter {
        Filter::True => true,
        Filter::And(fs) => fs.iter().all(|f| eval_filter(doc, f)),
        Filter::Or(fs) => fs.iter().any(|f| eval_filter(doc, f)),
        Filter::Not(f) => !eval_filter(doc, f),
        Filter::Exists { path, exists } => get_path(doc, path).is_some() == *exists,
        Filter::In { path, values } => get_path(doc, path).is_some_and(|v| is_in_set(v, values)),
        Filter::Nin { path, values } => !get_path(doc, path).is_some_and(|v| is_in_set(v, values)),
        Filter::Cmp { path, op, value } => match (get_path(doc, path), op) {
            (Some(v), CmpOp::Eq) => bson_eq(v, value),
            (Some(v), CmpOp::Ne) => !bson_eq(v, value),
            // missing field equals null, differs from everything else
            (None, CmpOp::Eq) => matches!(value, Bson::Null),
            (None, CmpOp::Ne) => !matches!(value, Bson::Null),
            (None, _) => false,
            (Some(v), op) => {
                // range operators only match within the same type class
                if type_class(v) != type_class(value) {
                    return false;
                }
                let c = compare_bson(v, value);
                match op {
                    CmpOp::Gt => c == Ordering::Greater,
                    CmpOp::Gte => c != Ordering::Less,
                    CmpOp::Lt => c == Ordering::Less,
                    CmpOp::Lte => c != Ordering::Greater,
                    CmpOp::Eq => c == Ordering::Equal,
                    CmpOp::Ne => c != Ordering::Equal,
                }
            }
        },
    }
}

pub fn compare_docs(a: &BsonDocument, b: &BsonDocument, sort: &[SortSpec]) -> Ordering {
    for s in sort.iter().take(MAX_SORT_FIELDS) {
        let ord = match (get_path(a, &s.field), get_path(b, &s.field)) {
            (Some(x), Some(y)) => compare_bson(x, y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return if matches!(s.order, Order::Asc) { ord } else { ord.reverse() };
        }
    }
    Ordering::Equal
}

fn is_in_set(v: &Bson, set: &[Bson]) -> bool {
    set.iter().any(|x| bson_eq(v, x))
}

/// Resolve a dotted path. Returns `None` for missing segments or non-document parents.
pub fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let mut parts = path.split('.');
    let mut cur = doc.get(parts.next()?)?;
    for (depth, part) in parts.enumerate() {
        if depth + 1 >= MAX_PATH_DEPTH {
            return None;
        }
        match cur {
            Bson::Document(d) => cur = d.get(part)?,
            _ => return None,
        }
    }
    Some(cur)
}

fn is_num(x: &Bson) -> bool {
    matches!(x, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_))
}

/// Equality with numeric widening: `Int32(5)` equals `Double(5.0)`.
pub fn bson_eq(a: &Bson, b: &Bson) -> bool {
    if is_num(a) && is_num(b) {
        return compare_bson(a, b) == Ordering::Equal;
    }
    a == b
}

/// Total order over BSON values: numbers compare by value across widths, strings and
/// booleans compare naturally, other mixes order by type class.
pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    if is_num(a) && is_num(b) {
        let x = bson_as_f64(a).unwrap_or(f64::NAN);
        let y = bson_as_f64(b).unwrap_or(f64::NAN);
        // -0.0 equals 0; NaN still gets a place in the order
        return x.partial_cmp(&y).unwrap_or_else(|| x.total_cmp(&y));
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.timestamp_millis().cmp(&y.timestamp_millis()),
        _ => type_class(a).cmp(&type_class(b)),
    }
}

/// Sort rank of a value's type; all numeric widths share one class.
fn type_class(v: &Bson) -> u8 {
    match v {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::MaxKey => 255,
        _ => 12,
    }
}

/// Apply a projection to one document. Inclusion keeps document order.
#[must_use]
pub fn apply_projection(doc: &BsonDocument, projection: &Projection) -> BsonDocument {
    match projection {
        Projection::Include { fields, id } => {
            let mut out = BsonDocument::new();
            for (k, v) in doc {
                let keep = if k == crate::book::fields::ID { *id } else { fields.contains(k) };
                if keep {
                    out.insert(k.clone(), v.clone());
                }
            }
            out
        }
        Projection::Exclude { fields } => {
            let mut out = doc.clone();
            for f in fields {
                out.remove(f);
            }
            out
        }
    }
}
