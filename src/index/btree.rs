use crate::query::{Order, get_path};
use crate::types::RecordId;
use crate::utils::num::bson_as_f64;
use bson::{Bson, Document as BsonDocument};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::IndexSpec;

/// Indexable scalar. All numeric widths share one representation so `2018` and `2018.0`
/// land on the same key; missing fields and unsupported types index as `Null`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndexKeyKind {
    Null,
    Num(OrderedFloat<f64>),
    Str(String),
    Bool(bool),
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn key_from_bson(v: &Bson) -> Option<IndexKeyKind> {
    match v {
        Bson::Null => Some(IndexKeyKind::Null),
        Bson::String(s) => Some(IndexKeyKind::Str(s.clone())),
        Bson::Int32(i) => Some(IndexKeyKind::Num(OrderedFloat(f64::from(*i)))),
        Bson::Int64(i) => Some(IndexKeyKind::Num(OrderedFloat(*i as f64))),
        Bson::Double(f) => Some(IndexKeyKind::Num(OrderedFloat(*f))),
        Bson::Boolean(b) => Some(IndexKeyKind::Bool(*b)),
        _ => None,
    }
}

/// Normalized identity for any value, used where values are grouped or deduplicated.
/// Numbers of every width share one key; values with no index key compare by their
/// debug rendering, which matches plain BSON equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValueKey {
    Scalar(IndexKeyKind),
    ObjectId([u8; 12]),
    Other(String),
}

#[must_use]
pub fn value_key(v: &Bson) -> ValueKey {
    if let Some(k) = key_from_bson(v) {
        return ValueKey::Scalar(k);
    }
    match v {
        Bson::ObjectId(oid) => ValueKey::ObjectId(oid.bytes()),
        Bson::Decimal128(_) => match bson_as_f64(v) {
            Some(f) => ValueKey::Scalar(IndexKeyKind::Num(OrderedFloat(f))),
            None => ValueKey::Other(format!("{v:?}")),
        },
        other => ValueKey::Other(format!("{other:?}")),
    }
}

/// One component of a compound key, ordered by its field's direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirKey {
    pub key: IndexKeyKind,
    pub order: Order,
}

impl Ord for DirKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let ord = self.key.cmp(&other.key);
        if self.order == Order::Desc { ord.reverse() } else { ord }
    }
}

impl PartialOrd for DirKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CompoundKey(pub Vec<DirKey>);

/// Result of an index probe: matching record ids in index order plus the entries touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexScan {
    pub ids: Vec<RecordId>,
    pub keys_examined: u64,
}

#[derive(Debug, Clone)]
pub struct BTreeIndex {
    pub spec: IndexSpec,
    pub map: BTreeMap<CompoundKey, BTreeSet<RecordId>>,
}

impl BTreeIndex {
    #[must_use]
    pub fn new(spec: IndexSpec) -> Self {
        Self { spec, map: BTreeMap::new() }
    }

    fn key_for(&self, doc: &BsonDocument) -> CompoundKey {
        CompoundKey(
            self.spec
                .keys
                .iter()
                .map(|(field, order)| DirKey {
                    key: get_path(doc, field).and_then(key_from_bson).unwrap_or(IndexKeyKind::Null),
                    order: *order,
                })
                .collect(),
        )
    }

    pub fn insert(&mut self, doc: &BsonDocument, id: RecordId) {
        let k = self.key_for(doc);
        self.map.entry(k).or_default().insert(id);
    }

    pub fn remove(&mut self, doc: &BsonDocument, id: RecordId) {
        let k = self.key_for(doc);
        if let Some(set) = self.map.get_mut(&k) {
            set.remove(&id);
            if set.is_empty() {
                self.map.remove(&k);
            }
        }
    }

    /// Equality probe on the leading key. Entries are visited in index order.
    pub fn lookup_prefix_eq(&self, v: &Bson) -> Option<IndexScan> {
        let (_, order) = self.spec.keys.first()?;
        let probe = DirKey { key: key_from_bson(v)?, order: *order };
        // a one-element key sorts before every longer key sharing its first component
        let start = CompoundKey(vec![probe.clone()]);
        let mut scan = IndexScan::default();
        for (k, ids) in self.map.range(start..) {
            if k.0.first() != Some(&probe) {
                break;
            }
            scan.keys_examined += crate::utils::num::usize_to_u64(ids.len());
            scan.ids.extend(ids.iter().copied());
        }
        Some(scan)
    }
}
