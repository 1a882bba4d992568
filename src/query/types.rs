use bson::{Bson, Document as BsonDocument};
use serde::{Deserialize, Serialize};

// Safety limits to prevent resource abuse
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_IN_SET: usize = 1000;
pub(crate) const MAX_UPDATE_FIELDS: usize = 128;
pub(crate) const MAX_SORT_FIELDS: usize = 8;
pub(crate) const MAX_PROJECTION_FIELDS: usize = 64;
pub(crate) const MAX_FILTER_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    /// Direction as written in sort and index literals: `1` or `-1`.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Asc => 1,
            Self::Desc => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

/// Which fields a read returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Only the listed fields, plus `_id` when `id` is true.
    Include { fields: Vec<String>, id: bool },
    /// Everything except the listed fields (may include `_id`).
    Exclude { fields: Vec<String> },
}

/// Parsed options for a find. Application order: filter, sort, skip, limit, projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub projection: Option<Projection>,
    pub sort: Option<Vec<SortSpec>>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    True,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Exists { path: String, exists: bool },
    In { path: String, values: Vec<Bson> },
    Nin { path: String, values: Vec<Bson> },
    Cmp { path: String, op: CmpOp, value: Bson },
}

impl Filter {
    /// Equality value on `path` if this filter pins it, directly or inside a conjunction.
    #[must_use]
    pub fn eq_value(&self, path: &str) -> Option<&Bson> {
        match self {
            Self::Cmp { path: p, op: CmpOp::Eq, value } if p == path => Some(value),
            Self::And(fs) => fs.iter().find_map(|f| f.eq_value(path)),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpdateDoc {
    pub set: Vec<(String, Bson)>,
    pub inc: Vec<(String, Bson)>,
    pub unset: Vec<String>,
}

impl UpdateDoc {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.inc.is_empty() && self.unset.is_empty()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub deleted: u64,
}

/// A find as the store receives it: literal filter, projection and sort documents plus
/// skip/limit. This is the query language surface shared by every store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub filter: BsonDocument,
    pub projection: Option<BsonDocument>,
    pub sort: Option<BsonDocument>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl FindQuery {
    #[must_use]
    pub fn new(filter: BsonDocument) -> Self {
        Self { filter, ..Self::default() }
    }

    #[must_use]
    pub fn projection(mut self, projection: BsonDocument) -> Self {
        self.projection = Some(projection);
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: BsonDocument) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub const fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// `updateOne(filter, update)`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateQuery {
    pub filter: BsonDocument,
    pub update: BsonDocument,
}

/// `deleteOne(filter)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteQuery {
    pub filter: BsonDocument,
}
