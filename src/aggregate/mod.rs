//! Aggregation pipelines: `$match`, `$group`, `$sort`, `$limit`, `$skip`, `$project`, `$count`
//! over the expression set the catalog needs.

pub mod exec;
pub mod expr;
pub mod stage;

use bson::Document as BsonDocument;

pub use exec::run_pipeline;
pub use expr::{AccState, Accumulator, Expr, render_text, substr_bytes};
pub use stage::{ProjectField, Stage, parse_pipeline};

/// A pipeline literal as the store receives it: one document per stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline(pub Vec<BsonDocument>);

impl Pipeline {
    #[must_use]
    pub fn new(stages: Vec<BsonDocument>) -> Self {
        Self(stages)
    }

    #[must_use]
    pub fn stages(&self) -> &[BsonDocument] {
        &self.0
    }
}

impl From<Vec<BsonDocument>> for Pipeline {
    fn from(stages: Vec<BsonDocument>) -> Self {
        Self(stages)
    }
}
