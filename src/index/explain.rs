use bson::{Bson, Document as BsonDocument};
use serde::Serialize;

/// Winning plan stage of a find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlanStage {
    #[serde(rename = "COLLSCAN")]
    CollScan,
    #[serde(rename = "IXSCAN")]
    IxScan,
}

impl PlanStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CollScan => "COLLSCAN",
            Self::IxScan => "IXSCAN",
        }
    }
}

/// Execution statistics of one find.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainReport {
    pub namespace: String,
    #[serde(skip)]
    pub filter: BsonDocument,
    pub stage: PlanStage,
    pub index_name: Option<String>,
    #[serde(skip)]
    pub key_pattern: Option<BsonDocument>,
    pub n_returned: u64,
    pub total_docs_examined: u64,
    pub total_keys_examined: u64,
    pub execution_time_millis: u64,
}

fn count(n: u64) -> Bson {
    i64::try_from(n).map_or(Bson::Int64(i64::MAX), Bson::Int64)
}

impl ExplainReport {
    #[must_use]
    pub const fn used_index(&self) -> bool {
        matches!(self.stage, PlanStage::IxScan)
    }

    /// Render as `{queryPlanner: {namespace, winningPlan}, executionStats: {...}}`.
    /// An index plan is a `FETCH` over the `IXSCAN`.
    #[must_use]
    pub fn to_document(&self) -> BsonDocument {
        let mut winning = BsonDocument::new();
        match self.stage {
            PlanStage::CollScan => {
                winning.insert("stage", self.stage.as_str());
                winning.insert("filter", self.filter.clone());
            }
            PlanStage::IxScan => {
                let mut input = BsonDocument::new();
                input.insert("stage", self.stage.as_str());
                if let Some(name) = &self.index_name {
                    input.insert("indexName", name.clone());
                }
                if let Some(keys) = &self.key_pattern {
                    input.insert("keyPattern", keys.clone());
                }
                winning.insert("stage", "FETCH");
                winning.insert("inputStage", input);
            }
        }

        let mut planner = BsonDocument::new();
        planner.insert("namespace", self.namespace.clone());
        planner.insert("parsedQuery", self.filter.clone());
        planner.insert("winningPlan", winning);

        let mut stats = BsonDocument::new();
        stats.insert("executionSuccess", true);
        stats.insert("nReturned", count(self.n_returned));
        stats.insert("executionTimeMillis", count(self.execution_time_millis));
        stats.insert("totalKeysExamined", count(self.total_keys_examined));
        stats.insert("totalDocsExamined", count(self.total_docs_examined));

        let mut out = BsonDocument::new();
        out.insert("queryPlanner", planner);
        out.insert("executionStats", stats);
        out
    }
}
