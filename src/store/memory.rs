use bson::oid::ObjectId;
use bson::{Bson, Document as BsonDocument};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::{BookStore, log_audit};
use crate::aggregate::{Pipeline, parse_pipeline, run_pipeline};
use crate::book::fields;
use crate::config::CatalogConfig;
use crate::errors::DbError;
use crate::index::{
    ExplainReport, IndexManager, IndexModel, IndexSpec, PlanStage, ValueKey, value_key,
};
use crate::query::{
    Cursor, DeleteQuery, DeleteReport, Filter, FindQuery, UpdateDoc, UpdateQuery, UpdateReport,
    apply_update, eval_filter, parse_filter, parse_find, parse_update, run_find,
};
use crate::types::RecordId;
use crate::utils::devlog::bench_line;
use crate::utils::num::{elapsed_ms, usize_to_u64};

#[derive(Debug, Default)]
struct State {
    docs: BTreeMap<RecordId, BsonDocument>,
    // unique `_id` values
    ids: BTreeMap<ValueKey, RecordId>,
    indexes: IndexManager,
}

/// Candidate records for a filter and how they were found.
struct Plan {
    ids: Vec<RecordId>,
    index: Option<(IndexSpec, u64)>,
}

impl State {
    fn plan(&self, filter: &Filter) -> Plan {
        match self.indexes.lookup_eq(filter) {
            Some((spec, scan)) => {
                let mut ids = scan.ids;
                // collection order, so results do not depend on which indexes exist
                ids.sort_unstable();
                Plan { ids, index: Some((spec, scan.keys_examined)) }
            }
            None => Plan { ids: self.docs.keys().copied().collect(), index: None },
        }
    }

    fn first_match(&self, filter: &Filter) -> Option<RecordId> {
        let plan = self.plan(filter);
        plan.ids
            .into_iter()
            .find(|id| self.docs.get(id).is_some_and(|d| eval_filter(d, filter)))
    }
}

/// In-process document store. Documents live in insertion order behind a `RwLock`; every
/// operation emits a bench line and mutations are audited.
#[derive(Debug)]
pub struct MemoryStore {
    namespace: String,
    state: RwLock<State>,
    next_id: AtomicU64,
}

impl MemoryStore {
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), state: RwLock::new(State::default()), next_id: AtomicU64::new(1) }
    }

    #[must_use]
    pub fn from_config(cfg: &CatalogConfig) -> Self {
        Self::new(cfg.namespace())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bench(&self, op: &str, started: Instant, mut extra: serde_json::Value) {
        if let Some(obj) = extra.as_object_mut() {
            obj.insert("ms".into(), serde_json::json!(elapsed_ms(started)));
        }
        crate::dev6!("{}", bench_line(op, &self.namespace, extra));
    }
}

fn touches_id(upd: &UpdateDoc) -> bool {
    let hits = |p: &str| p == fields::ID || p.starts_with("_id.");
    upd.set.iter().any(|(p, _)| hits(p.as_str()))
        || upd.inc.iter().any(|(p, _)| hits(p.as_str()))
        || upd.unset.iter().any(|p| hits(p.as_str()))
}

impl BookStore for MemoryStore {
    fn namespace(&self) -> String {
        self.namespace.clone()
    }

    fn find(&self, query: &FindQuery) -> Result<Cursor, DbError> {
        let started = Instant::now();
        let (filter, opts) = parse_find(query)?;
        let st = self.state.read();
        let plan = st.plan(&filter);
        let out = run_find(plan.ids.iter().filter_map(|id| st.docs.get(id)), &filter, &opts);
        drop(st);
        self.bench(
            "find",
            started,
            serde_json::json!({
                "examined": usize_to_u64(plan.ids.len()),
                "returned": usize_to_u64(out.len()),
                "index": plan.index.as_ref().map(|(s, _)| s.name.clone()),
            }),
        );
        Ok(Cursor::new(out))
    }

    fn insert_many(&self, docs: Vec<BsonDocument>) -> Result<Vec<Bson>, DbError> {
        let started = Instant::now();
        let mut st = self.state.write();
        let mut ids = Vec::with_capacity(docs.len());
        for doc in docs {
            let doc = if doc.contains_key(fields::ID) {
                doc
            } else {
                let mut with_id = BsonDocument::new();
                with_id.insert(fields::ID, ObjectId::new());
                for (k, v) in doc {
                    with_id.insert(k, v);
                }
                with_id
            };
            let id_value = doc.get(fields::ID).cloned().unwrap_or(Bson::Null);
            let id_key = value_key(&id_value);
            if st.ids.contains_key(&id_key) {
                return Err(DbError::query(format!("duplicate key _id: {id_value}")));
            }
            let rid = RecordId(self.next_id.fetch_add(1, Ordering::Relaxed));
            st.ids.insert(id_key, rid);
            st.indexes.insert_all(&doc, rid);
            st.docs.insert(rid, doc);
            log_audit("insert", &self.namespace, Some(&id_value));
            ids.push(id_value);
        }
        drop(st);
        self.bench("insert_many", started, serde_json::json!({"inserted": usize_to_u64(ids.len())}));
        Ok(ids)
    }

    fn update_one(&self, query: &UpdateQuery) -> Result<UpdateReport, DbError> {
        let started = Instant::now();
        let filter = parse_filter(&query.filter)?;
        let upd = parse_update(&query.update)?;
        if touches_id(&upd) {
            return Err(DbError::query("the _id field cannot be modified"));
        }
        let mut st = self.state.write();
        let mut report = UpdateReport::default();
        if let Some(rid) = st.first_match(&filter)
            && let Some(old) = st.docs.get(&rid).cloned()
        {
            report.matched = 1;
            let mut new = old.clone();
            if apply_update(&mut new, &upd)? {
                st.indexes.remove_all(&old, rid);
                st.indexes.insert_all(&new, rid);
                st.docs.insert(rid, new);
                report.modified = 1;
                log_audit("update", &self.namespace, old.get(fields::ID));
            }
        }
        drop(st);
        self.bench(
            "update_one",
            started,
            serde_json::json!({"matched": report.matched, "modified": report.modified}),
        );
        Ok(report)
    }

    fn delete_one(&self, query: &DeleteQuery) -> Result<DeleteReport, DbError> {
        let started = Instant::now();
        let filter = parse_filter(&query.filter)?;
        let mut st = self.state.write();
        let mut report = DeleteReport::default();
        if let Some(rid) = st.first_match(&filter)
            && let Some(old) = st.docs.remove(&rid)
        {
            st.indexes.remove_all(&old, rid);
            st.ids.remove(&value_key(old.get(fields::ID).unwrap_or(&Bson::Null)));
            report.deleted = 1;
            log_audit("delete", &self.namespace, old.get(fields::ID));
        }
        drop(st);
        self.bench("delete_one", started, serde_json::json!({"deleted": report.deleted}));
        Ok(report)
    }

    fn aggregate(&self, pipeline: &Pipeline) -> Result<Cursor, DbError> {
        let started = Instant::now();
        let stages = parse_pipeline(pipeline.stages())?;
        let out = {
            let st = self.state.read();
            run_pipeline(st.docs.values(), &stages)?
        };
        self.bench(
            "aggregate",
            started,
            serde_json::json!({
                "stages": stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
                "returned": usize_to_u64(out.len()),
            }),
        );
        Ok(Cursor::new(out))
    }

    fn create_index(&self, model: &IndexModel) -> Result<String, DbError> {
        let started = Instant::now();
        let spec = IndexSpec::from_model(model)?;
        let (name, created) = {
            let mut guard = self.state.write();
            let st = &mut *guard;
            st.indexes.create_index(spec, st.docs.iter().map(|(id, d)| (*id, d)))?
        };
        if created {
            log::info!("created index {name} on {}", self.namespace);
        }
        self.bench("create_index", started, serde_json::json!({"index": name, "created": created}));
        Ok(name)
    }

    fn drop_index(&self, name: &str) -> Result<(), DbError> {
        let started = Instant::now();
        self.state.write().indexes.drop_index(name)?;
        log::info!("dropped index {name} on {}", self.namespace);
        self.bench("drop_index", started, serde_json::json!({"index": name}));
        Ok(())
    }

    fn list_indexes(&self) -> Result<Vec<IndexModel>, DbError> {
        Ok(self.state.read().indexes.descriptors().iter().map(IndexSpec::to_model).collect())
    }

    fn explain_find(&self, query: &FindQuery) -> Result<ExplainReport, DbError> {
        let started = Instant::now();
        let (filter, opts) = parse_find(query)?;
        let st = self.state.read();
        let plan = st.plan(&filter);
        let out = run_find(plan.ids.iter().filter_map(|id| st.docs.get(id)), &filter, &opts);
        drop(st);
        let (stage, index_name, key_pattern, keys) = match plan.index {
            Some((spec, keys)) => (PlanStage::IxScan, Some(spec.name.clone()), Some(spec.keys_document()), keys),
            None => (PlanStage::CollScan, None, None, 0),
        };
        let report = ExplainReport {
            namespace: self.namespace.clone(),
            filter: query.filter.clone(),
            stage,
            index_name,
            key_pattern,
            n_returned: usize_to_u64(out.len()),
            total_docs_examined: usize_to_u64(plan.ids.len()),
            total_keys_examined: keys,
            execution_time_millis: elapsed_ms(started),
        };
        self.bench(
            "explain",
            started,
            serde_json::json!({"stage": report.stage.as_str(), "examined": report.total_docs_examined}),
        );
        Ok(report)
    }
}
