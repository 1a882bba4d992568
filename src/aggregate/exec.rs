use bson::{Bson, Document as BsonDocument};
use std::collections::BTreeMap;

use super::expr::AccState;
use super::stage::{ProjectField, Stage};
use crate::book::fields;
use crate::errors::DbError;
use crate::index::{ValueKey, value_key};
use crate::query::{compare_docs, eval_filter, get_path};

/// Run parsed stages over the input documents, in order.
///
/// # Errors
/// Returns the first expression evaluation error.
pub fn run_pipeline<'a>(
    docs: impl IntoIterator<Item = &'a BsonDocument>,
    stages: &[Stage],
) -> Result<Vec<BsonDocument>, DbError> {
    let mut cur: Vec<BsonDocument> = docs.into_iter().cloned().collect();
    for stage in stages {
        cur = run_stage(cur, stage)?;
    }
    Ok(cur)
}

fn run_stage(mut docs: Vec<BsonDocument>, stage: &Stage) -> Result<Vec<BsonDocument>, DbError> {
    Ok(match stage {
        Stage::Match(filter) => {
            docs.retain(|d| eval_filter(d, filter));
            docs
        }
        Stage::Group { id, accumulators } => {
            // first-seen order; keys compare with numeric widening
            let mut groups: Vec<(Bson, Vec<AccState>)> = Vec::new();
            let mut slots: BTreeMap<ValueKey, usize> = BTreeMap::new();
            for d in &docs {
                let key = id.eval(d)?;
                let idx = *slots.entry(value_key(&key)).or_insert_with(|| {
                    groups.push((key, accumulators.iter().map(|(_, a)| a.start()).collect()));
                    groups.len() - 1
                });
                let states = &mut groups[idx].1;
                for ((_, acc), st) in accumulators.iter().zip(states.iter_mut()) {
                    acc.step(st, d)?;
                }
            }
            groups
                .into_iter()
                .map(|(key, states)| {
                    let mut out = BsonDocument::new();
                    out.insert(fields::ID, key);
                    for ((name, _), st) in accumulators.iter().zip(states) {
                        out.insert(name.clone(), st.finish());
                    }
                    out
                })
                .collect()
        }
        Stage::Sort(spec) => {
            docs.sort_by(|a, b| compare_docs(a, b, spec));
            docs
        }
        Stage::Limit(n) => {
            docs.truncate(*n);
            docs
        }
        Stage::Skip(n) => docs.into_iter().skip(*n).collect(),
        Stage::Project { fields: spec, keep_id } => {
            docs.iter().map(|d| project(d, spec, *keep_id)).collect::<Result<_, _>>()?
        }
        Stage::Count(name) => {
            let n = i64::try_from(docs.len()).unwrap_or(i64::MAX);
            let mut out = BsonDocument::new();
            out.insert(name.clone(), i32::try_from(n).map_or(Bson::Int64(n), Bson::Int32));
            // $count over nothing yields no document
            if docs.is_empty() { Vec::new() } else { vec![out] }
        }
    })
}

fn project(doc: &BsonDocument, spec: &[ProjectField], keep_id: bool) -> Result<BsonDocument, DbError> {
    let exclusion = spec.iter().all(|f| matches!(f, ProjectField::Exclude(_)));
    if exclusion {
        let mut out = doc.clone();
        for f in spec {
            if let ProjectField::Exclude(name) = f {
                out.remove(name);
            }
        }
        if !keep_id {
            out.remove(fields::ID);
        }
        return Ok(out);
    }
    let mut out = BsonDocument::new();
    if keep_id
        && !spec.iter().any(|f| matches!(f, ProjectField::Computed(n, _) if n == fields::ID))
        && let Some(id) = doc.get(fields::ID)
    {
        out.insert(fields::ID, id.clone());
    }
    for f in spec {
        match f {
            ProjectField::Include(name) => {
                if let Some(v) = get_path(doc, name) {
                    out.insert(name.clone(), v.clone());
                }
            }
            ProjectField::Computed(name, expr) => {
                out.insert(name.clone(), expr.eval(doc)?);
            }
            ProjectField::Exclude(_) => {}
        }
    }
    Ok(out)
}
