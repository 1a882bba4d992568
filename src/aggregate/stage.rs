use bson::{Bson, Document as BsonDocument};

use super::expr::{Accumulator, Expr};
use crate::book::fields;
use crate::errors::DbError;
use crate::query::parse::usize_arg;
use crate::query::{Filter, SortSpec, parse_filter, parse_sort};

/// One `$project` entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectField {
    Include(String),
    Exclude(String),
    Computed(String, Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Filter),
    Group { id: Expr, accumulators: Vec<(String, Accumulator)> },
    Sort(Vec<SortSpec>),
    Limit(usize),
    Skip(usize),
    /// `keep_id` is false only when `_id: 0` is given.
    Project { fields: Vec<ProjectField>, keep_id: bool },
    /// `{$count: "name"}`: a single document holding the number of inputs.
    Count(String),
}

impl Stage {
    /// Parse one stage document such as `{$group: {...}}`.
    ///
    /// # Errors
    /// Returns `DbError::Query` for unknown stages and malformed specifications.
    pub fn parse(doc: &BsonDocument) -> Result<Self, DbError> {
        let mut iter = doc.iter();
        let (Some((name, spec)), None) = (iter.next(), iter.next()) else {
            return Err(DbError::query("a pipeline stage must have exactly one field"));
        };
        match name.as_str() {
            "$match" => Ok(Self::Match(parse_filter(stage_doc(name, spec)?)?)),
            "$group" => parse_group(stage_doc(name, spec)?),
            "$sort" => {
                let spec = stage_doc(name, spec)?;
                if spec.is_empty() {
                    return Err(DbError::query("$sort needs at least one key"));
                }
                Ok(Self::Sort(parse_sort(spec)?))
            }
            "$limit" => match usize_arg(name, spec)? {
                0 => Err(DbError::query("$limit must be positive")),
                n => Ok(Self::Limit(n)),
            },
            "$skip" => Ok(Self::Skip(usize_arg(name, spec)?)),
            "$project" => parse_project(stage_doc(name, spec)?),
            "$count" => match spec {
                Bson::String(s) if !s.is_empty() && !s.starts_with('$') && !s.contains('.') => {
                    Ok(Self::Count(s.clone()))
                }
                _ => Err(DbError::query("$count expects a plain field name")),
            },
            other => Err(DbError::query(format!("unknown pipeline stage {other}"))),
        }
    }

    /// Stage name as written in the pipeline literal.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Match(_) => "$match",
            Self::Group { .. } => "$group",
            Self::Sort(_) => "$sort",
            Self::Limit(_) => "$limit",
            Self::Skip(_) => "$skip",
            Self::Project { .. } => "$project",
            Self::Count(_) => "$count",
        }
    }
}

fn stage_doc<'a>(name: &str, spec: &'a Bson) -> Result<&'a BsonDocument, DbError> {
    match spec {
        Bson::Document(d) => Ok(d),
        _ => Err(DbError::query(format!("{name} expects a document"))),
    }
}

fn parse_group(spec: &BsonDocument) -> Result<Stage, DbError> {
    let id = spec
        .get(fields::ID)
        .ok_or_else(|| DbError::query("$group requires an _id expression"))
        .and_then(Expr::parse)?;
    let accumulators = spec
        .iter()
        .filter(|(k, _)| k.as_str() != fields::ID)
        .map(|(k, v)| {
            if k.contains('.') {
                return Err(DbError::query(format!("group field {k} cannot contain '.'")));
            }
            Ok((k.clone(), Accumulator::parse(k, v)?))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stage::Group { id, accumulators })
}

fn is_flag(v: &Bson) -> Option<bool> {
    match v {
        Bson::Boolean(b) => Some(*b),
        Bson::Int32(i) => Some(*i != 0),
        Bson::Int64(i) => Some(*i != 0),
        Bson::Double(f) => Some(*f != 0.0),
        _ => None,
    }
}

fn parse_project(spec: &BsonDocument) -> Result<Stage, DbError> {
    if spec.is_empty() {
        return Err(DbError::query("$project needs at least one field"));
    }
    let mut keep_id = true;
    let mut out = Vec::with_capacity(spec.len());
    for (k, v) in spec {
        match (k.as_str(), is_flag(v)) {
            (fields::ID, Some(flag)) => keep_id = flag,
            (_, Some(true)) => out.push(ProjectField::Include(k.clone())),
            (_, Some(false)) => out.push(ProjectField::Exclude(k.clone())),
            (_, None) => out.push(ProjectField::Computed(k.clone(), Expr::parse(v)?)),
        }
    }
    let excludes = out.iter().filter(|f| matches!(f, ProjectField::Exclude(_))).count();
    if excludes > 0 && excludes != out.len() {
        return Err(DbError::query("cannot mix exclusion with inclusion in $project"));
    }
    Ok(Stage::Project { fields: out, keep_id })
}

/// Parse a pipeline literal into stages.
///
/// # Errors
/// Returns the first stage parse error, prefixed with the stage position.
pub fn parse_pipeline(stages: &[BsonDocument]) -> Result<Vec<Stage>, DbError> {
    stages
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Stage::parse(s).map_err(|e| match e {
                DbError::Query(msg) => DbError::Query(format!("stage {i}: {msg}")),
                other => other,
            })
        })
        .collect()
}
