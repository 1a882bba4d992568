//! Aggregation expressions: field references, literals, `$concat`, `$substr`, `$toString`,
//! and the group accumulators.

use bson::{Bson, Document as BsonDocument};

use crate::errors::DbError;
use crate::query::parse::usize_arg;
use crate::query::{compare_bson, get_path};
use crate::utils::num::bson_as_f64;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `"$field.path"`
    Field(String),
    Literal(Bson),
    Concat(Vec<Expr>),
    /// Byte-based substring of the operand rendered as text; `len: None` runs to the end.
    Substr { input: Box<Expr>, start: usize, len: Option<usize> },
    ToString(Box<Expr>),
}

impl Expr {
    /// Parse an expression literal.
    ///
    /// # Errors
    /// Returns `DbError::Query` for unknown operators, variables, or bad operands.
    pub fn parse(v: &Bson) -> Result<Self, DbError> {
        match v {
            Bson::String(s) if s.starts_with("$$") => {
                Err(DbError::query(format!("variables are not supported: {s}")))
            }
            Bson::String(s) if s.starts_with('$') => Ok(Self::Field(s[1..].to_string())),
            Bson::Document(d) => Self::parse_operator(d),
            Bson::Array(_) => Err(DbError::query("array literals need $literal")),
            other => Ok(Self::Literal(other.clone())),
        }
    }

    fn parse_operator(d: &BsonDocument) -> Result<Self, DbError> {
        let mut iter = d.iter();
        let (Some((op, arg)), None) = (iter.next(), iter.next()) else {
            return Err(DbError::query("expression object must have exactly one operator"));
        };
        match op.as_str() {
            "$literal" => Ok(Self::Literal(arg.clone())),
            "$concat" => {
                let Bson::Array(items) = arg else {
                    return Err(DbError::query("$concat expects an array"));
                };
                Ok(Self::Concat(items.iter().map(Self::parse).collect::<Result<_, _>>()?))
            }
            "$substr" | "$substrBytes" => {
                let Bson::Array(items) = arg else {
                    return Err(DbError::query(format!("{op} expects [expr, start, length]")));
                };
                let [input, start, len] = items.as_slice() else {
                    return Err(DbError::query(format!("{op} expects [expr, start, length]")));
                };
                let negative = matches!(len, Bson::Int32(n) if *n < 0)
                    || matches!(len, Bson::Int64(n) if *n < 0)
                    || matches!(len, Bson::Double(n) if *n < 0.0);
                Ok(Self::Substr {
                    input: Box::new(Self::parse(input)?),
                    start: usize_arg(op, start)?,
                    len: if negative { None } else { Some(usize_arg(op, len)?) },
                })
            }
            "$toString" => Ok(Self::ToString(Box::new(Self::parse(arg)?))),
            other => Err(DbError::query(format!("unknown expression operator {other}"))),
        }
    }

    /// Evaluate against one document. Missing fields evaluate to null.
    ///
    /// # Errors
    /// Returns `DbError::Query` when an operand has a type the operator cannot handle.
    pub fn eval(&self, doc: &BsonDocument) -> Result<Bson, DbError> {
        match self {
            Self::Field(path) => Ok(get_path(doc, path).cloned().unwrap_or(Bson::Null)),
            Self::Literal(v) => Ok(v.clone()),
            Self::Concat(parts) => {
                let mut out = String::new();
                for p in parts {
                    match p.eval(doc)? {
                        Bson::String(s) => out.push_str(&s),
                        Bson::Null | Bson::Undefined => return Ok(Bson::Null),
                        other => {
                            return Err(DbError::query(format!(
                                "$concat only supports strings, not {:?}",
                                other.element_type()
                            )));
                        }
                    }
                }
                Ok(Bson::String(out))
            }
            Self::Substr { input, start, len } => {
                let text = render_text(&input.eval(doc)?)?.unwrap_or_default();
                Ok(Bson::String(substr_bytes(&text, *start, *len)?))
            }
            Self::ToString(input) => Ok(match render_text(&input.eval(doc)?)? {
                Some(s) => Bson::String(s),
                None => Bson::Null,
            }),
        }
    }
}

/// Text form of a scalar as string operators see it. Integral doubles drop the fraction,
/// so a year stored as `1987.0` renders as `"1987"`. Null and missing render as `None`.
///
/// # Errors
/// Returns `DbError::Query` for documents, arrays and binary values.
pub fn render_text(v: &Bson) -> Result<Option<String>, DbError> {
    Ok(Some(match v {
        Bson::Null | Bson::Undefined => return Ok(None),
        Bson::String(s) => s.clone(),
        Bson::Int32(i) => i.to_string(),
        Bson::Int64(i) => i.to_string(),
        Bson::Double(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
        Bson::Double(f) => f.to_string(),
        Bson::Decimal128(d) => d.to_string(),
        Bson::Boolean(b) => b.to_string(),
        Bson::ObjectId(oid) => oid.to_hex(),
        other => {
            return Err(DbError::query(format!("cannot convert {:?} to string", other.element_type())));
        }
    }))
}

/// Byte-indexed substring clamped to the text length.
///
/// # Errors
/// Returns `DbError::Query` when a bound splits a multi-byte character.
pub fn substr_bytes(text: &str, start: usize, len: Option<usize>) -> Result<String, DbError> {
    let begin = start.min(text.len());
    let end = len.map_or(text.len(), |n| begin.saturating_add(n).min(text.len()));
    text.get(begin..end)
        .map(str::to_string)
        .ok_or_else(|| DbError::query("$substr range splits a UTF-8 character"))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Sum(Expr),
    Avg(Expr),
    Min(Expr),
    Max(Expr),
    First(Expr),
    Last(Expr),
}

impl Accumulator {
    /// Parse `{$sum: <expr>}` and friends.
    ///
    /// # Errors
    /// Returns `DbError::Query` for unknown accumulators or malformed operands.
    pub fn parse(name: &str, v: &Bson) -> Result<Self, DbError> {
        let Bson::Document(d) = v else {
            return Err(DbError::query(format!("accumulator for {name} must be an object")));
        };
        let mut iter = d.iter();
        let (Some((op, arg)), None) = (iter.next(), iter.next()) else {
            return Err(DbError::query(format!("accumulator for {name} must have one operator")));
        };
        let e = Expr::parse(arg)?;
        Ok(match op.as_str() {
            "$sum" => Self::Sum(e),
            "$avg" => Self::Avg(e),
            "$min" => Self::Min(e),
            "$max" => Self::Max(e),
            "$first" => Self::First(e),
            "$last" => Self::Last(e),
            other => return Err(DbError::query(format!("unknown accumulator {other}"))),
        })
    }

    fn expr(&self) -> &Expr {
        match self {
            Self::Sum(e) | Self::Avg(e) | Self::Min(e) | Self::Max(e) | Self::First(e) | Self::Last(e) => e,
        }
    }

    #[must_use]
    pub fn start(&self) -> AccState {
        match self {
            Self::Sum(_) => AccState::Sum { int: 0, float: 0.0, saw_double: false, saw_int64: false },
            Self::Avg(_) => AccState::Avg { total: 0.0, n: 0 },
            Self::Min(_) => AccState::Extreme { best: None, want: Ordering::Less },
            Self::Max(_) => AccState::Extreme { best: None, want: Ordering::Greater },
            Self::First(_) => AccState::First(None),
            Self::Last(_) => AccState::Last(Bson::Null),
        }
    }

    /// Fold one document into `state`.
    ///
    /// # Errors
    /// Propagates expression errors.
    pub fn step(&self, state: &mut AccState, doc: &BsonDocument) -> Result<(), DbError> {
        let v = self.expr().eval(doc)?;
        state.push(v);
        Ok(())
    }
}

/// Running state of one accumulator within one group.
#[derive(Debug, Clone, PartialEq)]
pub enum AccState {
    Sum { int: i64, float: f64, saw_double: bool, saw_int64: bool },
    Avg { total: f64, n: u64 },
    Extreme { best: Option<Bson>, want: Ordering },
    First(Option<Bson>),
    Last(Bson),
}

impl AccState {
    fn push(&mut self, v: Bson) {
        match self {
            Self::Sum { int, float, saw_double, saw_int64 } => match v {
                Bson::Int32(i) => *int = int.saturating_add(i64::from(i)),
                Bson::Int64(i) => {
                    *int = int.saturating_add(i);
                    *saw_int64 = true;
                }
                other => {
                    // non-numeric values are ignored
                    if let Some(f) = bson_as_f64(&other) {
                        *float += f;
                        *saw_double = true;
                    }
                }
            },
            Self::Avg { total, n } => {
                if let Some(f) = bson_as_f64(&v) {
                    *total += f;
                    *n += 1;
                }
            }
            Self::Extreme { best, want } => {
                if matches!(v, Bson::Null | Bson::Undefined) {
                    return;
                }
                let replace = best.as_ref().is_none_or(|b| compare_bson(&v, b) == *want);
                if replace {
                    *best = Some(v);
                }
            }
            Self::First(first) => {
                if first.is_none() {
                    *first = Some(v);
                }
            }
            Self::Last(last) => *last = v,
        }
    }

    /// Final value of the accumulator.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn finish(self) -> Bson {
        match self {
            Self::Sum { int, float, saw_double, saw_int64 } => {
                if saw_double {
                    Bson::Double(int as f64 + float)
                } else if saw_int64 {
                    Bson::Int64(int)
                } else {
                    i32::try_from(int).map_or(Bson::Int64(int), Bson::Int32)
                }
            }
            Self::Avg { total, n } => {
                if n == 0 {
                    Bson::Null
                } else {
                    Bson::Double(total / n as f64)
                }
            }
            Self::Extreme { best, .. } => best.unwrap_or(Bson::Null),
            Self::First(first) => first.unwrap_or(Bson::Null),
            Self::Last(last) => last,
        }
    }
}
