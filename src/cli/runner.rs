use std::io::Write;

use crate::catalog::Catalog;
use crate::errors::DbError;
use crate::query::{Cursor, FindQuery, Order};
use crate::store::BookStore;
use crate::utils::json::parse_json_to_bson_document;

use super::command::Command;
use super::util::{bson_to_json, parse_project_arg, parse_sort_arg, plain_value};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputMode {
    Human,
    Plain,
    Json,
}

/// Result rows of one command, already in JSON form.
struct Rendered {
    entry: String,
    rows: Vec<serde_json::Value>,
}

impl Rendered {
    fn docs(entry: impl Into<String>, cursor: Cursor) -> Self {
        Self { entry: entry.into(), rows: cursor.map(|d| bson_to_json(&bson::Bson::Document(d))).collect() }
    }

    fn values<T: serde::Serialize>(
        entry: impl Into<String>,
        items: impl IntoIterator<Item = T>,
    ) -> Result<Self, DbError> {
        let rows = items.into_iter().map(serde_json::to_value).collect::<Result<_, _>>()?;
        Ok(Self { entry: entry.into(), rows })
    }

    fn write_to(&self, out: &mut dyn Write, mode: OutputMode) -> Result<(), DbError> {
        match mode {
            OutputMode::Json => {
                let line = serde_json::json!({"entry": self.entry, "results": self.rows});
                writeln!(out, "{line}")?;
            }
            OutputMode::Plain => {
                for row in &self.rows {
                    let line = match row {
                        serde_json::Value::Object(map) => map
                            .iter()
                            .map(|(k, v)| format!("{k}={}", plain_value(v)))
                            .collect::<Vec<_>>()
                            .join(" "),
                        other => plain_value(other),
                    };
                    writeln!(out, "{line}")?;
                }
            }
            OutputMode::Human => {
                writeln!(out, "== {} ({} result{})", self.entry, self.rows.len(), if self.rows.len() == 1 { "" } else { "s" })?;
                for row in &self.rows {
                    writeln!(out, "  {row}")?;
                }
            }
        }
        Ok(())
    }
}

fn label(name: &str, order: Order) -> String {
    match order {
        Order::Asc => format!("{name} (asc)"),
        Order::Desc => format!("{name} (desc)"),
    }
}

fn execute<S: BookStore>(catalog: &Catalog<S>, cmd: Command) -> Result<Vec<Rendered>, DbError> {
    let name = cmd.name();
    let one = |r: Rendered| Ok(vec![r]);
    match cmd {
        Command::ByGenre { genre } => one(Rendered::docs(name, catalog.by_genre(&genre)?)),
        Command::PublishedAfter { year } => one(Rendered::docs(name, catalog.published_after(year)?)),
        Command::ByAuthor { author } => one(Rendered::docs(name, catalog.by_author(&author)?)),
        Command::InStockPublishedAfter { year } => {
            one(Rendered::docs(name, catalog.in_stock_published_after(year)?))
        }
        Command::ProjectedByGenre { genre } => one(Rendered::docs(name, catalog.projected_by_genre(&genre)?)),
        Command::SortedByPrice { order } => one(Rendered::docs(label(name, order), catalog.sorted_by_price(order)?)),
        Command::Page { page, size } => one(Rendered::docs(format!("{name} {page}/{size}"), catalog.page(page, size)?)),
        Command::UpdatePrice { title, price } => one(Rendered::values(name, [catalog.update_price(&title, price)?])?),
        Command::DeleteByTitle { title } => one(Rendered::values(name, [catalog.delete_by_title(&title)?])?),
        Command::AveragePriceByGenre => one(Rendered::values(name, catalog.average_price_by_genre()?)?),
        Command::TopAuthor => one(Rendered::values(name, catalog.top_author()?)?),
        Command::BooksByDecade => one(Rendered::values(name, catalog.books_by_decade()?)?),
        Command::CreateIndexes => one(Rendered::values(name, catalog.create_indexes()?)?),
        Command::ListIndexes => {
            let models = catalog.store().list_indexes()?;
            let rows: Vec<_> = models
                .iter()
                .map(|m| {
                    serde_json::json!({
                        "name": m.name,
                        "keys": bson_to_json(&bson::Bson::Document(m.keys.clone())),
                    })
                })
                .collect();
            one(Rendered::values(name, rows)?)
        }
        Command::ExplainTitle { title } => {
            let report = catalog.explain_title(&title)?;
            one(Rendered::values(name, [report])?)
        }
        Command::Find { filter_json, project, sort, limit, skip } => {
            let mut q = FindQuery::new(parse_json_to_bson_document(&filter_json)?);
            if let Some(p) = project {
                q = q.projection(parse_project_arg(&p)?);
            }
            if let Some(s) = sort {
                q = q.sort(parse_sort_arg(&s)?);
            }
            if let Some(n) = skip {
                q = q.skip(n);
            }
            if let Some(n) = limit {
                q = q.limit(n);
            }
            one(Rendered::docs(name, catalog.find(&q)?))
        }
        Command::Demo => {
            let mut all = Vec::new();
            for step in Command::demo_steps() {
                all.extend(execute(catalog, step)?);
            }
            Ok(all)
        }
    }
}

/// Run `cmd` and write its results to `out`.
///
/// # Errors
/// Returns the first catalog or store error; output already written stays written.
pub fn run_to<S: BookStore>(
    catalog: &Catalog<S>,
    cmd: Command,
    mode: OutputMode,
    out: &mut dyn Write,
) -> Result<(), DbError> {
    log::debug!("running {}", cmd.name());
    for r in execute(catalog, cmd)? {
        r.write_to(out, mode)?;
    }
    Ok(())
}

/// Run `cmd` and print its results to stdout.
///
/// # Errors
/// See [`run_to`].
pub fn run_with_format<S: BookStore>(catalog: &Catalog<S>, cmd: Command, mode: OutputMode) -> Result<(), DbError> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    run_to(catalog, cmd, mode, &mut lock)
}

/// [`run_with_format`] in human mode.
///
/// # Errors
/// See [`run_to`].
pub fn run<S: BookStore>(catalog: &Catalog<S>, cmd: Command) -> Result<(), DbError> {
    run_with_format(catalog, cmd, OutputMode::Human)
}
