//! Query catalog for a `books` document collection: filtered reads, projections, sorting,
//! pagination, a price update, a delete by title, aggregation pipelines, index
//! declarations and query-plan inspection.
//!
//! Every catalog entry builds a literal query document ([`catalog::queries`]) that a
//! [`store::BookStore`] executes. [`store::MemoryStore`] is the in-process store.

pub mod aggregate;
pub mod book;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod errors;
pub mod index;
pub mod logger;
pub mod query;
pub mod seed;
pub mod store;
pub mod types;
pub mod utils;

pub use book::Book;
pub use catalog::{AuthorCount, Catalog, DecadeCount, GenreStats};
pub use config::CatalogConfig;
pub use errors::DbError;
pub use index::{ExplainReport, IndexModel, PlanStage};
pub use query::{Cursor, DeleteReport, FindQuery, Order, UpdateReport};
pub use store::{BookStore, MemoryStore};

/// Catalog over an in-memory store named after `cfg`, seeded with the sample books.
///
/// # Errors
/// Store faults while seeding.
pub fn sample_catalog(cfg: &CatalogConfig) -> Result<Catalog<MemoryStore>, DbError> {
    let catalog = Catalog::new(MemoryStore::from_config(cfg));
    catalog.seed(&seed::sample_books())?;
    Ok(catalog)
}
