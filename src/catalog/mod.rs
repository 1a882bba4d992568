//! The book catalog: each entry builds a literal (see [`queries`]) and [`Catalog`] runs it
//! against a [`BookStore`], converting results into typed values.

pub mod queries;
pub mod results;

use crate::book::{Book, books_from_documents};
use crate::errors::DbError;
use crate::index::ExplainReport;
use crate::query::{Cursor, DeleteReport, FindQuery, Order, UpdateReport};
use crate::store::BookStore;

pub use results::{AuthorCount, DecadeCount, GenreStats};

/// Names of the catalog entries, in the order `demo` runs them.
pub const ENTRIES: &[&str] = &[
    "by_genre",
    "published_after",
    "by_author",
    "in_stock_published_after",
    "projected_by_genre",
    "sorted_by_price",
    "page",
    "update_price",
    "delete_by_title",
    "average_price_by_genre",
    "top_author",
    "books_by_decade",
    "create_indexes",
    "explain_title",
];

pub struct Catalog<S: BookStore> {
    store: S,
}

impl<S: BookStore> Catalog<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Insert books; returns how many were stored.
    ///
    /// # Errors
    /// Store faults.
    pub fn seed(&self, books: &[Book]) -> Result<usize, DbError> {
        let ids = self.store.insert_many(books.iter().map(Book::to_document).collect())?;
        log::info!("seeded {} books into {}", ids.len(), self.store.namespace());
        Ok(ids.len())
    }

    /// Run any find from the catalog.
    ///
    /// # Errors
    /// Store faults and malformed literals.
    pub fn find(&self, query: &FindQuery) -> Result<Cursor, DbError> {
        self.store.find(query)
    }

    /// Run a find and read every result as a full book.
    ///
    /// # Errors
    /// Also returns `DbError::Schema` when a result is not book-shaped, e.g. projected.
    pub fn books(&self, query: &FindQuery) -> Result<Vec<Book>, DbError> {
        books_from_documents(&self.store.find(query)?.to_vec())
    }

    /// # Errors
    /// Store faults.
    pub fn by_genre(&self, genre: &str) -> Result<Cursor, DbError> {
        self.find(&queries::by_genre(genre))
    }

    /// # Errors
    /// Store faults.
    pub fn published_after(&self, year: i32) -> Result<Cursor, DbError> {
        self.find(&queries::published_after(year))
    }

    /// # Errors
    /// Store faults.
    pub fn by_author(&self, author: &str) -> Result<Cursor, DbError> {
        self.find(&queries::by_author(author))
    }

    /// # Errors
    /// Store faults.
    pub fn in_stock_published_after(&self, year: i32) -> Result<Cursor, DbError> {
        self.find(&queries::in_stock_published_after(year))
    }

    /// Documents holding only title, author and price.
    ///
    /// # Errors
    /// Store faults.
    pub fn projected_by_genre(&self, genre: &str) -> Result<Cursor, DbError> {
        self.find(&queries::projected_by_genre(genre))
    }

    /// # Errors
    /// Store faults.
    pub fn sorted_by_price(&self, order: Order) -> Result<Cursor, DbError> {
        self.find(&queries::sorted_by_price(order))
    }

    /// # Errors
    /// Returns `DbError::Query` for a zero page or size.
    pub fn page(&self, page: u64, size: u64) -> Result<Cursor, DbError> {
        self.find(&queries::page(page, size)?)
    }

    /// # Errors
    /// Store faults.
    pub fn update_price(&self, title: &str, price: f64) -> Result<UpdateReport, DbError> {
        self.store.update_one(&queries::update_price(title, price))
    }

    /// # Errors
    /// Store faults.
    pub fn delete_by_title(&self, title: &str) -> Result<DeleteReport, DbError> {
        self.store.delete_one(&queries::delete_by_title(title))
    }

    /// # Errors
    /// Store faults, or `DbError::Schema` for unexpected group documents.
    pub fn average_price_by_genre(&self) -> Result<Vec<GenreStats>, DbError> {
        self.store
            .aggregate(&queries::average_price_by_genre())?
            .map(|d| GenreStats::from_document(&d))
            .collect()
    }

    /// `None` on an empty collection.
    ///
    /// # Errors
    /// Store faults, or `DbError::Schema` for unexpected group documents.
    pub fn top_author(&self) -> Result<Option<AuthorCount>, DbError> {
        self.store
            .aggregate(&queries::top_author())?
            .next()
            .map(|d| AuthorCount::from_document(&d))
            .transpose()
    }

    /// # Errors
    /// Store faults, or `DbError::Schema` for unexpected group documents.
    pub fn books_by_decade(&self) -> Result<Vec<DecadeCount>, DbError> {
        self.store
            .aggregate(&queries::books_by_decade())?
            .map(|d| DecadeCount::from_document(&d))
            .collect()
    }

    /// # Errors
    /// Store faults.
    pub fn create_title_index(&self) -> Result<String, DbError> {
        self.store.create_index(&queries::title_index())
    }

    /// # Errors
    /// Store faults.
    pub fn create_author_year_index(&self) -> Result<String, DbError> {
        self.store.create_index(&queries::author_year_index())
    }

    /// Both catalog indexes; returns their names.
    ///
    /// # Errors
    /// Store faults.
    pub fn create_indexes(&self) -> Result<Vec<String>, DbError> {
        Ok(vec![self.create_title_index()?, self.create_author_year_index()?])
    }

    /// # Errors
    /// Store faults.
    pub fn explain_title(&self, title: &str) -> Result<ExplainReport, DbError> {
        self.store.explain_find(&queries::title_lookup(title))
    }
}
