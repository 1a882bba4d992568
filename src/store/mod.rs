//! The document store the catalog runs against.
//!
//! `BookStore` takes the literal query documents the catalog builds and returns cursors and
//! reports; a client for a real server implements the same trait. `MemoryStore` is the
//! in-process implementation used by the CLI and the tests.

pub mod memory;

use bson::{Bson, Document as BsonDocument};

use crate::aggregate::Pipeline;
use crate::errors::DbError;
use crate::index::{ExplainReport, IndexModel};
use crate::logger::AUDIT_TARGET;
use crate::query::{Cursor, DeleteQuery, DeleteReport, FindQuery, UpdateQuery, UpdateReport};

pub use memory::MemoryStore;

pub trait BookStore: Send + Sync {
    /// `database.collection`.
    fn namespace(&self) -> String;

    /// # Errors
    /// Returns `DbError::Query` for a malformed filter, sort or projection.
    fn find(&self, query: &FindQuery) -> Result<Cursor, DbError>;

    /// Insert documents, assigning an `_id` where missing. Returns the ids in input order.
    ///
    /// # Errors
    /// Returns `DbError::Query` on a duplicate `_id`.
    fn insert_many(&self, docs: Vec<BsonDocument>) -> Result<Vec<Bson>, DbError>;

    /// Modify the first match in collection order.
    ///
    /// # Errors
    /// Returns `DbError::Query` for a malformed filter or update document.
    fn update_one(&self, query: &UpdateQuery) -> Result<UpdateReport, DbError>;

    /// Remove the first match in collection order.
    ///
    /// # Errors
    /// Returns `DbError::Query` for a malformed filter.
    fn delete_one(&self, query: &DeleteQuery) -> Result<DeleteReport, DbError>;

    /// # Errors
    /// Returns `DbError::Query` for unknown stages or operators and expression failures.
    fn aggregate(&self, pipeline: &Pipeline) -> Result<Cursor, DbError>;

    /// Declare an index; re-declaring the same key pattern returns the existing name.
    ///
    /// # Errors
    /// Returns `DbError::Query` for an invalid key pattern or a conflicting declaration.
    fn create_index(&self, model: &IndexModel) -> Result<String, DbError>;

    /// # Errors
    /// Returns `DbError::NoSuchIndex` when no index has that name.
    fn drop_index(&self, name: &str) -> Result<(), DbError>;

    /// # Errors
    /// Store faults only.
    fn list_indexes(&self) -> Result<Vec<IndexModel>, DbError>;

    /// Run the find and report how it executed.
    ///
    /// # Errors
    /// Same as `find`.
    fn explain_find(&self, query: &FindQuery) -> Result<ExplainReport, DbError>;
}

pub(crate) fn log_audit(op: &str, namespace: &str, doc_id: Option<&Bson>) {
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    let doc_id = doc_id.map(ToString::to_string);
    let line = serde_json::json!({"ts": ts, "op": op, "collection": namespace, "doc_id": doc_id});
    log::info!(target: AUDIT_TARGET, "{line}");
}
