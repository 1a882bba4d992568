//! Filter, update, sort and projection model for the document store, parsed from the
//! store's literal query documents.

pub mod cursor;
pub mod eval;
pub mod exec;
pub mod parse;
pub mod types;

pub use cursor::Cursor;
pub use eval::{apply_projection, bson_eq, compare_bson, compare_docs, eval_filter, get_path};
pub use exec::{apply_update, run_find};
pub use parse::{
    parse_filter, parse_filter_json, parse_find, parse_order, parse_projection, parse_sort,
    parse_update, parse_update_json,
};
pub use types::{
    CmpOp, DeleteQuery, DeleteReport, Filter, FindOptions, FindQuery, Order, Projection, SortSpec,
    UpdateDoc, UpdateQuery, UpdateReport,
};
