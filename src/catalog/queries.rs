//! The catalog literals. Each function only builds the query document; nothing here
//! touches a store.

use bson::{Bson, Document as BsonDocument};

use crate::aggregate::Pipeline;
use crate::book::fields;
use crate::errors::DbError;
use crate::index::IndexModel;
use crate::query::{DeleteQuery, FindQuery, Order, UpdateQuery};

fn eq(field: &str, value: impl Into<Bson>) -> BsonDocument {
    let mut d = BsonDocument::new();
    d.insert(field, value);
    d
}

fn op(name: &str, value: impl Into<Bson>) -> BsonDocument {
    eq(name, value)
}

/// `{genre: g}`
#[must_use]
pub fn by_genre(genre: &str) -> FindQuery {
    FindQuery::new(eq(fields::GENRE, genre))
}

/// `{published_year: {$gt: y}}`
#[must_use]
pub fn published_after(year: i32) -> FindQuery {
    FindQuery::new(eq(fields::PUBLISHED_YEAR, op("$gt", year)))
}

/// `{author: a}`
#[must_use]
pub fn by_author(author: &str) -> FindQuery {
    FindQuery::new(eq(fields::AUTHOR, author))
}

/// `{in_stock: true, published_year: {$gt: y}}`
#[must_use]
pub fn in_stock_published_after(year: i32) -> FindQuery {
    let mut filter = eq(fields::IN_STOCK, true);
    filter.insert(fields::PUBLISHED_YEAR, op("$gt", year));
    FindQuery::new(filter)
}

/// `{genre: g}` keeping only title, author and price.
#[must_use]
pub fn projected_by_genre(genre: &str) -> FindQuery {
    let mut projection = eq(fields::ID, 0);
    for f in [fields::TITLE, fields::AUTHOR, fields::PRICE] {
        projection.insert(f, 1);
    }
    by_genre(genre).projection(projection)
}

/// All books by price.
#[must_use]
pub fn sorted_by_price(order: Order) -> FindQuery {
    FindQuery::new(BsonDocument::new()).sort(eq(fields::PRICE, order.as_i32()))
}

/// 1-indexed page of `size` books in collection order.
///
/// # Errors
/// Returns `DbError::Query` when `page` or `size` is zero or the offset overflows.
pub fn page(page: u64, size: u64) -> Result<FindQuery, DbError> {
    if page == 0 || size == 0 {
        return Err(DbError::query(format!("page and size must be positive (page {page}, size {size})")));
    }
    let skip = (page - 1)
        .checked_mul(size)
        .ok_or_else(|| DbError::query(format!("page {page} of size {size} is out of range")))?;
    Ok(FindQuery::new(BsonDocument::new()).skip(skip).limit(size))
}

/// `updateOne({title}, {$set: {price}})`
#[must_use]
pub fn update_price(title: &str, price: f64) -> UpdateQuery {
    UpdateQuery { filter: eq(fields::TITLE, title), update: op("$set", eq(fields::PRICE, price)) }
}

/// `deleteOne({title})`
#[must_use]
pub fn delete_by_title(title: &str) -> DeleteQuery {
    DeleteQuery { filter: eq(fields::TITLE, title) }
}

fn group(id: &str, accumulators: &[(&str, BsonDocument)]) -> BsonDocument {
    let mut spec = eq(fields::ID, id);
    for (name, acc) in accumulators {
        spec.insert(*name, acc.clone());
    }
    op("$group", spec)
}

fn field_ref(field: &str) -> String {
    format!("${field}")
}

/// Mean price and count per genre, most expensive genre first.
#[must_use]
pub fn average_price_by_genre() -> Pipeline {
    Pipeline::new(vec![
        group(
            &field_ref(fields::GENRE),
            &[("avgPrice", op("$avg", field_ref(fields::PRICE))), ("count", op("$sum", 1))],
        ),
        op("$sort", eq("avgPrice", -1)),
    ])
}

/// The author with the most books.
#[must_use]
pub fn top_author() -> Pipeline {
    Pipeline::new(vec![
        group(&field_ref(fields::AUTHOR), &[("total", op("$sum", 1))]),
        op("$sort", eq("total", -1)),
        op("$limit", 1),
    ])
}

/// Books per decade label, labels ascending. The label is the first three characters of
/// the year's text plus `"0s"`.
#[must_use]
pub fn books_by_decade() -> Pipeline {
    let substr = op(
        "$substr",
        Bson::Array(vec![Bson::String(field_ref(fields::PUBLISHED_YEAR)), Bson::Int32(0), Bson::Int32(3)]),
    );
    let decade = op("$concat", Bson::Array(vec![Bson::Document(substr), Bson::String("0s".into())]));
    Pipeline::new(vec![
        op("$project", eq("decade", decade)),
        group("$decade", &[("count", op("$sum", 1))]),
        op("$sort", eq(fields::ID, 1)),
    ])
}

/// `{title: 1}`
#[must_use]
pub fn title_index() -> IndexModel {
    IndexModel::new(eq(fields::TITLE, 1))
}

/// `{author: 1, published_year: -1}`
#[must_use]
pub fn author_year_index() -> IndexModel {
    let mut keys = eq(fields::AUTHOR, 1);
    keys.insert(fields::PUBLISHED_YEAR, -1);
    IndexModel::new(keys)
}

/// The find whose plan `explain_title` reports.
#[must_use]
pub fn title_lookup(title: &str) -> FindQuery {
    FindQuery::new(eq(fields::TITLE, title))
}
