use crate::integration_tests::_support::{catalog_with, numbered_books, sample_catalog, titles};
use bson::doc;
use plp_bookstore::catalog::queries;
use plp_bookstore::{Book, DbError, FindQuery, Order};

#[test]
fn genre_filter_returns_exactly_that_genre() {
    let c = sample_catalog();
    let sf = c.books(&queries::by_genre("Science Fiction")).unwrap();
    assert_eq!(sf.len(), 5);
    assert!(sf.iter().all(|b| b.genre == "Science Fiction"));
    assert_eq!(c.by_genre("Poetry").unwrap().len(), 0);
}

#[test]
fn published_after_is_strict() {
    let c = sample_catalog();
    let after = c.books(&queries::published_after(2018)).unwrap();
    assert_eq!(after.iter().map(|b| b.title.as_str()).collect::<Vec<_>>(), vec!["Project Hail Mary"]);

    let old = catalog_with(&numbered_books(4, 2000));
    assert_eq!(old.published_after(2015).unwrap().len(), 0);
    let new = catalog_with(&numbered_books(4, 2016));
    assert_eq!(new.published_after(2015).unwrap().len(), 4);
}

#[test]
fn author_and_stock_filters() {
    let c = sample_catalog();
    assert_eq!(titles(c.by_author("James Clear").unwrap()), vec!["Atomic Habits"]);
    let got = titles(c.in_stock_published_after(2010).unwrap());
    assert_eq!(got, vec!["Atomic Habits", "Educated", "The Martian", "Sapiens", "Thinking, Fast and Slow", "Deep Work"]);
}

#[test]
fn projection_keeps_only_listed_fields() {
    let c = sample_catalog();
    let docs: Vec<_> = c.projected_by_genre("Self-Help").unwrap().collect();
    assert_eq!(docs.len(), 3);
    for d in &docs {
        let mut keys: Vec<_> = d.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["author", "price", "title"]);
    }
    assert_eq!(docs[0], doc! {"title": "Atomic Habits", "author": "James Clear", "price": 16.99});
}

#[test]
fn sorted_by_price_both_directions() {
    let c = sample_catalog();
    let asc: Vec<Book> = c.books(&queries::sorted_by_price(Order::Asc)).unwrap();
    assert!(asc.windows(2).all(|w| w[0].price <= w[1].price));
    assert_eq!(asc[0].title, "Neuromancer");
    let desc = c.books(&queries::sorted_by_price(Order::Desc)).unwrap();
    assert!(desc.windows(2).all(|w| w[0].price >= w[1].price));
    assert_eq!(desc[0].title, "Thinking, Fast and Slow");
}

#[test]
fn price_ties_keep_collection_order() {
    let books = vec![
        Book::new("A", "x", "g", 2000, 5.0, true),
        Book::new("B", "x", "g", 2000, 1.0, true),
        Book::new("C", "x", "g", 2000, 5.0, true),
    ];
    let c = catalog_with(&books);
    assert_eq!(titles(c.sorted_by_price(Order::Asc).unwrap()), vec!["B", "A", "C"]);
    assert_eq!(titles(c.sorted_by_price(Order::Desc).unwrap()), vec!["A", "C", "B"]);
}

#[test]
fn pagination_over_twelve_records() {
    let c = catalog_with(&numbered_books(12, 1990));
    let page = |n| titles(c.page(n, 5).unwrap());
    assert_eq!(page(1), vec!["Book 1", "Book 2", "Book 3", "Book 4", "Book 5"]);
    assert_eq!(page(2), vec!["Book 6", "Book 7", "Book 8", "Book 9", "Book 10"]);
    assert_eq!(page(3), vec!["Book 11", "Book 12"]);
    assert!(page(4).is_empty());
}

#[test]
fn pagination_rejects_zero() {
    let c = sample_catalog();
    assert!(matches!(c.page(0, 5), Err(DbError::Query(_))));
    assert!(matches!(c.page(1, 0), Err(DbError::Query(_))));
}

#[test]
fn cursor_is_restartable() {
    let c = sample_catalog();
    let mut cur = c.by_author("Andy Weir").unwrap();
    let first: Vec<_> = cur.by_ref().collect();
    assert_eq!(first.len(), 3);
    assert!(cur.next().is_none());
    cur.rewind();
    assert_eq!(cur.count(), 3);
}

#[test]
fn malformed_literals_are_query_errors() {
    let c = sample_catalog();
    let bad_op = FindQuery::new(doc! {"price": {"$near": 1}});
    assert!(matches!(c.find(&bad_op), Err(DbError::Query(_))));
    let mixed = FindQuery::new(doc! {}).projection(doc! {"title": 1, "price": 0});
    assert!(matches!(c.find(&mixed), Err(DbError::Query(_))));
}

#[test]
fn oversized_membership_lists_are_rejected() {
    let c = sample_catalog();
    let mut genres: Vec<bson::Bson> = (0..1000).map(|i| format!("Genre {i}").into()).collect();
    genres.push("Science Fiction".into());
    let nin = FindQuery::new(doc! {"genre": {"$nin": genres.clone()}});
    assert!(matches!(c.find(&nin), Err(DbError::Query(_))));
    let within = FindQuery::new(doc! {"genre": {"$in": genres.clone()}});
    assert!(matches!(c.find(&within), Err(DbError::Query(_))));

    let last_thousand = FindQuery::new(doc! {"genre": {"$in": genres[1..].to_vec()}});
    assert_eq!(c.find(&last_thousand).unwrap().len(), 5);
}
