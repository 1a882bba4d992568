use crate::integration_tests::_support::{catalog_with, sample_catalog};
use bson::doc;
use plp_bookstore::catalog::queries;
use plp_bookstore::query::{DeleteQuery, UpdateQuery};
use plp_bookstore::{Book, BookStore, DbError, DeleteReport, UpdateReport};

#[test]
fn update_then_read_returns_new_price() {
    let c = sample_catalog();
    let r = c.update_price("Atomic Habits", 18.99).unwrap();
    assert_eq!(r, UpdateReport { matched: 1, modified: 1 });
    let got = c.books(&queries::title_lookup("Atomic Habits")).unwrap();
    assert_eq!(got.len(), 1);
    assert!((got[0].price - 18.99).abs() < f64::EPSILON);
    assert_eq!(c.store().len(), 12);
}

#[test]
fn update_to_same_price_matches_without_modifying() {
    let c = sample_catalog();
    assert_eq!(c.update_price("Dune", 9.99).unwrap(), UpdateReport { matched: 1, modified: 0 });
    assert_eq!(c.update_price("Missing", 1.0).unwrap(), UpdateReport::default());
}

#[test]
fn update_touches_only_first_duplicate() {
    let books = vec![
        Book::new("Twin", "a", "g", 2000, 1.0, true),
        Book::new("Twin", "b", "g", 2001, 2.0, true),
    ];
    let c = catalog_with(&books);
    c.update_price("Twin", 7.0).unwrap();
    let got = c.books(&queries::title_lookup("Twin")).unwrap();
    assert_eq!(got.iter().map(|b| b.price).collect::<Vec<_>>(), vec![7.0, 2.0]);
}

#[test]
fn delete_then_read_returns_empty() {
    let c = sample_catalog();
    assert_eq!(c.delete_by_title("Educated").unwrap(), DeleteReport { deleted: 1 });
    assert_eq!(c.find(&queries::title_lookup("Educated")).unwrap().len(), 0);
    assert_eq!(c.store().len(), 11);
    assert_eq!(c.delete_by_title("Educated").unwrap(), DeleteReport { deleted: 0 });
}

#[test]
fn store_update_operators() {
    let c = sample_catalog();
    let store = c.store();
    let inc = UpdateQuery { filter: doc! {"title": "Dune"}, update: doc! {"$inc": {"published_year": 1}} };
    assert_eq!(store.update_one(&inc).unwrap().modified, 1);
    let unset = UpdateQuery { filter: doc! {"title": "Dune"}, update: doc! {"$unset": {"in_stock": ""}} };
    assert_eq!(store.update_one(&unset).unwrap().modified, 1);
    let dune: Vec<_> = c.find(&queries::title_lookup("Dune")).unwrap().collect();
    assert_eq!(dune[0].get_i32("published_year").unwrap(), 1966);
    assert!(!dune[0].contains_key("in_stock"));
    assert!(matches!(Book::from_document(&dune[0]), Err(DbError::Schema(_))));

    let replacement = UpdateQuery { filter: doc! {"title": "Dune"}, update: doc! {"price": 1.0} };
    assert!(matches!(store.update_one(&replacement), Err(DbError::Query(_))));
    let del = DeleteQuery { filter: doc! {"$or": [{"title": "Dune"}, {"title": "Sapiens"}]} };
    assert_eq!(store.delete_one(&del).unwrap().deleted, 1);
    assert_eq!(c.find(&queries::title_lookup("Sapiens")).unwrap().len(), 1);
}

#[test]
fn type_mismatched_updates_are_rejected() {
    let c = sample_catalog();
    let store = c.store();
    let inc = UpdateQuery { filter: doc! {"title": "Dune"}, update: doc! {"$inc": {"author": 1}} };
    assert!(matches!(store.update_one(&inc), Err(DbError::Query(_))));
    let dotted = UpdateQuery { filter: doc! {"title": "Dune"}, update: doc! {"$set": {"author.first": "Frank"}} };
    assert!(matches!(store.update_one(&dotted), Err(DbError::Query(_))));
    let dune = c.books(&queries::title_lookup("Dune")).unwrap();
    assert_eq!(dune[0].author, "Frank Herbert");
}
