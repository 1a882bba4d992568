use crate::integration_tests::_support::{catalog_with, numbered_books, sample_catalog};
use plp_bookstore::catalog::queries;
use plp_bookstore::cli::{Command, OutputMode, parse_order_arg, parse_project_arg, parse_sort_arg, run_to};
use plp_bookstore::{Catalog, DbError, MemoryStore, Order};

fn json_lines(c: &Catalog<MemoryStore>, cmd: Command) -> Vec<serde_json::Value> {
    let mut buf = Vec::new();
    run_to(c, cmd, OutputMode::Json, &mut buf).unwrap();
    String::from_utf8(buf).unwrap().lines().map(|l| serde_json::from_str(l).unwrap()).collect()
}

#[test]
fn demo_leaves_mutations_applied() {
    let c = sample_catalog();
    let lines = json_lines(&c, Command::Demo);
    let entries: Vec<_> = lines.iter().map(|l| l["entry"].as_str().unwrap().to_owned()).collect();
    assert_eq!(entries[0], "by_genre");
    assert!(entries.contains(&"sorted_by_price (desc)".to_owned()));
    assert!(entries.contains(&"page 2/5".to_owned()));

    assert_eq!(c.store().len(), 11);
    assert_eq!(c.find(&queries::title_lookup("Educated")).unwrap().len(), 0);
    let habits = c.books(&queries::title_lookup("Atomic Habits")).unwrap();
    assert!((habits[0].price - 18.99).abs() < f64::EPSILON);

    let update = lines.iter().find(|l| l["entry"] == "update_price").unwrap();
    assert_eq!(update["results"][0], serde_json::json!({"matched": 1, "modified": 1}));
    let created = lines.iter().find(|l| l["entry"] == "create_indexes").unwrap();
    assert_eq!(created["results"], serde_json::json!(["title_1", "author_1_published_year_-1"]));
}

#[test]
fn aggregate_entries_serialize_typed_rows() {
    let c = sample_catalog();
    let decades = json_lines(&c, Command::BooksByDecade);
    assert_eq!(decades[0]["results"][0], serde_json::json!({"decade": "1960s", "count": 1}));
    let top = json_lines(&c, Command::TopAuthor);
    assert_eq!(top[0]["results"], serde_json::json!([{"author": "Andy Weir", "total": 3}]));
    let avg = json_lines(&c, Command::AveragePriceByGenre);
    assert_eq!(avg[0]["results"][0]["genre"], "Psychology");
}

#[test]
fn list_indexes_after_create() {
    let c = sample_catalog();
    json_lines(&c, Command::CreateIndexes);
    let listed = json_lines(&c, Command::ListIndexes);
    assert_eq!(
        listed[0]["results"],
        serde_json::json!([
            {"name": "title_1", "keys": {"title": 1}},
            {"name": "author_1_published_year_-1", "keys": {"author": 1, "published_year": -1}},
        ])
    );
}

#[test]
fn object_ids_render_as_hex() {
    let c = catalog_with(&numbered_books(1, 2000));
    let rows = json_lines(&c, Command::Find {
        filter_json: "{}".into(),
        project: Some("_id".into()),
        sort: None,
        limit: None,
        skip: None,
    });
    let row = rows[0]["results"][0].as_object().unwrap();
    assert_eq!(row.len(), 1);
    let id = row["_id"].as_str().unwrap();
    assert_eq!(id.len(), 24);
    assert!(id.chars().all(|ch| ch.is_ascii_hexdigit()));
}

#[test]
fn adhoc_find_paginates_with_skip_and_limit() {
    let c = catalog_with(&numbered_books(12, 1990));
    let mut buf = Vec::new();
    let cmd = Command::Find {
        filter_json: r#"{"published_year": {"$gte": 1995}}"#.into(),
        project: Some("-_id,title".into()),
        sort: Some("-price".into()),
        limit: Some(2),
        skip: Some(1),
    };
    run_to(&c, cmd, OutputMode::Plain, &mut buf).unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), "title=Book 11\ntitle=Book 10\n");
}

#[test]
fn bad_arguments_are_errors() {
    let c = sample_catalog();
    let mut buf = Vec::new();
    let bad_json = Command::Find { filter_json: "{oops".into(), project: None, sort: None, limit: None, skip: None };
    assert!(run_to(&c, bad_json, OutputMode::Json, &mut buf).is_err());
    assert!(matches!(parse_order_arg("sideways"), Err(DbError::Query(_))));
    assert_eq!(parse_order_arg("DESC").unwrap(), Order::Desc);
    assert_eq!(parse_sort_arg("-price, title").unwrap(), bson::doc! {"price": -1, "title": 1});
    assert_eq!(parse_project_arg("-_id,title").unwrap(), bson::doc! {"_id": 0, "title": 1});
}
