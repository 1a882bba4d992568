use crate::integration_tests::_support::sample_catalog;
use log::LevelFilter;
use plp_bookstore::logger::{build_config, parse_level};
use plp_bookstore::utils::devlog;
use plp_bookstore::utils::json::parse_json_array_to_bson_documents;
use plp_bookstore::{BookStore, DbError};

fn bench_ops(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .filter(|v| v["bench"] == "query")
        .filter_map(|v| v["op"].as_str().map(str::to_owned))
        .collect()
}

#[test]
fn store_operations_emit_bench_lines() {
    let c = sample_catalog();
    let _g = devlog::enable_thread_sink();
    c.by_genre("Memoir").unwrap();
    c.update_price("Dune", 10.5).unwrap();
    c.average_price_by_genre().unwrap();
    c.create_title_index().unwrap();
    c.explain_title("Dune").unwrap();
    let lines = devlog::drain();
    assert_eq!(bench_ops(&lines), vec!["find", "update_one", "aggregate", "create_index", "explain"]);

    let find: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(find["collection"], "plp_bookstore.books");
    assert_eq!(find["examined"], 12);
    assert_eq!(find["returned"], 1);
    let explain: serde_json::Value = serde_json::from_str(&lines[4]).unwrap();
    assert_eq!(explain["stage"], "IXSCAN");
    assert!(devlog::drain().is_empty());
}

#[test]
fn sink_is_off_without_guard() {
    {
        let _g = devlog::enable_thread_sink();
    }
    sample_catalog().by_author("Andy Weir").unwrap();
    assert!(devlog::snapshot().is_empty());
}

#[test]
fn log_config_with_and_without_dev6() {
    let dir = tempfile::tempdir().unwrap();
    let with = build_config(dir.path(), parse_level(Some("debug")), None, true).unwrap();
    assert!(with.appenders().iter().any(|a| a.name() == "dev6"));
    let without = build_config(&dir.path().join("nested/logs"), LevelFilter::Info, Some(1), false).unwrap();
    assert!(without.appenders().iter().all(|a| a.name() != "dev6"));
    assert!(dir.path().join("nested/logs").is_dir());
    assert_eq!(without.root().level(), LevelFilter::Info);
}

#[test]
fn seed_files_parse_into_the_store() {
    let json = r#"[
        {"title": "Emma", "author": "Jane Austen", "genre": "Classic", "published_year": 1815, "price": 6.5, "in_stock": true},
        {"_id": "custom-1", "title": "Persuasion", "author": "Jane Austen", "genre": "Classic", "published_year": 1817, "price": 7.0, "in_stock": false}
    ]"#;
    let docs = parse_json_array_to_bson_documents(json).unwrap();
    let store = plp_bookstore::MemoryStore::new("t.books");
    let ids = store.insert_many(docs.clone()).unwrap();
    assert_eq!(ids[1], bson::Bson::String("custom-1".into()));
    assert!(matches!(store.insert_many(vec![docs[1].clone()]), Err(DbError::Query(_))));

    assert_eq!(docs[0].get_str("title").unwrap(), "Emma");
    assert!(matches!(parse_json_array_to_bson_documents("{\"a\": 1}"), Err(DbError::Schema(_))));
}
