use plp_bookstore::config::{ConfigLayer, ENV_CONFIG, ENV_LOG_DIR, ENV_URI, load_config_with};
use plp_bookstore::{BookStore, CatalogConfig, DbError, sample_catalog};
use std::collections::HashMap;
use std::path::PathBuf;

fn env(pairs: &[(&str, String)]) -> impl Fn(&str) -> Option<String> + use<> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect();
    move |k| map.get(k).cloned()
}

#[test]
fn config_file_named_by_env() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("custom.toml");
    std::fs::write(&file, "connection_string = \"mongodb+srv://u:pw@cluster.example.net/library\"\ncollection = \"novels\"\n")
        .unwrap();
    let lookup = env(&[(ENV_CONFIG, file.display().to_string())]);
    let cfg = load_config_with(None, ConfigLayer::default(), lookup).unwrap();
    assert_eq!(cfg.namespace(), "library.novels");
}

#[test]
fn env_uri_beats_file_and_log_dir_flows_through() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("bookstore.toml");
    std::fs::write(&file, "connection_string = \"mongodb://file-host/fromfile\"\n").unwrap();
    let logs = dir.path().join("logs");
    let lookup = env(&[
        (ENV_URI, "mongodb://env-host:27017/fromenv".to_owned()),
        (ENV_LOG_DIR, logs.display().to_string()),
    ]);
    let cfg = load_config_with(Some(&file), ConfigLayer::default(), lookup).unwrap();
    assert_eq!(cfg.connection_string, "mongodb://env-host:27017/fromenv");
    assert_eq!(cfg.database, "fromenv");
    assert_eq!(cfg.log_dir, Some(logs));
}

#[test]
fn cli_log_dir_overrides_env() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("empty.toml");
    std::fs::write(&file, "").unwrap();
    let cli = ConfigLayer { log_dir: Some(PathBuf::from("cli-logs")), ..ConfigLayer::default() };
    let cfg = load_config_with(Some(&file), cli, env(&[(ENV_LOG_DIR, "env-logs".to_owned())])).unwrap();
    assert_eq!(cfg.log_dir.as_deref(), Some(std::path::Path::new("cli-logs")));
}

#[test]
fn malformed_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let typo = dir.path().join("typo.toml");
    std::fs::write(&typo, "colection = \"books\"\n").unwrap();
    assert!(matches!(load_config_with(Some(&typo), ConfigLayer::default(), env(&[])), Err(DbError::Toml(_))));

    let bad_uri = dir.path().join("bad.toml");
    std::fs::write(&bad_uri, "connection_string = \"postgres://localhost/db\"\n").unwrap();
    assert!(matches!(load_config_with(Some(&bad_uri), ConfigLayer::default(), env(&[])), Err(DbError::Config(_))));
}

#[test]
fn store_is_named_after_config() {
    let cfg = CatalogConfig { database: "shop".into(), collection: "inventory".into(), ..CatalogConfig::default() };
    let c = sample_catalog(&cfg).unwrap();
    assert_eq!(c.store().namespace(), "shop.inventory");
    assert_eq!(c.explain_title("Dune").unwrap().namespace, "shop.inventory");
    assert_eq!(c.store().len(), 12);
}
