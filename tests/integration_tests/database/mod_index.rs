use crate::integration_tests::_support::{sample_catalog, titles};
use bson::doc;
use plp_bookstore::catalog::queries;
use plp_bookstore::{BookStore, DbError, FindQuery, IndexModel, PlanStage};

#[test]
fn title_lookup_scans_collection_before_indexing() {
    let c = sample_catalog();
    let ex = c.explain_title("Dune").unwrap();
    assert_eq!(ex.stage, PlanStage::CollScan);
    assert_eq!(ex.n_returned, 1);
    assert_eq!(ex.total_docs_examined, 12);
    assert_eq!(ex.total_keys_examined, 0);
    assert_eq!(ex.index_name, None);
}

#[test]
fn title_lookup_uses_index_after_creation() {
    let c = sample_catalog();
    c.create_indexes().unwrap();
    let ex = c.explain_title("Dune").unwrap();
    assert!(ex.used_index());
    assert_eq!(ex.index_name.as_deref(), Some("title_1"));
    assert_eq!((ex.n_returned, ex.total_docs_examined, ex.total_keys_examined), (1, 1, 1));

    let missing = c.explain_title("No Such Book").unwrap();
    assert_eq!(missing.stage, PlanStage::IxScan);
    assert_eq!((missing.n_returned, missing.total_docs_examined), (0, 0));
}

#[test]
fn explain_document_shape() {
    let c = sample_catalog();
    let before = c.explain_title("Dune").unwrap().to_document();
    let plan = before.get_document("queryPlanner").unwrap();
    assert_eq!(plan.get_str("namespace").unwrap(), "plp_bookstore.books");
    assert_eq!(plan.get_document("parsedQuery").unwrap(), &doc! {"title": "Dune"});
    assert_eq!(plan.get_document("winningPlan").unwrap().get_str("stage").unwrap(), "COLLSCAN");
    assert_eq!(before.get_document("executionStats").unwrap().get_i64("totalDocsExamined").unwrap(), 12);

    c.create_title_index().unwrap();
    let after = c.explain_title("Dune").unwrap().to_document();
    let input = after
        .get_document("queryPlanner")
        .and_then(|p| p.get_document("winningPlan"))
        .and_then(|w| w.get_document("inputStage"))
        .unwrap();
    assert_eq!(input.get_document("keyPattern").unwrap(), &doc! {"title": 1});
    assert!(after.get_document("executionStats").unwrap().get_bool("executionSuccess").unwrap());
}

#[test]
fn list_indexes_reports_declarations() {
    let c = sample_catalog();
    assert!(c.store().list_indexes().unwrap().is_empty());
    c.create_indexes().unwrap();
    let listed = c.store().list_indexes().unwrap();
    assert_eq!(
        listed,
        vec![
            IndexModel::new(doc! {"title": 1}).with_name("title_1"),
            IndexModel::new(doc! {"author": 1, "published_year": -1}).with_name("author_1_published_year_-1"),
        ]
    );
}

#[test]
fn index_creation_is_idempotent_and_conflicts_fail() {
    let c = sample_catalog();
    assert_eq!(c.create_title_index().unwrap(), "title_1");
    assert_eq!(c.create_title_index().unwrap(), "title_1");
    assert_eq!(c.store().list_indexes().unwrap().len(), 1);

    let renamed = IndexModel::new(doc! {"title": 1}).with_name("other");
    assert!(matches!(c.store().create_index(&renamed), Err(DbError::Query(_))));
    let reused = IndexModel::new(doc! {"price": 1}).with_name("title_1");
    assert!(matches!(c.store().create_index(&reused), Err(DbError::Query(_))));
    let bad = IndexModel::new(doc! {"title": "text"});
    assert!(matches!(c.store().create_index(&bad), Err(DbError::Query(_))));
}

#[test]
fn drop_index_returns_to_collection_scan() {
    let c = sample_catalog();
    c.create_title_index().unwrap();
    c.store().drop_index("title_1").unwrap();
    assert_eq!(c.explain_title("Dune").unwrap().stage, PlanStage::CollScan);
    assert!(matches!(c.store().drop_index("title_1"), Err(DbError::NoSuchIndex(_))));
}

#[test]
fn compound_index_serves_leading_field() {
    let c = sample_catalog();
    c.create_author_year_index().unwrap();
    let q = queries::by_author("Andy Weir");
    let ex = c.store().explain_find(&q).unwrap();
    assert_eq!(ex.index_name.as_deref(), Some("author_1_published_year_-1"));
    assert_eq!((ex.n_returned, ex.total_docs_examined), (3, 3));

    // results keep collection order regardless of the index
    assert_eq!(titles(c.find(&q).unwrap()), vec!["The Martian", "Project Hail Mary", "Artemis"]);
    let year_only = FindQuery::new(doc! {"published_year": 2011});
    assert_eq!(c.store().explain_find(&year_only).unwrap().stage, PlanStage::CollScan);
}

#[test]
fn indexes_track_mutations() {
    let c = sample_catalog();
    c.create_indexes().unwrap();
    c.update_price("Dune", 11.0).unwrap();
    let dune = c.books(&queries::title_lookup("Dune")).unwrap();
    assert!((dune[0].price - 11.0).abs() < f64::EPSILON);

    c.delete_by_title("Dune").unwrap();
    let ex = c.explain_title("Dune").unwrap();
    assert_eq!((ex.stage, ex.n_returned, ex.total_docs_examined), (PlanStage::IxScan, 0, 0));

    let upd = plp_bookstore::query::UpdateQuery {
        filter: doc! {"title": "Sapiens"},
        update: doc! {"$set": {"title": "Sapiens (2nd ed.)"}},
    };
    c.store().update_one(&upd).unwrap();
    assert_eq!(c.explain_title("Sapiens").unwrap().n_returned, 0);
    assert_eq!(c.explain_title("Sapiens (2nd ed.)").unwrap().total_docs_examined, 1);
}
