use plp_bookstore::catalog::queries;
use plp_bookstore::seed::generate_books;
use plp_bookstore::{BookStore, Catalog, MemoryStore, PlanStage};
use proptest::prelude::*;

fn seeded(books: &[plp_bookstore::Book]) -> Catalog<MemoryStore> {
    let c = Catalog::new(MemoryStore::new("prop.books"));
    c.seed(books).unwrap();
    c
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 24,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_indexes_do_not_change_results(count in 1usize..40, seed in any::<u64>(), pick in any::<prop::sample::Index>()) {
        let books = generate_books(count, seed);
        let target = &books[pick.index(books.len())];
        let plain = seeded(&books);
        let indexed = seeded(&books);
        indexed.create_indexes().unwrap();

        let q = queries::by_author(&target.author);
        let a: Vec<_> = plain.find(&q).unwrap().map(|mut d| { d.remove("_id"); d }).collect();
        let b: Vec<_> = indexed.find(&q).unwrap().map(|mut d| { d.remove("_id"); d }).collect();
        prop_assert_eq!(a, b);

        let scan = plain.explain_title(&target.title).unwrap();
        let probe = indexed.explain_title(&target.title).unwrap();
        prop_assert_eq!(scan.stage, PlanStage::CollScan);
        prop_assert_eq!(scan.total_docs_examined, count as u64);
        prop_assert_eq!(probe.stage, PlanStage::IxScan);
        prop_assert_eq!(probe.n_returned, 1);
        prop_assert_eq!(probe.total_docs_examined, 1);
        prop_assert_eq!(indexed.store().list_indexes().unwrap().len(), 2);
    }
}
