use plp_bookstore::seed::{GENRES, generate_books};
use plp_bookstore::{Catalog, MemoryStore};
use proptest::prelude::*;

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 32,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_filters_match_manual_counts(
        count in 0usize..40,
        seed in any::<u64>(),
        genre in proptest::sample::select(GENRES),
        year in 1890i32..2030,
    ) {
        let books = generate_books(count, seed);
        let c = Catalog::new(MemoryStore::new("prop.books"));
        c.seed(&books).unwrap();

        let by_genre = books.iter().filter(|b| b.genre == genre).count();
        prop_assert_eq!(c.by_genre(genre).unwrap().len(), by_genre);
        let after = books.iter().filter(|b| b.published_year > year).count();
        prop_assert_eq!(c.published_after(year).unwrap().len(), after);
        let stocked = books.iter().filter(|b| b.in_stock && b.published_year > year).count();
        prop_assert_eq!(c.in_stock_published_after(year).unwrap().len(), stocked);
    }

    #[test]
    fn prop_projection_only_keeps_listed_fields(count in 1usize..20, seed in any::<u64>()) {
        let books = generate_books(count, seed);
        let c = Catalog::new(MemoryStore::new("prop.books"));
        c.seed(&books).unwrap();
        for genre in GENRES {
            for d in c.projected_by_genre(genre).unwrap() {
                let mut keys: Vec<_> = d.keys().cloned().collect();
                keys.sort();
                prop_assert_eq!(keys, vec!["author", "price", "title"]);
            }
        }
    }
}
