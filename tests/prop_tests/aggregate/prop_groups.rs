use plp_bookstore::seed::generate_books;
use plp_bookstore::{Catalog, MemoryStore};
use proptest::prelude::*;
use std::collections::BTreeMap;

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 32,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_group_counts_cover_collection(count in 0usize..50, seed in any::<u64>()) {
        let books = generate_books(count, seed);
        let c = Catalog::new(MemoryStore::new("prop.books"));
        c.seed(&books).unwrap();

        let mut decades: BTreeMap<String, u64> = BTreeMap::new();
        for b in &books {
            *decades.entry(format!("{}0s", &b.published_year.to_string()[..3])).or_default() += 1;
        }
        let got: BTreeMap<_, _> = c.books_by_decade().unwrap().into_iter().map(|d| (d.decade, d.count)).collect();
        prop_assert_eq!(got, decades);

        let stats = c.average_price_by_genre().unwrap();
        prop_assert_eq!(stats.iter().map(|s| s.count).sum::<u64>(), count as u64);
        prop_assert!(stats.windows(2).all(|w| w[0].avg_price >= w[1].avg_price));

        match c.top_author().unwrap() {
            None => prop_assert_eq!(count, 0),
            Some(top) => {
                let most = books.iter().filter(|b| b.author == top.author).count() as u64;
                prop_assert_eq!(top.total, most);
                let max = books.iter().map(|b| books.iter().filter(|o| o.author == b.author).count()).max().unwrap_or(0);
                prop_assert_eq!(most, max as u64);
            }
        }
    }
}
