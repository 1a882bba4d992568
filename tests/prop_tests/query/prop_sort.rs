use plp_bookstore::seed::generate_books;
use plp_bookstore::catalog::queries;
use plp_bookstore::{Book, Catalog, Cursor, MemoryStore, Order};
use proptest::prelude::*;

fn catalog(count: usize, seed: u64) -> (Catalog<MemoryStore>, Vec<Book>) {
    let books = generate_books(count, seed);
    let c = Catalog::new(MemoryStore::new("prop.books"));
    c.seed(&books).unwrap();
    (c, books)
}

fn titles(cursor: Cursor) -> Vec<String> {
    cursor.map(|d| d.get_str("title").unwrap().to_owned()).collect()
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 32,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_price_sort_is_monotonic_permutation(count in 0usize..40, seed in any::<u64>()) {
        let (c, books) = catalog(count, seed);
        let asc = c.books(&queries::sorted_by_price(Order::Asc)).unwrap();
        let desc = c.books(&queries::sorted_by_price(Order::Desc)).unwrap();
        prop_assert_eq!(asc.len(), books.len());
        prop_assert!(asc.windows(2).all(|w| w[0].price <= w[1].price));
        prop_assert!(desc.windows(2).all(|w| w[0].price >= w[1].price));

        let mut expected: Vec<_> = books.iter().map(|b| b.title.clone()).collect();
        let mut got: Vec<_> = asc.iter().map(|b| b.title.clone()).collect();
        expected.sort();
        got.sort();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_pages_partition_collection(count in 0usize..40, size in 1u64..8, seed in any::<u64>()) {
        let (c, books) = catalog(count, seed);
        let mut seen = Vec::new();
        let mut page = 1;
        loop {
            let rows = titles(c.page(page, size).unwrap());
            prop_assert!(rows.len() as u64 <= size);
            if rows.is_empty() {
                break;
            }
            seen.extend(rows);
            page += 1;
        }
        let all: Vec<_> = books.into_iter().map(|b| b.title).collect();
        prop_assert_eq!(seen, all);
    }
}
