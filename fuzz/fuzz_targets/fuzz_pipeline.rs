#![no_main]
use libfuzzer_sys::fuzz_target;
use plp_bookstore::aggregate::Pipeline;
use plp_bookstore::{BookStore, MemoryStore};

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(stages) = plp_bookstore::utils::json::parse_json_array_to_bson_documents(s) {
            let store = MemoryStore::new("fuzz.books");
            let docs = plp_bookstore::seed::sample_books().iter().map(plp_bookstore::Book::to_document).collect();
            if store.insert_many(docs).is_ok() {
                let _ = store.aggregate(&Pipeline::new(stages));
            }
        }
    }
});
