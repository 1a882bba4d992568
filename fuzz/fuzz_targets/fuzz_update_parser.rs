#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(upd) = plp_bookstore::query::parse_update_json(s) {
            let mut d = bson::doc! {"title": "Dune", "price": 9.99, "published_year": 1965};
            let _ = plp_bookstore::query::apply_update(&mut d, &upd);
        }
    }
});
