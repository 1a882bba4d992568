//! Fixture data for the `books` collection.
//!
//! The catalog never creates records; a store is expected to be populated beforehand.
//! `sample_books` is the fixed set the CLI and tests seed with, `generate_books` produces
//! larger pseudo-random collections for explain runs where scan counts matter.

use crate::book::Book;
use fake::Fake;
use fake::faker::lorem::en::Words;
use fake::faker::name::en::Name;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Genres used by the generator.
pub const GENRES: &[&str] =
    &["Science Fiction", "Self-Help", "Memoir", "History", "Psychology", "Fantasy", "Mystery"];

/// Twelve books covering every query in the catalog: several genres, a repeated author,
/// years on both sides of 2010 and 2015, and both stock states.
#[must_use]
pub fn sample_books() -> Vec<Book> {
    vec![
        Book::new("Atomic Habits", "James Clear", "Self-Help", 2018, 16.99, true),
        Book::new("Educated", "Tara Westover", "Memoir", 2018, 14.99, true),
        Book::new("Dune", "Frank Herbert", "Science Fiction", 1965, 9.99, true),
        Book::new("The Martian", "Andy Weir", "Science Fiction", 2011, 12.5, true),
        Book::new("Project Hail Mary", "Andy Weir", "Science Fiction", 2021, 18.0, false),
        Book::new("Sapiens", "Yuval Noah Harari", "History", 2011, 15.0, true),
        Book::new("Homo Deus", "Yuval Noah Harari", "History", 2015, 17.25, false),
        Book::new("The 7 Habits of Highly Effective People", "Stephen Covey", "Self-Help", 1989, 13.99, true),
        Book::new("Neuromancer", "William Gibson", "Science Fiction", 1984, 8.99, true),
        Book::new("Thinking, Fast and Slow", "Daniel Kahneman", "Psychology", 2011, 19.99, true),
        Book::new("Deep Work", "Cal Newport", "Self-Help", 2016, 15.5, true),
        Book::new("Artemis", "Andy Weir", "Science Fiction", 2017, 11.0, false),
    ]
}

/// Deterministic pseudo-random books. The same `seed` always yields the same list.
#[must_use]
pub fn generate_books(count: usize, seed: u64) -> Vec<Book> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let words: Vec<String> = Words(2..5).fake_with_rng(&mut rng);
            let author: String = Name().fake_with_rng(&mut rng);
            let genre = GENRES[(0..GENRES.len()).fake_with_rng::<usize, _>(&mut rng)];
            let year: i32 = (1900..2025).fake_with_rng(&mut rng);
            let cents: u32 = (499..4999).fake_with_rng(&mut rng);
            let in_stock: bool = fake::Faker.fake_with_rng(&mut rng);
            // Suffix keeps titles unique so title lookups hit exactly one record.
            let title = format!("{} #{i}", words.join(" "));
            Book::new(title, author, genre, year, f64::from(cents) / 100.0, in_stock)
        })
        .collect()
}
