use crate::query::Order;

/// One catalog run, independent of how the arguments were parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ByGenre {
        genre: String,
    },
    PublishedAfter {
        year: i32,
    },
    ByAuthor {
        author: String,
    },
    InStockPublishedAfter {
        year: i32,
    },
    ProjectedByGenre {
        genre: String,
    },
    SortedByPrice {
        order: Order,
    },
    Page {
        page: u64,
        size: u64,
    },
    UpdatePrice {
        title: String,
        price: f64,
    },
    DeleteByTitle {
        title: String,
    },
    AveragePriceByGenre,
    TopAuthor,
    BooksByDecade,
    CreateIndexes,
    ListIndexes,
    ExplainTitle {
        title: String,
    },
    // Ad-hoc find (programmatic)
    Find {
        filter_json: String,
        project: Option<String>,
        sort: Option<String>,
        limit: Option<u64>,
        skip: Option<u64>,
    },
    /// Every catalog entry in order, with the arguments of the reference script.
    Demo,
}

impl Command {
    /// Entry name as listed in [`crate::catalog::ENTRIES`]; ad-hoc commands have their own.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ByGenre { .. } => "by_genre",
            Self::PublishedAfter { .. } => "published_after",
            Self::ByAuthor { .. } => "by_author",
            Self::InStockPublishedAfter { .. } => "in_stock_published_after",
            Self::ProjectedByGenre { .. } => "projected_by_genre",
            Self::SortedByPrice { .. } => "sorted_by_price",
            Self::Page { .. } => "page",
            Self::UpdatePrice { .. } => "update_price",
            Self::DeleteByTitle { .. } => "delete_by_title",
            Self::AveragePriceByGenre => "average_price_by_genre",
            Self::TopAuthor => "top_author",
            Self::BooksByDecade => "books_by_decade",
            Self::CreateIndexes => "create_indexes",
            Self::ListIndexes => "list_indexes",
            Self::ExplainTitle { .. } => "explain_title",
            Self::Find { .. } => "find",
            Self::Demo => "demo",
        }
    }

    /// The demo sequence: each catalog entry with fixed walkthrough arguments,
    /// explaining the title lookup once before and once after the indexes exist.
    #[must_use]
    pub fn demo_steps() -> Vec<Self> {
        vec![
            Self::ByGenre { genre: "Science Fiction".into() },
            Self::PublishedAfter { year: 2015 },
            Self::ByAuthor { author: "James Clear".into() },
            Self::UpdatePrice { title: "Atomic Habits".into(), price: 18.99 },
            Self::DeleteByTitle { title: "Educated".into() },
            Self::InStockPublishedAfter { year: 2010 },
            Self::ProjectedByGenre { genre: "Self-Help".into() },
            Self::SortedByPrice { order: Order::Asc },
            Self::SortedByPrice { order: Order::Desc },
            Self::Page { page: 2, size: 5 },
            Self::AveragePriceByGenre,
            Self::TopAuthor,
            Self::BooksByDecade,
            Self::ExplainTitle { title: "Dune".into() },
            Self::CreateIndexes,
            Self::ExplainTitle { title: "Dune".into() },
        ]
    }
}
