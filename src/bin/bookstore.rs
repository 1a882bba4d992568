use clap::{Parser, Subcommand};
use plp_bookstore::cli::{self as prog_cli, Command, OutputMode};
use plp_bookstore::config::{ConfigLayer, load_config};
use plp_bookstore::utils::json::parse_json_array_to_bson_documents;
use plp_bookstore::{BookStore, Catalog, DbError, MemoryStore, logger, seed};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bookstore", version, about = "Book collection query catalog", long_about = None)]
struct Cli {
    #[arg(long, help = "Path to a config file (TOML)")]
    config: Option<PathBuf>,
    #[arg(long, help = "Connection string (mongodb:// or mongodb+srv://). Overrides config/env.")]
    uri: Option<String>,
    #[arg(long, help = "Database name. Overrides config/env and the connection-string path.")]
    db: Option<String>,
    #[arg(long, help = "Collection name. Overrides config/env.")]
    collection: Option<String>,
    #[arg(long, help = "Seed the store from a JSON array file instead of the built-in sample")]
    seed: Option<PathBuf>,
    #[arg(long, conflicts_with = "seed", help = "Seed with N generated books instead of the built-in sample")]
    generate: Option<usize>,
    #[arg(long, default_value_t = 42, help = "RNG seed for --generate")]
    rng_seed: u64,
    #[arg(long, help = "Directory for app.log and audit.log; logging is off without it")]
    log_dir: Option<PathBuf>,
    #[arg(long, help = "Log level: off|error|warn|info|debug|trace")]
    log_level: Option<String>,
    #[arg(long, help = "Also write developer bench lines to dev6.log")]
    dev6: bool,
    #[arg(long, help = "Emit one JSON object per entry")]
    json: bool,
    #[arg(long, conflicts_with = "json", help = "Emit key=value lines")]
    plain: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(name = "by-genre", about = "Books in a genre")]
    ByGenre { genre: String },
    #[command(name = "published-after", about = "Books published strictly after a year")]
    PublishedAfter { year: i32 },
    #[command(name = "by-author", about = "Books by an author")]
    ByAuthor { author: String },
    #[command(name = "in-stock-after", about = "In-stock books published strictly after a year")]
    InStockAfter { year: i32 },
    #[command(name = "projected-by-genre", about = "Title, author and price of books in a genre")]
    ProjectedByGenre { genre: String },
    #[command(name = "sorted-by-price", about = "All books by price")]
    SortedByPrice {
        #[arg(default_value = "asc", help = "asc|desc")]
        order: String,
    },
    #[command(name = "page", about = "One page of books (pages start at 1)")]
    Page {
        page: u64,
        #[arg(default_value_t = 5)]
        size: u64,
    },
    #[command(name = "update-price", about = "Set the price of the first book with a title")]
    UpdatePrice { title: String, price: f64 },
    #[command(name = "delete", about = "Delete the first book with a title")]
    Delete { title: String },
    #[command(name = "avg-price-by-genre", about = "Average price and count per genre")]
    AvgPriceByGenre,
    #[command(name = "top-author", about = "Author with the most books")]
    TopAuthor,
    #[command(name = "by-decade", about = "Book count per decade")]
    ByDecade,
    #[command(name = "create-indexes", about = "Create the title and author/year indexes")]
    CreateIndexes,
    #[command(name = "list-indexes", about = "List declared indexes")]
    ListIndexes,
    #[command(name = "explain", about = "Execution statistics of a title lookup")]
    Explain {
        title: String,
        #[arg(long, help = "Create the catalog indexes first")]
        indexed: bool,
    },
    #[command(name = "find", about = "Ad-hoc find with a JSON filter")]
    Find {
        filter: String,
        #[arg(long, help = "Comma-separated fields; -field excludes")]
        project: Option<String>,
        #[arg(long, help = "Comma-separated fields; -field sorts descending")]
        sort: Option<String>,
        #[arg(long)]
        limit: Option<u64>,
        #[arg(long)]
        skip: Option<u64>,
    },
    #[command(name = "demo", about = "Run every catalog entry in order")]
    Demo,
}

fn to_command(cmd: Commands) -> Result<Vec<Command>, DbError> {
    Ok(vec![match cmd {
        Commands::ByGenre { genre } => Command::ByGenre { genre },
        Commands::PublishedAfter { year } => Command::PublishedAfter { year },
        Commands::ByAuthor { author } => Command::ByAuthor { author },
        Commands::InStockAfter { year } => Command::InStockPublishedAfter { year },
        Commands::ProjectedByGenre { genre } => Command::ProjectedByGenre { genre },
        Commands::SortedByPrice { order } => Command::SortedByPrice { order: prog_cli::parse_order_arg(&order)? },
        Commands::Page { page, size } => Command::Page { page, size },
        Commands::UpdatePrice { title, price } => Command::UpdatePrice { title, price },
        Commands::Delete { title } => Command::DeleteByTitle { title },
        Commands::AvgPriceByGenre => Command::AveragePriceByGenre,
        Commands::TopAuthor => Command::TopAuthor,
        Commands::ByDecade => Command::BooksByDecade,
        Commands::CreateIndexes => Command::CreateIndexes,
        Commands::ListIndexes => Command::ListIndexes,
        Commands::Explain { title, indexed: true } => {
            return Ok(vec![Command::CreateIndexes, Command::ExplainTitle { title }]);
        }
        Commands::Explain { title, indexed: false } => Command::ExplainTitle { title },
        Commands::Find { filter, project, sort, limit, skip } => {
            Command::Find { filter_json: filter, project, sort, limit, skip }
        }
        Commands::Demo => Command::Demo,
    }])
}

fn run(cli: Cli) -> Result<(), DbError> {
    let overrides = ConfigLayer {
        connection_string: cli.uri,
        database: cli.db,
        collection: cli.collection,
        log_dir: cli.log_dir,
        log_level: cli.log_level,
    };
    let cfg = load_config(cli.config.as_deref(), overrides)?;
    logger::configure_from_env(logger::EnvLogSettings {
        dir: cfg.log_dir.clone(),
        level: cfg.log_level.clone(),
        retention: None,
        dev6: cli.dev6,
    })?;

    let catalog = Catalog::new(MemoryStore::from_config(&cfg));
    match (&cli.seed, cli.generate) {
        (Some(path), _) => {
            let docs = parse_json_array_to_bson_documents(&std::fs::read_to_string(path)?)?;
            catalog.store().insert_many(docs)?;
        }
        (None, Some(n)) => {
            catalog.seed(&seed::generate_books(n, cli.rng_seed))?;
        }
        (None, None) => {
            catalog.seed(&seed::sample_books())?;
        }
    }

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.plain {
        OutputMode::Plain
    } else {
        OutputMode::Human
    };
    for cmd in to_command(cli.command)? {
        prog_cli::run_with_format(&catalog, cmd, mode)?;
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
