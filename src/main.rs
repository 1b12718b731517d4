//! # Product Tracker CLI (`ptrack`)
//!
//! The `ptrack` binary manages the product database, runs natural-language
//! searches from the terminal, and starts the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! ptrack --config ./config/ptrack.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ptrack init` | Create the SQLite database, tables, and sample products |
//! | `ptrack list` | List all products |
//! | `ptrack get <id>` | Show one product |
//! | `ptrack add ...` | Create a product |
//! | `ptrack delete <id>` | Delete a product |
//! | `ptrack search "<query>"` | Natural-language search |
//! | `ptrack filter "<query>"` | Show the filter a query translates to |
//! | `ptrack serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use product_tracker::models::ProductCreate;
use product_tracker::{config, migrate, product_cmd, search, server};

/// Product Tracker — an inventory API with natural-language search.
#[derive(Parser)]
#[command(
    name = "ptrack",
    about = "Product Tracker — an inventory API with natural-language search",
    version,
    long_about = "Product Tracker stores products in SQLite, serves CRUD over HTTP, and \
    translates plain-language search queries into structured filters with a language model."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ptrack.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the products table, and seeds
    /// three sample products into an empty table when `[db].seed` is set.
    /// Running it more than once is safe.
    Init,

    /// List all products.
    List,

    /// Show a product by its UUID.
    Get {
        /// Product UUID.
        id: String,
    },

    /// Create a product.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 0)]
        quantity: i64,
    },

    /// Delete a product by its UUID.
    Delete {
        /// Product UUID.
        id: String,
    },

    /// Search products with a natural-language query.
    ///
    /// Requires `[llm]` to be configured.
    Search {
        /// The query, e.g. "iphones under 500".
        query: String,
    },

    /// Print the raw model output and structured filter for a query.
    Filter {
        query: String,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("product_tracker=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::List => {
            product_cmd::run_list(&cfg).await?;
        }
        Commands::Get { id } => {
            product_cmd::run_get(&cfg, &id).await?;
        }
        Commands::Add {
            name,
            price,
            description,
            quantity,
        } => {
            let data = ProductCreate {
                name,
                price,
                description,
                quantity,
            };
            product_cmd::run_add(&cfg, data).await?;
        }
        Commands::Delete { id } => {
            product_cmd::run_delete(&cfg, &id).await?;
        }
        Commands::Search { query } => {
            search::run_search(&cfg, &query).await?;
        }
        Commands::Filter { query } => {
            search::run_translate(&cfg, &query).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
