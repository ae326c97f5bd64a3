//! Catalog Mirror CLI - Migrations, syncing and inspection tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! mirror-cli migrate
//!
//! # Queue a full catalog sync (workers pick it up)
//! mirror-cli sync
//!
//! # Queue a full sync and run it in this process
//! mirror-cli sync --drain
//!
//! # Sync one product now
//! mirror-cli sync --product-id 632910392
//!
//! # Run job workers until Ctrl+C
//! mirror-cli work --concurrency 4
//!
//! # Inspect mirrored products
//! mirror-cli products list --search widget --status active
//! mirror-cli products show 632910392
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `sync` - Full or single-product sync
//! - `work` - Run background job workers
//! - `products` - List and show mirrored products

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::products::ListArgs;

#[derive(Parser)]
#[command(name = "mirror-cli")]
#[command(author, version, about = "Catalog Mirror CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Sync products from Shopify
    Sync {
        /// Sync only this Shopify product ID, immediately
        #[arg(long)]
        product_id: Option<String>,

        /// After queueing a full sync, process the queue here until it is empty
        #[arg(long, conflicts_with = "product_id")]
        drain: bool,
    },
    /// Run background job workers until interrupted
    Work {
        /// Number of concurrent workers (defaults to `MIRROR_WORKERS`)
        #[arg(short, long)]
        concurrency: Option<usize>,
    },
    /// Inspect mirrored products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List mirrored products
    List(ListArgs),
    /// Show one mirrored product as JSON
    Show {
        /// Shopify product ID
        shopify_id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Sync { product_id, drain } => match product_id {
            Some(id) => commands::sync::single(&id).await?,
            None => commands::sync::full(drain).await?,
        },
        Commands::Work { concurrency } => commands::work::run(concurrency).await?,
        Commands::Products { action } => match action {
            ProductsAction::List(args) => commands::products::list(args).await?,
            ProductsAction::Show { shopify_id } => commands::products::show(&shopify_id).await?,
        },
    }
    Ok(())
}
