//! Mirrored product inspection commands.
//!
//! # Usage
//!
//! ```bash
//! mirror-cli products list --first 25 --page 2
//! mirror-cli products list --search "blue widget" --status draft --vendor "Acme Corp"
//! mirror-cli products show 632910392
//! ```
//!
//! # Environment Variables
//!
//! - `MIRROR_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use catalog_mirror::db::{
    DEFAULT_PAGE_SIZE, Pagination, PgProductStore, ProductFilter, ProductPage, ProductStore,
};
use catalog_mirror_core::ProductStatus;
use clap::Args;

use super::{CommandError, connect};

/// Filters and paging for `products list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Page size (1-100)
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub first: u32,

    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Case-insensitive match on title, vendor or handle
    #[arg(long)]
    pub search: Option<String>,

    /// Product status (`active`, `draft`, `archived`)
    #[arg(long)]
    pub status: Option<String>,

    /// Exact vendor name
    #[arg(long)]
    pub vendor: Option<String>,

    /// Print the page as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    fn filter(&self) -> Result<ProductFilter, CommandError> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<ProductStatus>)
            .transpose()
            .map_err(|e| CommandError::InvalidArgument(e.to_string()))?;

        Ok(ProductFilter {
            search: self.search.clone(),
            status,
            vendor: self.vendor.clone(),
        })
    }
}

/// List mirrored products.
///
/// # Errors
///
/// Returns error if the status filter is invalid or the query fails.
pub async fn list(args: ListArgs) -> Result<(), CommandError> {
    let filter = args.filter()?;
    let store = PgProductStore::new(connect().await?);

    let page = store
        .list(&filter, Pagination::new(args.first, args.page))
        .await?;

    if args.json {
        let json = serde_json::to_string_pretty(&page)?;
        #[allow(clippy::print_stdout)]
        {
            println!("{json}");
        }
    } else {
        print_table(&page);
    }
    Ok(())
}

/// Show one mirrored product as JSON.
///
/// # Errors
///
/// Returns `CommandError::NotFound` if no product has this Shopify ID.
pub async fn show(shopify_id: &str) -> Result<(), CommandError> {
    let store = PgProductStore::new(connect().await?);

    let product = store
        .find_by_shopify_id(shopify_id)
        .await?
        .ok_or_else(|| CommandError::NotFound(format!("product {shopify_id}")))?;

    let json = serde_json::to_string_pretty(&product)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}

fn print_table(page: &ProductPage) {
    #[allow(clippy::print_stdout)]
    {
        println!(
            "{:>6}  {:<16}  {:<8}  {:<20}  TITLE",
            "ID", "SHOPIFY ID", "STATUS", "VENDOR"
        );
        for product in &page.products {
            println!(
                "{:>6}  {:<16}  {:<8}  {:<20}  {}",
                product.id.as_i32(),
                product.shopify_id,
                product.status.as_str(),
                product.vendor.as_deref().unwrap_or("-"),
                product.title
            );
        }
        println!(
            "\nPage {} of {} ({} products)",
            page.current_page, page.last_page, page.total
        );
    }
}
