//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! mirror-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `MIRROR_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/mirror/migrations/` and are embedded at build time:
//! ```text
//! migrations/
//! ├── 20260212000001_create_products.sql
//! └── 20260212000002_create_sync_jobs.sql
//! ```

use super::{CommandError, connect};

/// Run the mirror database migrations.
///
/// # Errors
///
/// Returns error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running mirror migrations...");
    catalog_mirror::db::migrate(&pool).await?;

    tracing::info!("Mirror migrations complete!");
    Ok(())
}
