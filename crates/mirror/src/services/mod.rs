//! Business logic services for the mirror.
//!
//! # Services
//!
//! - `sync` - Product synchronization (sole writer of the local store)

pub mod sync;

pub use sync::{ProductSyncService, SyncError};
