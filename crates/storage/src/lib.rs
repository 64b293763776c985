//! Storage layer for optchain
//!
//! MySQL persistence for index minute bars and option quotes. An in-process
//! backend with identical semantics is available behind the `memory` feature.

#[cfg(any(test, feature = "memory"))]
mod memory;
mod error;
mod migrations;
mod mysql_storage;
pub mod traits;
mod types;

use std::sync::Arc;

pub use error::StorageError;
#[cfg(any(test, feature = "memory"))]
pub use memory::MemoryStorage;
pub use migrations::run_mysql_migrations;
pub use mysql_storage::MySqlStorage;
pub use traits::{AdminStore, IndexStore, MarketStore, OptionStore, StatsStore};
pub use types::{PaginatedResult, ResetSummary, StorageStats};

/// Shared handle to whichever backend the process runs with.
pub type SharedStore = Arc<dyn MarketStore>;
