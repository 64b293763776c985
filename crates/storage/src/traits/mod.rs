//! Storage backend trait abstraction
//!
//! Async domain traits for the two tables plus statistics and administration.
//! `MarketStore` bundles them so services can hold one `Arc<dyn MarketStore>`.

pub mod admin;
pub mod index;
pub mod option;
pub mod stats;

pub use admin::AdminStore;
pub use index::IndexStore;
pub use option::OptionStore;
pub use stats::StatsStore;

/// Everything the services need from a backend.
pub trait MarketStore: IndexStore + OptionStore + StatsStore + AdminStore {}

impl<T: IndexStore + OptionStore + StatsStore + AdminStore> MarketStore for T {}
