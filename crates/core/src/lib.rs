//! Core types for optchain
//!
//! Market data rows, timestamp parsing, configuration and constants shared
//! across all other crates.

mod constants;
mod env_config;
mod error;
mod market;
mod time;

pub use constants::*;
pub use env_config::*;
pub use error::*;
pub use market::*;
pub use time::*;
