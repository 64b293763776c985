//! MySQL storage backend using sqlx.
//!
//! Split into modular files by domain concern.

#![allow(clippy::absolute_paths, reason = "std paths in error handling are clear")]

mod admin;
mod index;
mod options;
mod stats;

use std::str::FromStr;
use std::time::Duration;

use optchain_core::{
    DatabaseConfig, IndexRow, MYSQL_POOL_IDLE_TIMEOUT_SECS, MYSQL_POOL_MAX_CONNECTIONS,
    MYSQL_POOL_MAX_LIFETIME_SECS, OptionRow, OptionType,
};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::{MySqlPool, Row};

use crate::error::StorageError;
use crate::migrations::run_mysql_migrations;

#[derive(Clone, Debug)]
pub struct MySqlStorage {
    pool: MySqlPool,
}

impl MySqlStorage {
    /// Connect, verify the connection and create the schema.
    ///
    /// Fails if the server is unreachable within `connect_timeout_secs`.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, StorageError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(MYSQL_POOL_MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(MYSQL_POOL_IDLE_TIMEOUT_SECS))
            .max_lifetime(Duration::from_secs(MYSQL_POOL_MAX_LIFETIME_SECS))
            .test_before_acquire(true)
            .connect_with(connect_options(config)?)
            .await?;
        run_mysql_migrations(&pool).await.map_err(|e| StorageError::Migration(e.to_string()))?;
        tracing::info!(target = %config.target(), "MySqlStorage initialized");
        Ok(Self { pool })
    }
}

fn connect_options(config: &DatabaseConfig) -> Result<MySqlConnectOptions, StorageError> {
    match &config.url {
        Some(url) => Ok(MySqlConnectOptions::from_str(url)?),
        None => Ok(MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)),
    }
}

/// Convert `usize` to `i64` for SQL LIMIT/OFFSET binds.
/// Saturates to `i64::MAX` on overflow (only possible on 128-bit targets).
pub(crate) fn usize_to_i64(val: usize) -> i64 {
    i64::try_from(val).unwrap_or(i64::MAX)
}

pub(crate) fn count_to_u64(val: i64) -> u64 {
    u64::try_from(val).unwrap_or(0)
}

pub(crate) fn row_to_index(row: &MySqlRow) -> Result<IndexRow, StorageError> {
    Ok(IndexRow {
        ts: row.try_get("ts")?,
        open: row.try_get("open_price")?,
        high: row.try_get("high_price")?,
        low: row.try_get("low_price")?,
        close: row.try_get("close_price")?,
        volume: row.try_get("volume")?,
    })
}

pub(crate) fn row_to_option(row: &MySqlRow) -> Result<OptionRow, StorageError> {
    let option_type: OptionType = row.try_get::<String, _>("option_type")?.parse()?;
    Ok(OptionRow {
        ts: row.try_get("ts")?,
        expiry: row.try_get("expiry")?,
        strike: row.try_get("strike")?,
        option_type,
        bid_open: row.try_get("bid_open")?,
        ask_open: row.try_get("ask_open")?,
        bid_close: row.try_get("bid_close")?,
        ask_close: row.try_get("ask_close")?,
        volume: row.try_get("volume")?,
        open_interest: row.try_get("open_interest")?,
        iv: row.try_get("iv")?,
        delta: row.try_get("delta")?,
        gamma: row.try_get("gamma")?,
        theta: row.try_get("theta")?,
        vega: row.try_get("vega")?,
    })
}

pub(crate) const INDEX_COLUMNS: &str =
    "ts, open_price, high_price, low_price, close_price, volume";

pub(crate) const OPTION_COLUMNS: &str =
    "ts, expiry, strike, option_type, bid_open, ask_open, bid_close, ask_close,
     volume, open_interest, iv, delta, gamma, theta, vega";
