//! MySQL schema for optchain storage.
//!
//! Tables are created if missing; optional quote columns are added to
//! tables created by older builds.

use anyhow::Result;
use sqlx::MySqlPool;

/// Optional option-quote columns that may be absent from an older `option_data`.
const OPTION_DATA_OPTIONAL_COLUMNS: &[(&str, &str)] = &[
    ("bid_close", "DOUBLE NULL"),
    ("ask_close", "DOUBLE NULL"),
    ("volume", "BIGINT NULL"),
    ("open_interest", "BIGINT NULL"),
    ("iv", "DOUBLE NULL"),
    ("delta", "DOUBLE NULL"),
    ("gamma", "DOUBLE NULL"),
    ("theta", "DOUBLE NULL"),
    ("vega", "DOUBLE NULL"),
];

const INDEX_DATA_OPTIONAL_COLUMNS: &[(&str, &str)] = &[
    ("high_price", "DOUBLE NULL"),
    ("low_price", "DOUBLE NULL"),
    ("close_price", "DOUBLE NULL"),
    ("volume", "BIGINT NULL"),
];

async fn column_exists(pool: &MySqlPool, table: &str, column: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.columns
          WHERE table_schema = DATABASE() AND table_name = ? AND column_name = ?",
    )
    .bind(table)
    .bind(column)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

async fn add_missing_columns(
    pool: &MySqlPool,
    table: &str,
    columns: &[(&str, &str)],
) -> Result<()> {
    for (column, definition) in columns {
        if !column_exists(pool, table, column).await? {
            tracing::info!(table, column, "adding missing column");
            sqlx::query(&format!("ALTER TABLE `{table}` ADD COLUMN `{column}` {definition}"))
                .execute(pool)
                .await?;
        }
    }
    Ok(())
}

/// Run all MySQL migrations.
pub async fn run_mysql_migrations(pool: &MySqlPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS index_data (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            ts DATETIME NOT NULL,
            open_price DOUBLE NOT NULL,
            high_price DOUBLE NULL,
            low_price DOUBLE NULL,
            close_price DOUBLE NULL,
            volume BIGINT NULL,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
            UNIQUE KEY uq_index_ts (ts)
        ) ENGINE = InnoDB
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS option_data (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            ts DATETIME NOT NULL,
            expiry DATE NOT NULL,
            strike DOUBLE NOT NULL,
            option_type CHAR(1) NOT NULL,
            bid_open DOUBLE NOT NULL,
            ask_open DOUBLE NOT NULL,
            bid_close DOUBLE NULL,
            ask_close DOUBLE NULL,
            volume BIGINT NULL,
            open_interest BIGINT NULL,
            iv DOUBLE NULL,
            delta DOUBLE NULL,
            gamma DOUBLE NULL,
            theta DOUBLE NULL,
            vega DOUBLE NULL,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
            UNIQUE KEY uq_option_minute_contract (ts, expiry, strike, option_type),
            KEY idx_option_expiry_strike (expiry, strike)
        ) ENGINE = InnoDB
        "#,
    )
    .execute(pool)
    .await?;

    add_missing_columns(pool, "index_data", INDEX_DATA_OPTIONAL_COLUMNS).await?;
    add_missing_columns(pool, "option_data", OPTION_DATA_OPTIONAL_COLUMNS).await?;

    Ok(())
}
