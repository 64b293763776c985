use anyhow::Result;
use optchain_core::DatabaseConfig;
use optchain_storage::traits::StatsStore;

use crate::connect;

pub(crate) async fn run(database: &DatabaseConfig) -> Result<()> {
    let storage = connect(database).await?;
    let stats = storage.get_stats().await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
