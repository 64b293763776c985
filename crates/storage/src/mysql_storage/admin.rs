//! AdminStore implementation for MySqlStorage.

use super::*;

use crate::traits::AdminStore;
use crate::types::ResetSummary;
use async_trait::async_trait;

#[async_trait]
impl AdminStore for MySqlStorage {
    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn reset(&self) -> Result<ResetSummary, StorageError> {
        let mut tx = self.pool.begin().await?;
        let options = sqlx::query("DELETE FROM option_data").execute(&mut *tx).await?;
        let index = sqlx::query("DELETE FROM index_data").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(ResetSummary {
            index_rows_deleted: index.rows_affected(),
            option_rows_deleted: options.rows_affected(),
        })
    }
}
