//! Typed error enum for the storage layer.
//!
//! Callers match on specific failure modes (duplicate, unavailable database,
//! corrupt row) instead of downcasting opaque boxes.

use thiserror::Error;

/// Storage-layer error with variants covering every expected failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Unique constraint violation that an upsert could not absorb.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// SQL / connection / timeout failure.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Row data could not be converted into a domain type.
    #[error("data corruption: {context}")]
    DataCorruption {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Schema creation failure.
    #[error("migration error: {0}")]
    Migration(String),
}

impl StorageError {
    /// Whether the database itself is unreachable (pool exhausted, socket failure).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Database(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            )
        )
    }
}

/// Custom `From<sqlx::Error>` — NOT blanket `#[from]`.
///
/// - SQLSTATE 23000 (MySQL integrity constraint, e.g. error 1062) → `Duplicate`
/// - Everything else → `Database`
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.code().is_some_and(|c| c == "23000") => {
                Self::Duplicate(db_err.message().to_owned())
            },
            sqlx::Error::ColumnDecode { index, .. } => Self::DataCorruption {
                context: format!("decoding column {index}"),
                source: Box::new(err),
            },
            _ => Self::Database(err),
        }
    }
}

impl From<optchain_core::CoreError> for StorageError {
    fn from(err: optchain_core::CoreError) -> Self {
        Self::DataCorruption { context: "stored value rejected".to_owned(), source: Box::new(err) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeouts_are_transient() {
        assert!(StorageError::from(sqlx::Error::PoolTimedOut).is_transient());
        assert!(StorageError::from(sqlx::Error::PoolClosed).is_transient());
        assert!(!StorageError::from(sqlx::Error::RowNotFound).is_transient());
        assert!(!StorageError::Migration("boom".to_owned()).is_transient());
    }

    #[test]
    fn core_errors_become_data_corruption() {
        let err: StorageError = optchain_core::CoreError::invalid("x", "y", "z").into();
        assert!(matches!(err, StorageError::DataCorruption { .. }));
    }
}
