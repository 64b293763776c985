use std::result::Result as StdResult;

use thiserror::Error;

/// Errors raised while interpreting raw market data values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid {field}: {value:?} ({reason})")]
    InvalidValue { field: &'static str, value: String, reason: String },
}

impl CoreError {
    pub fn invalid(field: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue { field, value: value.into(), reason: reason.into() }
    }
}

pub type Result<T> = StdResult<T, CoreError>;
