//! Service layer for optchain
//!
//! Centralizes ingestion and query logic between the HTTP handlers and storage.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::min_ident_chars, reason = "Short error vars are idiomatic")]

mod admin_service;
pub mod error;
mod ingest;
mod query;

pub use admin_service::{AdminService, PreviewPage};
pub use error::{IngestError, ServiceError};
pub use ingest::{
    BatchReport, FileOutcome, IngestReport, IngestService, RowIssue, RowPolicy, UploadedFile,
};
pub use query::{
    ChainRow, ChainView, ChartData, Compare, DayView, OptionFilter, QueryService, StraddlePoint,
    StraddleSeries, atm_strike, build_chain, build_series, round_to_increment, straddle_at,
};
