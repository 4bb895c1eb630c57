//! LogSink trait definition.
//!
//! The seam between relay logic and the spreadsheet mirror. Uses native
//! async fn in traits (RPITIT, Rust 2024 edition); the concrete
//! implementation lives in chatrelay-infra.

use chatrelay_types::log::{LogRow, LogWriteOutcome};

/// Best-effort append-only sink for conversation log rows.
///
/// `append` never fails from the caller's perspective: the returned
/// outcome records whether the row reached the remote store, the local
/// fallback file, or nowhere. Chat handlers ignore it; the test-log
/// endpoint reports it.
pub trait LogSink: Send + Sync {
    fn append(&self, row: LogRow) -> impl std::future::Future<Output = LogWriteOutcome> + Send;
}
