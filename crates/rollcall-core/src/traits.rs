//! Core traits for rollcall.
//!
//! These define the seams between the filter engine and its collaborators,
//! so the store can be driven by an HTTP upstream, a file, or a test double.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::WorkshopRecord;

/// Where workshop records come from.
///
/// Each call returns a complete fresh collection; the record store replaces
/// its snapshot wholesale and never merges.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Short human-readable description for logs (URL, path).
    fn describe(&self) -> String;

    /// Fetch every record. Temporal fields are already decoded.
    async fn fetch_records(&self) -> Result<Vec<WorkshopRecord>>;
}
