//! Hand-off of finished records to a persistence collaborator.

use serde::Serialize;
use tracing::{info, warn};

use crate::models::TransactionRecord;

/// Storage for extracted records, implemented by the caller.
pub trait TransactionSink {
    /// Error returned when a record is rejected.
    type Error: std::fmt::Display;

    /// Store one record for `owner_id`.
    fn create_transaction(&mut self, record: &TransactionRecord, owner_id: &str) -> Result<(), Self::Error>;
}

/// Outcome of a persistence pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PersistSummary {
    pub saved: usize,
    pub skipped: usize,
}

/// Hand every record to the sink; rejected records are skipped.
pub fn persist_transactions<S: TransactionSink>(
    sink: &mut S,
    records: &[TransactionRecord],
    owner_id: &str,
) -> PersistSummary {
    let mut summary = PersistSummary::default();

    for record in records {
        match sink.create_transaction(record, owner_id) {
            Ok(()) => summary.saved += 1,
            Err(e) => {
                warn!("record '{}' rejected: {}", record.description, e);
                summary.skipped += 1;
            }
        }
    }

    info!(
        "persisted {} records for {} ({} skipped)",
        summary.saved, owner_id, summary.skipped
    );
    summary
}
