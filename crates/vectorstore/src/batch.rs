//! Sub-batching for writes
//!
//! Writes larger than the effective batch size are split into consecutive
//! sub-batches. Sub-batches already acknowledged stay written when a later
//! one fails; the failure reports exactly which ids made it.

use crate::error::{VectorError, VectorResult};
use dataclients_core::VectorRecord;

/// Effective batch size
///
/// The configured size (or the backend default), never above a
/// server-advertised maximum.
pub fn effective_batch_size(
    configured: Option<usize>,
    default: usize,
    server_max: Option<usize>,
) -> usize {
    let size = configured.unwrap_or(default);
    server_max.map_or(size, |max| size.min(max)).max(1)
}

/// Error for a write that stopped after `written` records
///
/// Nothing written means the underlying error surfaces unchanged.
pub fn partial_failure(records: &[VectorRecord], written: usize, source: VectorError) -> VectorError {
    if written == 0 {
        return source;
    }
    let ids = |slice: &[VectorRecord]| slice.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
    VectorError::PartialUpsert {
        succeeded: ids(&records[..written]),
        pending: ids(&records[written..]),
        source: Box::new(source),
    }
}

/// Write records in sub-batches, stopping at the first failure
pub fn write_batches<F>(records: &[VectorRecord], batch_size: usize, mut write: F) -> VectorResult<()>
where
    F: FnMut(&[VectorRecord]) -> VectorResult<()>,
{
    let mut written = 0;
    for chunk in records.chunks(batch_size.max(1)) {
        if let Err(e) = write(chunk) {
            return Err(partial_failure(records, written, e));
        }
        written += chunk.len();
    }
    Ok(())
}
