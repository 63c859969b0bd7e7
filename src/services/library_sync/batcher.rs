use std::future::Future;
use std::num::NonZeroUsize;

use crate::ports::spotify::SpotifyApiError;
use crate::services::library_sync::types::{ApiFailure, ChunkFailure};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Number of write calls issued.
    pub chunks: usize,
    /// Items in chunks the remote accepted.
    pub transferred: usize,
    pub failures: Vec<ChunkFailure>,
}

/// Writes `items` in contiguous chunks of at most `chunk_size`, one call per chunk,
/// strictly in order.
///
/// A rejected chunk is recorded and skipped; later chunks are still written.
pub async fn write_in_chunks<'a, F, Fut>(
    items: &'a [String],
    chunk_size: NonZeroUsize,
    mut write_chunk: F,
) -> BatchReport
where
    F: FnMut(&'a [String]) -> Fut,
    Fut: Future<Output = Result<(), SpotifyApiError>>,
{
    let mut report = BatchReport::default();
    let chunk_count = items.len().div_ceil(chunk_size.get());

    for (index, chunk) in items.chunks(chunk_size.get()).enumerate() {
        report.chunks += 1;

        match write_chunk(chunk).await {
            Ok(()) => {
                report.transferred += chunk.len();
                tracing::info!(
                    chunk = index + 1,
                    of = chunk_count,
                    size = chunk.len(),
                    "Wrote batch"
                );
            }
            Err(error) => {
                tracing::error!(
                    chunk = index + 1,
                    of = chunk_count,
                    size = chunk.len(),
                    error = %error,
                    "Failed to write batch, skipping"
                );
                report.failures.push(ChunkFailure {
                    index,
                    size: chunk.len(),
                    error: ApiFailure::from(&error),
                });
            }
        }
    }

    report
}
