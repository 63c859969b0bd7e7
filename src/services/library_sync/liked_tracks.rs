use tracing::instrument;

use crate::ports::credentials::Credential;
use crate::ports::spotify::{SpotifyApi, SpotifyApiTrackEntry};
use crate::services::library_sync::batcher::write_in_chunks;
use crate::services::library_sync::paginator::fetch_all;
use crate::services::library_sync::types::{
    SyncDirection, SyncSettings, TransferOutcome, TransferStage, TransferStats,
};

/// Ids the save-tracks endpoint accepts. Entries without a nested track id are dropped.
fn liked_track_ids(entries: &[SpotifyApiTrackEntry]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| entry.track.as_ref()?.id.clone())
        .collect()
}

/// Copies every liked track of `source` into the liked tracks of `destination`.
///
/// The whole source listing is read before anything is written. A failed read
/// fails the library; a failed write chunk only loses that chunk.
#[instrument(skip_all, fields(direction = %direction))]
pub async fn transfer_liked_tracks<C: SpotifyApi>(
    api: &C,
    settings: &SyncSettings,
    source: &Credential,
    destination: &Credential,
    direction: SyncDirection,
) -> TransferOutcome {
    if direction == SyncDirection::TwoWay {
        tracing::warn!("Two-way liked tracks sync is not implemented, skipping");
        return TransferOutcome::Unsupported { direction };
    }

    let entries = match fetch_all(settings.page_size, |cursor| {
        api.saved_tracks_page(source, cursor)
    })
    .await
    {
        Ok(entries) => entries,
        Err(error) => {
            tracing::error!(error = %error, "Failed to fetch liked tracks");
            return TransferOutcome::Failed {
                stage: TransferStage::FetchSource,
                error: error.into(),
            };
        }
    };

    let ids = liked_track_ids(&entries);
    tracing::info!(
        fetched = entries.len(),
        eligible = ids.len(),
        "Fetched liked tracks"
    );

    let mut stats = TransferStats {
        fetched: entries.len(),
        eligible: ids.len(),
        ..TransferStats::default()
    };
    if ids.is_empty() {
        return TransferOutcome::Transferred(stats);
    }

    let report = write_in_chunks(&ids, settings.liked_tracks_batch_size, |chunk| {
        api.save_tracks(destination, chunk)
    })
    .await;

    tracing::info!(
        transferred = report.transferred,
        failed_chunks = report.failures.len(),
        "Liked tracks sync finished"
    );

    stats.transferred = report.transferred;
    stats.failed_chunks = report.failures;
    TransferOutcome::Transferred(stats)
}
