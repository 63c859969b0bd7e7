use tracing::instrument;

use crate::ports::credentials::{AccountRole, Credential};
use crate::ports::spotify::{NewPlaylist, SpotifyApi, SpotifyApiPlaylist, SpotifyApiTrackEntry};
use crate::services::library_sync::batcher::write_in_chunks;
use crate::services::library_sync::paginator::fetch_all;
use crate::services::library_sync::types::{
    ACCOUNT_PLACEHOLDER, SyncDirection, SyncSettings, TransferOutcome, TransferStage,
    TransferStats,
};

/// Uris of entries that still resolve to a track. Region-restricted or removed
/// entries come back without a track or uri and are dropped.
fn playlist_track_uris(entries: &[SpotifyApiTrackEntry]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| entry.track.as_ref()?.uri.clone())
        .collect()
}

fn destination_playlist(
    source: &SpotifyApiPlaylist,
    source_role: AccountRole,
    settings: &SyncSettings,
) -> NewPlaylist {
    let prefix = settings
        .description_prefix
        .replace(ACCOUNT_PLACEHOLDER, &source_role.to_string());
    NewPlaylist {
        name: source.name.clone(),
        description: format!(
            "{}{}",
            prefix,
            source.description.as_deref().unwrap_or_default()
        ),
        public: settings.public_playlists,
    }
}

/// Copies a playlist from `source` into a newly created playlist on `destination`.
///
/// A new destination playlist is created on every run, even when one with the same
/// name already exists, so repeated runs produce duplicates.
#[instrument(
    skip_all,
    fields(playlist_id = %playlist_id, source_role = %source_role, direction = %direction)
)]
pub async fn transfer_playlist<C: SpotifyApi>(
    api: &C,
    settings: &SyncSettings,
    playlist_id: &str,
    source_role: AccountRole,
    source: &Credential,
    destination: &Credential,
    direction: SyncDirection,
) -> TransferOutcome {
    if direction == SyncDirection::TwoWay {
        tracing::warn!("Two-way playlist sync is not implemented, skipping");
        return TransferOutcome::Unsupported { direction };
    }

    let (metadata, entries) = tokio::join!(
        api.playlist(source, playlist_id),
        fetch_all(settings.page_size, |cursor| {
            api.playlist_tracks_page(source, playlist_id, cursor)
        }),
    );

    let metadata = match metadata {
        Ok(metadata) => metadata,
        Err(error) => {
            tracing::error!(error = %error, "Failed to fetch playlist details");
            return TransferOutcome::Failed {
                stage: TransferStage::FetchMetadata,
                error: error.into(),
            };
        }
    };
    let entries = match entries {
        Ok(entries) => entries,
        Err(error) => {
            tracing::error!(error = %error, "Failed to fetch playlist tracks");
            return TransferOutcome::Failed {
                stage: TransferStage::FetchSource,
                error: error.into(),
            };
        }
    };

    let new_playlist = destination_playlist(&metadata, source_role, settings);
    let destination_id = match api.create_playlist(destination, &new_playlist).await {
        Ok(id) => id,
        Err(error) => {
            tracing::error!(error = %error, name = %new_playlist.name, "Failed to create playlist");
            return TransferOutcome::Failed {
                stage: TransferStage::CreatePlaylist,
                error: error.into(),
            };
        }
    };
    tracing::info!(
        name = %new_playlist.name,
        destination_id = %destination_id,
        "Created destination playlist"
    );

    let uris = playlist_track_uris(&entries);
    let mut stats = TransferStats {
        fetched: entries.len(),
        eligible: uris.len(),
        destination_playlist: Some(destination_id.clone()),
        ..TransferStats::default()
    };
    if uris.is_empty() {
        return TransferOutcome::Transferred(stats);
    }

    let report = write_in_chunks(&uris, settings.playlist_batch_size, |chunk| {
        api.add_tracks_to_playlist(destination, &destination_id, chunk)
    })
    .await;

    tracing::info!(
        fetched = stats.fetched,
        transferred = report.transferred,
        failed_chunks = report.failures.len(),
        "Playlist sync finished"
    );

    stats.transferred = report.transferred;
    stats.failed_chunks = report.failures;
    TransferOutcome::Transferred(stats)
}
