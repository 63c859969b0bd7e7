use chrono::Utc;
use tracing::instrument;

use crate::ports::credentials::{AccountRole, Credential, CredentialSource};
use crate::ports::spotify::SpotifyApi;
use crate::services::library_sync::liked_tracks::transfer_liked_tracks;
use crate::services::library_sync::playlist::transfer_playlist;
use crate::services::library_sync::types::{
    LibraryId, LibraryReport, SyncError, SyncRequest, SyncSettings, SyncSummary, TransferOutcome,
};

fn credential_for<'a>(
    role: AccountRole,
    primary: &'a Credential,
    secondary: &'a Credential,
) -> &'a Credential {
    match role {
        AccountRole::Primary => primary,
        AccountRole::Secondary => secondary,
    }
}

/// Runs library transfers between the two connected accounts.
pub struct SyncEngine<C: SpotifyApi> {
    api: C,
    settings: SyncSettings,
}

impl<C: SpotifyApi> SyncEngine<C> {
    pub fn new(api: C, settings: SyncSettings) -> Self {
        Self { api, settings }
    }

    /// Transfers every selected library, one after another.
    ///
    /// Fails only when a credential is missing, before any request is made. Failures of
    /// individual libraries or chunks are reported in the summary and never stop the run.
    #[instrument(skip_all, fields(libraries = request.selections.len(), direction = %request.direction))]
    pub async fn sync(
        &self,
        credentials: &dyn CredentialSource,
        request: &SyncRequest,
    ) -> Result<SyncSummary, SyncError> {
        let (primary, secondary) = match (
            credentials.credential(AccountRole::Primary),
            credentials.credential(AccountRole::Secondary),
        ) {
            (Some(primary), Some(secondary)) => (primary, secondary),
            (primary, secondary) => {
                let roles = [
                    (AccountRole::Primary, primary.is_none()),
                    (AccountRole::Secondary, secondary.is_none()),
                ]
                .into_iter()
                .filter_map(|(role, missing)| missing.then_some(role))
                .collect();
                let error = SyncError::MissingCredentials { roles };
                tracing::error!(error = %error, "Refusing to start sync");
                return Err(error);
            }
        };

        tracing::debug!(frequency = ?request.frequency, "Ignoring frequency hint");
        let started_at = Utc::now();
        let mut reports = Vec::with_capacity(request.selections.len());

        for selection in &request.selections {
            let source = credential_for(selection.source, &primary, &secondary);
            let destination =
                credential_for(selection.source.counterpart(), &primary, &secondary);
            tracing::info!(
                library = %selection.library,
                source = %selection.source,
                "Syncing library"
            );

            let outcome = match &selection.library {
                LibraryId::LikedSongs => {
                    transfer_liked_tracks(
                        &self.api,
                        &self.settings,
                        source,
                        destination,
                        request.direction,
                    )
                    .await
                }
                LibraryId::Playlist(playlist_id) => {
                    transfer_playlist(
                        &self.api,
                        &self.settings,
                        playlist_id,
                        selection.source,
                        source,
                        destination,
                        request.direction,
                    )
                    .await
                }
            };

            if let TransferOutcome::Failed { stage, error } = &outcome {
                tracing::warn!(
                    library = %selection.library,
                    stage = ?stage,
                    status = ?error.status,
                    "Library sync failed, continuing with the next library"
                );
            }

            reports.push(LibraryReport {
                library: selection.library.clone(),
                source: selection.source,
                outcome,
            });
        }

        let summary = SyncSummary::from_reports(request.direction, reports, started_at);
        tracing::info!(
            library_count = summary.library_count,
            total_items_transferred = summary.total_items_transferred,
            "Sync completed"
        );

        Ok(summary)
    }
}
