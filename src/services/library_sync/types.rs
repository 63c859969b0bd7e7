use std::fmt;
use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ports::credentials::AccountRole;
use crate::ports::spotify::SpotifyApiError;

/// Library id the liked-tracks pseudo-library is selected by. It has no remote id.
pub const LIKED_SONGS_ID: &str = "liked_songs";

/// Stands for the source account role in `SyncSettings::description_prefix`.
pub const ACCOUNT_PLACEHOLDER: &str = "{account}";

/// Largest page the listing endpoints serve.
pub const MAX_PAGE_SIZE: u32 = 50;
/// Most ids `PUT /me/tracks` accepts per call.
pub const MAX_SAVE_TRACKS_BATCH: NonZeroUsize = NonZeroUsize::new(50).unwrap();
/// Most uris `POST /playlists/{id}/tracks` accepts per call.
pub const MAX_PLAYLIST_ADD_BATCH: NonZeroUsize = NonZeroUsize::new(100).unwrap();

/// A selectable library: either the liked-tracks collection or a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LibraryId {
    LikedSongs,
    Playlist(String),
}

impl LibraryId {
    pub fn parse(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<String> for LibraryId {
    /// Exact match on the sentinel; anything else is a remote playlist id.
    fn from(raw: String) -> Self {
        if raw == LIKED_SONGS_ID {
            LibraryId::LikedSongs
        } else {
            LibraryId::Playlist(raw)
        }
    }
}

impl From<LibraryId> for String {
    fn from(id: LibraryId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for LibraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryId::LikedSongs => f.write_str(LIKED_SONGS_ID),
            LibraryId::Playlist(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SyncDirection {
    /// Source account to its counterpart only.
    OneWay,
    /// Bidirectional reconciliation. Accepted but not implemented.
    TwoWay,
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncDirection::OneWay => f.write_str("one-way"),
            SyncDirection::TwoWay => f.write_str("two-way"),
        }
    }
}

/// Scheduling hint passed through by callers. The engine never acts on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SyncFrequency {
    #[default]
    Manual,
    Hourly,
    Daily,
    Weekly,
}

/// One worklist entry, with the account it is read from made explicit.
/// Items are always written to `source.counterpart()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySelection {
    pub library: LibraryId,
    pub source: AccountRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub selections: Vec<LibrarySelection>,
    pub direction: SyncDirection,
    pub frequency: SyncFrequency,
}

impl SyncRequest {
    /// Builds the worklist from per-account selection lists: primary selections first,
    /// then secondary selections bound to `secondary_source`.
    pub fn from_account_selections(
        primary: Vec<LibraryId>,
        secondary: Vec<LibraryId>,
        secondary_source: AccountRole,
        direction: SyncDirection,
        frequency: SyncFrequency,
    ) -> Self {
        let selections = primary
            .into_iter()
            .map(|library| LibrarySelection {
                library,
                source: AccountRole::Primary,
            })
            .chain(secondary.into_iter().map(|library| LibrarySelection {
                library,
                source: secondary_source,
            }))
            .collect();

        Self {
            selections,
            direction,
            frequency,
        }
    }
}

/// Engine settings, built from `Config` by the caller.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub page_size: u32,
    pub liked_tracks_batch_size: NonZeroUsize,
    pub playlist_batch_size: NonZeroUsize,
    /// Prepended to copied playlist descriptions. `{account}` is replaced with the
    /// role of the account the playlist was read from.
    pub description_prefix: String,
    pub public_playlists: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            liked_tracks_batch_size: MAX_SAVE_TRACKS_BATCH,
            playlist_batch_size: MAX_PLAYLIST_ADD_BATCH,
            description_prefix: format!("Synced from {} account - ", ACCOUNT_PLACEHOLDER),
            public_playlists: false,
        }
    }
}

/// Serialisable failure reason for one unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl From<&SpotifyApiError> for ApiFailure {
    fn from(error: &SpotifyApiError) -> Self {
        Self {
            status: error.status(),
            message: error.to_string(),
        }
    }
}

impl From<SpotifyApiError> for ApiFailure {
    fn from(error: SpotifyApiError) -> Self {
        Self::from(&error)
    }
}

/// A write chunk that the remote rejected. Its items are not counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkFailure {
    /// Zero-based chunk position.
    pub index: usize,
    pub size: usize,
    pub error: ApiFailure,
}

/// Where a library transfer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStage {
    FetchSource,
    FetchMetadata,
    CreatePlaylist,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferStats {
    /// Entries read from the source, before filtering.
    pub fetched: usize,
    /// Entries with a usable id or uri.
    pub eligible: usize,
    pub transferred: usize,
    pub failed_chunks: Vec<ChunkFailure>,
    /// Playlist created on the destination, for playlist transfers.
    pub destination_playlist: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransferOutcome {
    Transferred(TransferStats),
    /// The requested direction has no implementation; nothing was read or written.
    Unsupported { direction: SyncDirection },
    Failed {
        stage: TransferStage,
        error: ApiFailure,
    },
}

impl TransferOutcome {
    pub fn items_transferred(&self) -> usize {
        match self {
            TransferOutcome::Transferred(stats) => stats.transferred,
            TransferOutcome::Unsupported { .. } | TransferOutcome::Failed { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryReport {
    pub library: LibraryId,
    pub source: AccountRole,
    pub outcome: TransferOutcome,
}

/// Result of one orchestrator run. Built once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub library_count: usize,
    pub total_items_transferred: usize,
    /// True whenever both credentials were present, regardless of per-library failures.
    pub succeeded: bool,
    pub direction: SyncDirection,
    pub libraries: Vec<LibraryReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncSummary {
    pub fn from_reports(
        direction: SyncDirection,
        libraries: Vec<LibraryReport>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let total_items_transferred = libraries
            .iter()
            .map(|report| report.outcome.items_transferred())
            .sum();

        Self {
            library_count: libraries.len(),
            total_items_transferred,
            succeeded: true,
            direction,
            libraries,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn failed_libraries(&self) -> impl Iterator<Item = &LibraryReport> {
        self.libraries
            .iter()
            .filter(|report| matches!(report.outcome, TransferOutcome::Failed { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("Both accounts must be connected (missing credential for: {})", format_roles(.roles))]
    MissingCredentials { roles: Vec<AccountRole> },
}

fn format_roles(roles: &[AccountRole]) -> String {
    roles
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_id_sentinel_is_exact_match() {
        assert_eq!(LibraryId::parse("liked_songs"), LibraryId::LikedSongs);
        assert_eq!(
            LibraryId::parse("Liked_Songs"),
            LibraryId::Playlist("Liked_Songs".into())
        );
        assert_eq!(
            LibraryId::parse("liked_songs "),
            LibraryId::Playlist("liked_songs ".into())
        );
    }

    #[test]
    fn test_library_id_from_string_agrees_with_parse() {
        for raw in ["liked_songs", "Liked_Songs", " liked_songs", "37i9dQZF1DX"] {
            assert_eq!(LibraryId::from(raw.to_string()), LibraryId::parse(raw), "{raw:?}");
        }
    }

    #[test]
    fn test_library_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&vec![
            LibraryId::LikedSongs,
            LibraryId::Playlist("abc".into()),
        ])
        .unwrap();
        assert_eq!(json, r#"["liked_songs","abc"]"#);

        let parsed: Vec<LibraryId> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0], LibraryId::LikedSongs);
    }

    #[test]
    fn test_worklist_concatenates_primary_then_secondary() {
        let request = SyncRequest::from_account_selections(
            vec![LibraryId::LikedSongs, LibraryId::parse("p1")],
            vec![LibraryId::parse("s1")],
            AccountRole::Secondary,
            SyncDirection::OneWay,
            SyncFrequency::Daily,
        );

        let sources: Vec<_> = request
            .selections
            .iter()
            .map(|selection| (selection.library.to_string(), selection.source))
            .collect();
        assert_eq!(
            sources,
            vec![
                ("liked_songs".to_string(), AccountRole::Primary),
                ("p1".to_string(), AccountRole::Primary),
                ("s1".to_string(), AccountRole::Secondary),
            ]
        );
    }

    #[test]
    fn test_summary_folds_outcomes() {
        let reports = vec![
            LibraryReport {
                library: LibraryId::LikedSongs,
                source: AccountRole::Primary,
                outcome: TransferOutcome::Transferred(TransferStats {
                    fetched: 10,
                    eligible: 10,
                    transferred: 10,
                    ..TransferStats::default()
                }),
            },
            LibraryReport {
                library: LibraryId::parse("broken"),
                source: AccountRole::Primary,
                outcome: TransferOutcome::Failed {
                    stage: TransferStage::FetchSource,
                    error: ApiFailure {
                        status: Some(500),
                        message: "boom".into(),
                    },
                },
            },
            LibraryReport {
                library: LibraryId::parse("other"),
                source: AccountRole::Primary,
                outcome: TransferOutcome::Unsupported {
                    direction: SyncDirection::TwoWay,
                },
            },
        ];

        let summary = SyncSummary::from_reports(SyncDirection::OneWay, reports, Utc::now());

        assert_eq!(summary.library_count, 3);
        assert_eq!(summary.total_items_transferred, 10);
        assert!(summary.succeeded);
        assert_eq!(summary.failed_libraries().count(), 1);
    }

    #[test]
    fn test_missing_credentials_message() {
        let error = SyncError::MissingCredentials {
            roles: vec![AccountRole::Primary, AccountRole::Secondary],
        };
        assert_eq!(
            error.to_string(),
            "Both accounts must be connected (missing credential for: primary, secondary)"
        );
    }
}
