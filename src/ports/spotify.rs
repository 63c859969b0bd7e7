use serde::Serialize;

use crate::ports::credentials::Credential;

/// Where a listing call should start reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// First page, with the requested page size.
    Start { limit: u32 },
    /// Opaque next-page pointer handed back by the previous page.
    Next(String),
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total item count across all pages, when the endpoint reports it.
    pub total: Option<u32>,
    /// `None` on the last page.
    pub next: Option<String>,
}

/// Decoupled track reference. Both fields may be missing for local files or
/// region-restricted catalog entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpotifyApiTrackRef {
    pub id: Option<String>,
    pub uri: Option<String>,
}

/// A liked-tracks or playlist-tracks entry. `track` is `None` when the entry is
/// no longer available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpotifyApiTrackEntry {
    pub track: Option<SpotifyApiTrackRef>,
}

/// Decoupled representation of a playlist's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyApiPlaylist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

/// Playlist as it appears in the current user's playlist listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyApiPlaylistSummary {
    pub id: String,
    pub name: String,
    pub owner: Option<String>,
    pub total_tracks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPlaylist {
    pub name: String,
    pub description: String,
    pub public: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SpotifyApiError {
    #[error("Spotify responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to send http request: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Failed to parse response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("Invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl SpotifyApiError {
    /// HTTP status of the failed call, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            SpotifyApiError::Status { status, .. } => Some(*status),
            SpotifyApiError::Transport(error) | SpotifyApiError::Decode(error) => {
                error.status().map(|status| status.as_u16())
            }
            SpotifyApiError::InvalidUrl(_) => None,
        }
    }
}

/// Port trait wrapping the Spotify Web API calls the library sync needs.
///
/// Implementations live in `services::spotify::client` (production) or test mocks.
/// Every call takes the credential of the account it acts on, so one client serves
/// both sides of a transfer.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpotifyApi: Send + Sync {
    async fn saved_tracks_page(
        &self,
        credential: &Credential,
        cursor: PageCursor,
    ) -> Result<Page<SpotifyApiTrackEntry>, SpotifyApiError>;

    async fn current_user_playlists_page(
        &self,
        credential: &Credential,
        cursor: PageCursor,
    ) -> Result<Page<SpotifyApiPlaylistSummary>, SpotifyApiError>;

    async fn playlist(
        &self,
        credential: &Credential,
        playlist_id: &str,
    ) -> Result<SpotifyApiPlaylist, SpotifyApiError>;

    async fn playlist_tracks_page(
        &self,
        credential: &Credential,
        playlist_id: &str,
        cursor: PageCursor,
    ) -> Result<Page<SpotifyApiTrackEntry>, SpotifyApiError>;

    /// Returns the id of the created playlist.
    async fn create_playlist(
        &self,
        credential: &Credential,
        playlist: &NewPlaylist,
    ) -> Result<String, SpotifyApiError>;

    /// Adds track ids to the account's liked tracks. At most 50 ids per call.
    async fn save_tracks(&self, credential: &Credential, ids: &[String])
    -> Result<(), SpotifyApiError>;

    /// Appends track uris to a playlist. At most 100 uris per call.
    async fn add_tracks_to_playlist(
        &self,
        credential: &Credential,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), SpotifyApiError>;
}
