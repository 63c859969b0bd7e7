use serde::{Deserialize, Serialize};

/// Paging object wrapping every Spotify list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPaging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Item of `GET /me/tracks` and `GET /playlists/{id}/tracks`.
///
/// `track` is `null` for entries Spotify can no longer resolve.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrackItem {
    #[serde(default)]
    pub track: Option<SpotifyTrack>,
}

/// Track object. Local files come back without an `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrack {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

/// Playlist from `GET /playlists/{id}` or `GET /me/playlists`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner: Option<SpotifyPlaylistOwner>,
    #[serde(default)]
    pub tracks: Option<SpotifyPlaylistTracks>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylistOwner {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylistTracks {
    pub total: u32,
}

/// Body of `POST /me/playlists`.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylistBody<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub public: bool,
}

/// Body of `PUT /me/tracks`.
#[derive(Debug, Clone, Serialize)]
pub struct SaveTracksBody<'a> {
    pub ids: &'a [String],
}

/// Body of `POST /playlists/{id}/tracks`.
#[derive(Debug, Clone, Serialize)]
pub struct AddPlaylistTracksBody<'a> {
    pub uris: &'a [String],
}
