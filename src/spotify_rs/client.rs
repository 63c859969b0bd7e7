//! Raw Spotify Web API calls.
//!
//! Each function performs exactly one request. Pagination and batching live in the
//! sync engine, not here.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::ports::spotify::SpotifyApiError;
use crate::spotify_rs::types::{
    AddPlaylistTracksBody, CreatePlaylistBody, SaveTracksBody, SpotifyPaging, SpotifyPlaylist,
    SpotifyTrackItem,
};

pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1/";

/// Shared request settings for one API host.
#[derive(Debug, Clone)]
pub struct SpotifyEndpoint {
    base_url: Url,
    timeout: Duration,
}

impl SpotifyEndpoint {
    pub fn new(mut base_url: Url, timeout: Duration) -> Self {
        // `Url::join` drops the last path segment unless the base ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { base_url, timeout }
    }

    pub fn url(&self, path: &str) -> Result<Url, SpotifyApiError> {
        Ok(self.base_url.join(path)?)
    }

    /// First-page url of a listing endpoint.
    pub fn listing_url(&self, path: &str, limit: u32) -> Result<Url, SpotifyApiError> {
        let mut url = self.url(path)?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request.bearer_auth(token).timeout(self.timeout)
    }
}

async fn check_status(response: Response) -> Result<Response, SpotifyApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error text".to_string());
    Err(SpotifyApiError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn get_json<T: DeserializeOwned>(
    client: &Client,
    endpoint: &SpotifyEndpoint,
    token: &str,
    url: Url,
) -> Result<T, SpotifyApiError> {
    let response = endpoint
        .authorized(client.get(url), token)
        .send()
        .await
        .map_err(SpotifyApiError::Transport)?;

    check_status(response)
        .await?
        .json::<T>()
        .await
        .map_err(SpotifyApiError::Decode)
}

/// `GET /me/tracks`. `url` is either a listing url or a `next` pointer.
pub async fn get_saved_tracks_page(
    client: &Client,
    endpoint: &SpotifyEndpoint,
    token: &str,
    url: Url,
) -> Result<SpotifyPaging<SpotifyTrackItem>, SpotifyApiError> {
    get_json(client, endpoint, token, url).await
}

/// `GET /me/playlists`.
pub async fn get_user_playlists_page(
    client: &Client,
    endpoint: &SpotifyEndpoint,
    token: &str,
    url: Url,
) -> Result<SpotifyPaging<SpotifyPlaylist>, SpotifyApiError> {
    get_json(client, endpoint, token, url).await
}

/// `GET /playlists/{id}`, restricted to the metadata fields the sync copies.
pub async fn get_playlist(
    client: &Client,
    endpoint: &SpotifyEndpoint,
    token: &str,
    playlist_id: &str,
) -> Result<SpotifyPlaylist, SpotifyApiError> {
    let mut url = endpoint.url(&format!("playlists/{}", urlencoding::encode(playlist_id)))?;
    url.query_pairs_mut()
        .append_pair("fields", "id,name,description");
    get_json(client, endpoint, token, url).await
}

/// `GET /playlists/{id}/tracks`.
pub async fn get_playlist_tracks_page(
    client: &Client,
    endpoint: &SpotifyEndpoint,
    token: &str,
    url: Url,
) -> Result<SpotifyPaging<SpotifyTrackItem>, SpotifyApiError> {
    get_json(client, endpoint, token, url).await
}

/// `POST /me/playlists`.
pub async fn create_playlist(
    client: &Client,
    endpoint: &SpotifyEndpoint,
    token: &str,
    body: &CreatePlaylistBody<'_>,
) -> Result<SpotifyPlaylist, SpotifyApiError> {
    let response = endpoint
        .authorized(client.post(endpoint.url("me/playlists")?), token)
        .json(body)
        .send()
        .await
        .map_err(SpotifyApiError::Transport)?;

    check_status(response)
        .await?
        .json::<SpotifyPlaylist>()
        .await
        .map_err(SpotifyApiError::Decode)
}

/// `PUT /me/tracks`.
pub async fn save_tracks(
    client: &Client,
    endpoint: &SpotifyEndpoint,
    token: &str,
    ids: &[String],
) -> Result<(), SpotifyApiError> {
    let response = endpoint
        .authorized(client.put(endpoint.url("me/tracks")?), token)
        .json(&SaveTracksBody { ids })
        .send()
        .await
        .map_err(SpotifyApiError::Transport)?;

    check_status(response).await?;
    Ok(())
}

/// `POST /playlists/{id}/tracks`.
pub async fn add_tracks_to_playlist(
    client: &Client,
    endpoint: &SpotifyEndpoint,
    token: &str,
    playlist_id: &str,
    uris: &[String],
) -> Result<(), SpotifyApiError> {
    let url = endpoint.url(&format!(
        "playlists/{}/tracks",
        urlencoding::encode(playlist_id)
    ))?;
    let response = endpoint
        .authorized(client.post(url), token)
        .json(&AddPlaylistTracksBody { uris })
        .send()
        .await
        .map_err(SpotifyApiError::Transport)?;

    check_status(response).await?;
    Ok(())
}
