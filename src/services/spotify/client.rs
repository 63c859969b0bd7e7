use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{
    Quota, RateLimiter, clock::DefaultClock, state::InMemoryState, state::direct::NotKeyed,
};
use reqwest::Client;
use url::Url;

use crate::ports::credentials::Credential;
use crate::ports::spotify::{
    NewPlaylist, Page, PageCursor, SpotifyApi, SpotifyApiError, SpotifyApiPlaylist,
    SpotifyApiPlaylistSummary, SpotifyApiTrackEntry, SpotifyApiTrackRef,
};
use crate::spotify_rs::client::{
    SpotifyEndpoint, add_tracks_to_playlist, create_playlist, get_playlist,
    get_playlist_tracks_page, get_saved_tracks_page, get_user_playlists_page, save_tracks,
};
use crate::spotify_rs::types::{CreatePlaylistBody, SpotifyPaging, SpotifyTrackItem};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Production `SpotifyApi` backed by reqwest.
///
/// All requests, for either account, share one rate limiter.
pub struct SpotifyHttpAdapter {
    client: Client,
    endpoint: SpotifyEndpoint,
    limiter: Arc<DirectRateLimiter>,
}

impl SpotifyHttpAdapter {
    pub fn new(base_url: Url, timeout: Duration, requests_per_second: NonZeroU32) -> Self {
        Self {
            client: Client::new(),
            endpoint: SpotifyEndpoint::new(base_url, timeout),
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(requests_per_second))),
        }
    }

    async fn throttle(&self) {
        tracing::trace!("Waiting for Spotify rate limiter");
        self.limiter.until_ready().await;
    }

    fn page_url(&self, path: &str, cursor: PageCursor) -> Result<Url, SpotifyApiError> {
        match cursor {
            PageCursor::Start { limit } => self.endpoint.listing_url(path, limit),
            PageCursor::Next(next) => Ok(Url::parse(&next)?),
        }
    }
}

fn into_track_page(page: SpotifyPaging<SpotifyTrackItem>) -> Page<SpotifyApiTrackEntry> {
    Page {
        items: page
            .items
            .into_iter()
            .map(|item| SpotifyApiTrackEntry {
                track: item.track.map(|track| SpotifyApiTrackRef {
                    id: track.id,
                    uri: track.uri,
                }),
            })
            .collect(),
        total: page.total,
        next: page.next,
    }
}

#[async_trait::async_trait]
impl SpotifyApi for SpotifyHttpAdapter {
    async fn saved_tracks_page(
        &self,
        credential: &Credential,
        cursor: PageCursor,
    ) -> Result<Page<SpotifyApiTrackEntry>, SpotifyApiError> {
        let url = self.page_url("me/tracks", cursor)?;
        self.throttle().await;
        let page =
            get_saved_tracks_page(&self.client, &self.endpoint, credential.expose(), url).await?;
        Ok(into_track_page(page))
    }

    async fn current_user_playlists_page(
        &self,
        credential: &Credential,
        cursor: PageCursor,
    ) -> Result<Page<SpotifyApiPlaylistSummary>, SpotifyApiError> {
        let url = self.page_url("me/playlists", cursor)?;
        self.throttle().await;
        let page =
            get_user_playlists_page(&self.client, &self.endpoint, credential.expose(), url).await?;

        Ok(Page {
            items: page
                .items
                .into_iter()
                .map(|playlist| SpotifyApiPlaylistSummary {
                    id: playlist.id,
                    name: playlist.name,
                    owner: playlist.owner.and_then(|owner| owner.display_name),
                    total_tracks: playlist.tracks.map(|tracks| tracks.total).unwrap_or(0),
                })
                .collect(),
            total: page.total,
            next: page.next,
        })
    }

    async fn playlist(
        &self,
        credential: &Credential,
        playlist_id: &str,
    ) -> Result<SpotifyApiPlaylist, SpotifyApiError> {
        self.throttle().await;
        let playlist =
            get_playlist(&self.client, &self.endpoint, credential.expose(), playlist_id).await?;

        Ok(SpotifyApiPlaylist {
            id: playlist.id,
            name: playlist.name,
            description: playlist.description,
        })
    }

    async fn playlist_tracks_page(
        &self,
        credential: &Credential,
        playlist_id: &str,
        cursor: PageCursor,
    ) -> Result<Page<SpotifyApiTrackEntry>, SpotifyApiError> {
        let path = format!("playlists/{}/tracks", urlencoding::encode(playlist_id));
        let url = self.page_url(&path, cursor)?;
        self.throttle().await;
        let page =
            get_playlist_tracks_page(&self.client, &self.endpoint, credential.expose(), url)
                .await?;
        Ok(into_track_page(page))
    }

    async fn create_playlist(
        &self,
        credential: &Credential,
        playlist: &NewPlaylist,
    ) -> Result<String, SpotifyApiError> {
        self.throttle().await;
        let body = CreatePlaylistBody {
            name: &playlist.name,
            description: &playlist.description,
            public: playlist.public,
        };
        let created =
            create_playlist(&self.client, &self.endpoint, credential.expose(), &body).await?;
        Ok(created.id)
    }

    async fn save_tracks(
        &self,
        credential: &Credential,
        ids: &[String],
    ) -> Result<(), SpotifyApiError> {
        self.throttle().await;
        save_tracks(&self.client, &self.endpoint, credential.expose(), ids).await
    }

    async fn add_tracks_to_playlist(
        &self,
        credential: &Credential,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), SpotifyApiError> {
        self.throttle().await;
        add_tracks_to_playlist(
            &self.client,
            &self.endpoint,
            credential.expose(),
            playlist_id,
            uris,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify_rs::types::SpotifyTrack;

    fn adapter() -> SpotifyHttpAdapter {
        SpotifyHttpAdapter::new(
            Url::parse("https://api.spotify.com/v1/").unwrap(),
            Duration::from_secs(10),
            NonZeroU32::new(10).unwrap(),
        )
    }

    #[test]
    fn test_page_url_start_and_next() {
        let adapter = adapter();

        let start = adapter
            .page_url("me/tracks", PageCursor::Start { limit: 50 })
            .unwrap();
        assert_eq!(start.as_str(), "https://api.spotify.com/v1/me/tracks?limit=50");

        let next = "https://api.spotify.com/v1/me/tracks?offset=50&limit=50";
        let followed = adapter
            .page_url("me/tracks", PageCursor::Next(next.to_string()))
            .unwrap();
        assert_eq!(followed.as_str(), next);
    }

    #[test]
    fn test_page_url_rejects_garbage_cursor() {
        let result = adapter().page_url("me/tracks", PageCursor::Next("not a url".into()));
        assert!(matches!(result, Err(SpotifyApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_into_track_page_keeps_missing_tracks() {
        let page = SpotifyPaging {
            items: vec![
                SpotifyTrackItem {
                    track: Some(SpotifyTrack {
                        id: Some("t1".into()),
                        uri: Some("spotify:track:t1".into()),
                    }),
                },
                SpotifyTrackItem {
                    track: None,
                },
            ],
            total: Some(2),
            next: None,
        };

        let converted = into_track_page(page);

        assert_eq!(converted.items.len(), 2);
        assert_eq!(
            converted.items[0].track.as_ref().unwrap().uri.as_deref(),
            Some("spotify:track:t1")
        );
        assert!(converted.items[1].track.is_none());
        assert_eq!(converted.total, Some(2));
    }
}
