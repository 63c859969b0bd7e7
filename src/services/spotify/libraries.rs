use serde::Serialize;
use tracing::instrument;

use crate::ports::credentials::Credential;
use crate::ports::spotify::{PageCursor, SpotifyApi, SpotifyApiError};
use crate::services::library_sync::paginator::fetch_all;
use crate::services::library_sync::types::LibraryId;

/// A library the user can select for syncing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibrarySummary {
    pub id: LibraryId,
    pub name: String,
    pub owner: Option<String>,
    pub total_tracks: u32,
}

/// Lists the liked-songs pseudo-library followed by every playlist of the account.
///
/// The liked-songs total is best effort: if it can't be read the entry is still
/// listed, with zero tracks.
#[instrument(skip_all)]
pub async fn list_libraries<C: SpotifyApi>(
    api: &C,
    credential: &Credential,
    page_size: u32,
) -> Result<Vec<LibrarySummary>, SpotifyApiError> {
    let liked_total = match api
        .saved_tracks_page(credential, PageCursor::Start { limit: 1 })
        .await
    {
        Ok(page) => page.total.unwrap_or(page.items.len() as u32),
        Err(error) => {
            tracing::warn!(error = %error, "Failed to read liked songs total, listing it as empty");
            0
        }
    };

    let playlists = fetch_all(page_size, |cursor| {
        api.current_user_playlists_page(credential, cursor)
    })
    .await?;
    tracing::debug!(playlists = playlists.len(), "Fetched playlists");

    let liked_songs = LibrarySummary {
        id: LibraryId::LikedSongs,
        name: "Liked Songs".to_string(),
        owner: Some("You".to_string()),
        total_tracks: liked_total,
    };

    Ok(std::iter::once(liked_songs)
        .chain(playlists.into_iter().map(|playlist| LibrarySummary {
            id: LibraryId::Playlist(playlist.id),
            name: playlist.name,
            owner: playlist.owner,
            total_tracks: playlist.total_tracks,
        }))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::spotify::{MockSpotifyApi, Page, SpotifyApiPlaylistSummary};
    use crate::test_utils::{PRIMARY_TOKEN, credential, serve_page, status_error};

    const PLAYLISTS_URL: &str = "https://api.spotify.com/v1/me/playlists";

    fn playlists(count: usize) -> Vec<SpotifyApiPlaylistSummary> {
        (0..count)
            .map(|i| SpotifyApiPlaylistSummary {
                id: format!("pl{}", i),
                name: format!("Playlist {}", i),
                owner: Some("me".into()),
                total_tracks: i as u32,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_liked_songs_listed_first_then_all_playlists() {
        let mut api = MockSpotifyApi::new();
        api.expect_saved_tracks_page()
            .withf(|_, cursor| *cursor == PageCursor::Start { limit: 1 })
            .times(1)
            .returning(|_, _| {
                Ok(Page {
                    items: vec![],
                    total: Some(321),
                    next: Some("https://api.spotify.com/v1/me/tracks?offset=1&limit=1".into()),
                })
            });
        let all = playlists(60);
        api.expect_current_user_playlists_page()
            .times(2)
            .returning(move |_, cursor| serve_page(PLAYLISTS_URL, &all, &cursor));

        let libraries = list_libraries(&api, &credential(PRIMARY_TOKEN), 50)
            .await
            .unwrap();

        assert_eq!(libraries.len(), 61);
        assert_eq!(libraries[0].id, LibraryId::LikedSongs);
        assert_eq!(libraries[0].total_tracks, 321);
        assert_eq!(libraries[1].id, LibraryId::Playlist("pl0".into()));
        assert_eq!(libraries[60].id, LibraryId::Playlist("pl59".into()));
    }

    #[tokio::test]
    async fn test_liked_songs_total_failure_degrades_to_zero() {
        let mut api = MockSpotifyApi::new();
        api.expect_saved_tracks_page()
            .returning(|_, _| Err(status_error(500)));
        let all = playlists(2);
        api.expect_current_user_playlists_page()
            .returning(move |_, cursor| serve_page(PLAYLISTS_URL, &all, &cursor));

        let libraries = list_libraries(&api, &credential(PRIMARY_TOKEN), 50)
            .await
            .unwrap();

        assert_eq!(libraries.len(), 3);
        assert_eq!(libraries[0].total_tracks, 0);
    }

    #[tokio::test]
    async fn test_playlist_listing_failure_is_an_error() {
        let mut api = MockSpotifyApi::new();
        api.expect_saved_tracks_page().returning(|_, _| {
            Ok(Page {
                items: vec![],
                total: Some(1),
                next: None,
            })
        });
        api.expect_current_user_playlists_page()
            .returning(|_, _| Err(status_error(401)));

        let result = list_libraries(&api, &credential(PRIMARY_TOKEN), 50).await;

        assert!(matches!(
            result,
            Err(SpotifyApiError::Status { status: 401, .. })
        ));
    }
}
