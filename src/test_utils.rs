use url::Url;

use crate::ports::credentials::Credential;
use crate::ports::spotify::{Page, PageCursor, SpotifyApiError, SpotifyApiTrackEntry, SpotifyApiTrackRef};

pub const PRIMARY_TOKEN: &str = "primary-token";
pub const SECONDARY_TOKEN: &str = "secondary-token";

pub fn credential(token: &str) -> Credential {
    Credential::new(token).unwrap()
}

pub fn track_entry(id: &str) -> SpotifyApiTrackEntry {
    SpotifyApiTrackEntry {
        track: Some(SpotifyApiTrackRef {
            id: Some(id.to_string()),
            uri: Some(format!("spotify:track:{}", id)),
        }),
    }
}

/// Entry whose track is no longer available.
pub fn unavailable_entry() -> SpotifyApiTrackEntry {
    SpotifyApiTrackEntry { track: None }
}

/// Local file: has a uri, no catalog id.
pub fn local_file_entry(name: &str) -> SpotifyApiTrackEntry {
    SpotifyApiTrackEntry {
        track: Some(SpotifyApiTrackRef {
            id: None,
            uri: Some(format!("spotify:local:artist:album:{}:180", name)),
        }),
    }
}

pub fn track_entries(prefix: &str, count: usize) -> Vec<SpotifyApiTrackEntry> {
    (0..count)
        .map(|i| track_entry(&format!("{}{}", prefix, i)))
        .collect()
}

/// Serves `entries` the way Spotify pages a listing at `listing_url`: the first page
/// starts at offset 0 and every `next` pointer carries the following offset.
pub fn serve_page<T: Clone>(
    listing_url: &str,
    entries: &[T],
    cursor: &PageCursor,
) -> Result<Page<T>, SpotifyApiError> {
    let (offset, limit) = match cursor {
        PageCursor::Start { limit } => (0usize, *limit as usize),
        PageCursor::Next(next) => {
            let url = Url::parse(next)?;
            let value = |key: &str| {
                url.query_pairs()
                    .find(|(name, _)| name == key)
                    .and_then(|(_, value)| value.parse::<usize>().ok())
                    .unwrap_or_else(|| panic!("cursor {} has no {}", next, key))
            };
            (value("offset"), value("limit"))
        }
    };

    let end = (offset + limit).min(entries.len());
    let next = (end < entries.len()).then(|| format!("{}?offset={}&limit={}", listing_url, end, limit));

    Ok(Page {
        items: entries[offset.min(end)..end].to_vec(),
        total: Some(entries.len() as u32),
        next,
    })
}

pub fn status_error(status: u16) -> SpotifyApiError {
    SpotifyApiError::Status {
        status,
        body: format!("{{\"error\":{{\"status\":{}}}}}", status),
    }
}
