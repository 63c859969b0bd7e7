use std::future::Future;

use async_stream::try_stream;
use futures::{Stream, TryStreamExt};

use crate::ports::spotify::{Page, PageCursor, SpotifyApiError};

/// Walks a cursor-paginated listing, yielding items in page order.
///
/// Pages are requested one at a time and only when the previous page has been
/// drained. The first failed page ends the stream with that error.
pub fn paginate<T, F, Fut>(
    page_size: u32,
    mut fetch_page: F,
) -> impl Stream<Item = Result<T, SpotifyApiError>>
where
    F: FnMut(PageCursor) -> Fut,
    Fut: Future<Output = Result<Page<T>, SpotifyApiError>>,
{
    try_stream! {
        let mut cursor = Some(PageCursor::Start { limit: page_size });
        let mut page_number = 0usize;

        while let Some(current) = cursor.take() {
            page_number += 1;
            let page = fetch_page(current).await?;
            tracing::debug!(
                page = page_number,
                items = page.items.len(),
                total = ?page.total,
                has_next = page.next.is_some(),
                "Fetched listing page"
            );

            cursor = page.next.map(PageCursor::Next);
            for item in page.items {
                yield item;
            }
        }
    }
}

/// Collects every page of a listing into one ordered `Vec`.
pub async fn fetch_all<T, F, Fut>(page_size: u32, fetch_page: F) -> Result<Vec<T>, SpotifyApiError>
where
    F: FnMut(PageCursor) -> Fut,
    Fut: Future<Output = Result<Page<T>, SpotifyApiError>>,
{
    paginate(page_size, fetch_page).try_collect().await
}
