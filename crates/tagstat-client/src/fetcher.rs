//! Paginated question fetcher
//!
//! Walks the pages of a `/questions` query for one tag and yields every
//! record in server order (ascending creation time). The stream ends in one
//! of three ways:
//!
//! - `FetchEvent::Finished(FetchTermination::Exhausted)` once a page reports
//!   `has_more = false`
//! - `FetchEvent::Finished(FetchTermination::PageCapReached)` when the page
//!   limit is hit while more pages remain
//! - an `Err` item on a non-success response, a transport failure or a
//!   `quota_remaining = 0` signal, after which nothing more is yielded
//!
//! A positive `backoff` in a response is obeyed by sleeping before the
//! page's items are handed out, so the next request can never be issued
//! early.
//!
//! # Examples
//!
//! ```no_run
//! use futures::StreamExt;
//! use tagstat_client::{FetchEvent, FetchOptions, StackExchangeClient, fetch_questions};
//! use tagstat_core::{QueryWindow, Tag};
//!
//! # async fn example() -> tagstat_core::Result<()> {
//! let client = StackExchangeClient::with_defaults()?;
//! let window = QueryWindow::from_month_offsets(chrono::Utc::now(), 6, 2)?;
//! let tag = Tag::new("rust")?;
//! let options = FetchOptions::default();
//!
//! let events = fetch_questions(&client, &tag, window, &options);
//! tokio::pin!(events);
//! while let Some(event) = events.next().await {
//!     if let FetchEvent::Item { item, .. } = event? {
//!         println!("{:?}", item.creation_date);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use futures::stream::Stream;
use serde::Serialize;
use tagstat_core::error::{Result, TagstatError};
use tagstat_core::source::QuestionSource;
use tagstat_core::types::{PageQuery, RawItem, Tag};
use tagstat_core::window::QueryWindow;
use tracing::{debug, info};

use crate::client::DEFAULT_SITE;

/// Largest page size the API accepts
pub const MAX_PAGE_SIZE: u32 = 100;

/// Pagination settings shared by every tag of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub site: String,
    pub page_size: u32,
    /// Highest page number requested per tag
    pub max_pages: u32,
    pub key: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            site: DEFAULT_SITE.to_string(),
            page_size: MAX_PAGE_SIZE,
            max_pages: 50,
            key: None,
        }
    }
}

/// Why a fetch stopped without error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FetchTermination {
    /// The last page said there is nothing more
    Exhausted { pages: u32 },
    /// `max_pages` pages were read and more remained
    PageCapReached { pages: u32 },
}

impl FetchTermination {
    /// Pages requested before stopping
    pub fn pages(&self) -> u32 {
        match self {
            Self::Exhausted { pages } | Self::PageCapReached { pages } => *pages,
        }
    }
}

/// One step of a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    /// A record, with the page it came from
    Item { page: u32, item: RawItem },
    /// Final event of a successful fetch
    Finished(FetchTermination),
}

/// Stream every question tagged `tag` inside `window`
///
/// The stream is lazy: no request is made until it is polled, and each
/// further page is requested only after the previous page's items were
/// consumed.
pub fn fetch_questions<'a, S>(
    source: &'a S,
    tag: &'a Tag,
    window: QueryWindow,
    options: &'a FetchOptions,
) -> impl Stream<Item = Result<FetchEvent>> + Send + 'a
where
    S: QuestionSource + ?Sized,
{
    async_stream::try_stream! {
        let mut page: u32 = 1;

        loop {
            if page > options.max_pages {
                info!("Tag {} reached the page cap of {}", tag, options.max_pages);
                yield FetchEvent::Finished(FetchTermination::PageCapReached {
                    pages: page - 1,
                });
                break;
            }

            let query = PageQuery {
                site: options.site.clone(),
                tag: tag.clone(),
                fromdate: window.start_epoch(),
                todate: window.end_epoch(),
                page,
                pagesize: options.page_size,
                key: options.key.clone(),
            };

            let response = source.fetch_page(&query).await?;

            if response.is_quota_exhausted() {
                Err::<(), _>(TagstatError::QuotaExhausted {
                    tag: tag.to_string(),
                    page,
                })?;
            }

            if let Some(delay) = response.backoff_duration() {
                info!(
                    "API requested a backoff of {}s after page {} of tag {}",
                    delay.as_secs(),
                    page,
                    tag
                );
                tokio::time::sleep(delay).await;
            }

            let has_more = response.has_more;
            debug!("Yielding {} items from page {} of tag {}", response.items.len(), page, tag);
            for item in response.items {
                yield FetchEvent::Item { page, item };
            }

            if !has_more {
                yield FetchEvent::Finished(FetchTermination::Exhausted { pages: page });
                break;
            }

            page += 1;
        }
    }
}
