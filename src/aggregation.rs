//! Aggregation module for counting questions per bucket and tag
//!
//! The [`Aggregator`] drives the paginated fetcher for one tag at a time and
//! folds every record into a caller-owned [`CountTable`]. A fetch that fails
//! part way (HTTP error, exhausted quota, transport failure) only ends that
//! tag: the counts gathered so far are kept, the failure is recorded in the
//! tag's [`TagReport`], and the next tag proceeds.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use tagstat::aggregation::Aggregator;
//! use tagstat::types::{CountTable, Tag};
//! use tagstat::window::QueryWindow;
//! use tagstat_client::{FetchOptions, StackExchangeClient};
//!
//! # async fn example() -> tagstat::Result<()> {
//! let client = Arc::new(StackExchangeClient::with_defaults()?);
//! let window = QueryWindow::from_month_offsets(chrono::Utc::now(), 6, 2)?;
//! let aggregator = Aggregator::new(client, window, FetchOptions::default());
//!
//! let mut table = CountTable::new();
//! let report = aggregator.count_tag(&Tag::new("rust")?, &mut table).await?;
//! println!("{} questions for {}", report.fetched, report.tag);
//! # Ok(())
//! # }
//! ```

use crate::bucket::bucket_date;
use crate::error::{Result, TagstatError};
use crate::source::QuestionSource;
use crate::types::{CountTable, Granularity, Tag};
use crate::window::QueryWindow;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::Arc;
use tagstat_client::{FetchEvent, FetchOptions, FetchTermination, fetch_questions};
use tracing::{debug, info, warn};

/// How the fetch for a tag ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TagOutcome {
    /// Every page in the window was read
    Exhausted,
    /// The page limit was hit while more pages remained
    PageCapReached,
    /// The fetch stopped on an error; counts gathered before it are kept
    Failed { error: String },
}

/// Per-tag summary of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagReport {
    pub tag: Tag,
    /// Records counted into the table
    pub fetched: u64,
    /// Records skipped for a missing or unbucketable creation date
    pub skipped: u64,
    /// Pages read successfully
    pub pages: u32,
    /// Creation time of the last counted record
    pub last_created: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub outcome: TagOutcome,
}

impl TagReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, TagOutcome::Failed { .. })
    }
}

/// Result of counting several tags
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub table: CountTable,
    pub reports: Vec<TagReport>,
}

impl Collection {
    /// Number of tags whose fetch stopped on an error
    pub fn failed_tags(&self) -> usize {
        self.reports.iter().filter(|r| r.is_failed()).count()
    }
}

/// Internal accumulator for one tag
#[derive(Default)]
struct TagAccumulator {
    fetched: u64,
    skipped: u64,
    pages: u32,
    last_created: Option<DateTime<Utc>>,
}

impl TagAccumulator {
    fn add_item(&mut self, created: DateTime<Utc>) {
        self.fetched += 1;
        self.last_created = Some(created);
    }

    fn into_report(self, tag: &Tag, outcome: TagOutcome) -> TagReport {
        TagReport {
            tag: tag.clone(),
            fetched: self.fetched,
            skipped: self.skipped,
            pages: self.pages,
            last_created: self.last_created,
            outcome,
        }
    }
}

/// Counts questions per (bucket, tag) from a question source
pub struct Aggregator {
    source: Arc<dyn QuestionSource>,
    window: QueryWindow,
    options: FetchOptions,
    granularity: Granularity,
    strict: bool,
    show_progress: bool,
}

impl Aggregator {
    /// Create a new aggregator with day buckets
    pub fn new(source: Arc<dyn QuestionSource>, window: QueryWindow, options: FetchOptions) -> Self {
        Self {
            source,
            window,
            options,
            granularity: Granularity::Day,
            strict: false,
            show_progress: false,
        }
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Fail a tag on records without a usable creation date instead of
    /// skipping them
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Enable progress spinner
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Count every question of `tag` inside the window into `table`
    ///
    /// Fetch errors end the tag and are reported in the returned
    /// [`TagReport`]. Any other error is returned as is.
    pub async fn count_tag(&self, tag: &Tag, table: &mut CountTable) -> Result<TagReport> {
        info!("TAG={} | period_utc: {}", tag, self.window);

        let progress = self.spinner(tag);
        let mut acc = TagAccumulator::default();
        let mut outcome = None;

        let events = fetch_questions(self.source.as_ref(), tag, self.window, &self.options);
        tokio::pin!(events);

        while let Some(event) = events.next().await {
            let error = match event {
                Ok(FetchEvent::Item { page, item }) => {
                    acc.pages = acc.pages.max(page);
                    let bucketed = item.created_at().and_then(|created| {
                        bucket_date(created, self.granularity).map(|bucket| (created, bucket))
                    });
                    match bucketed {
                        Some((created, bucket)) => {
                            table.increment(bucket, tag);
                            acc.add_item(created);
                            if let Some(ref pb) = progress {
                                pb.set_position(acc.fetched);
                            }
                            continue;
                        }
                        None if self.strict => TagstatError::MalformedItem {
                            tag: tag.to_string(),
                            page,
                        },
                        None => {
                            warn!(
                                "Skipping question {:?} with unusable creation_date {:?} | tag={} | page={}",
                                item.question_id, item.creation_date, tag, page
                            );
                            acc.skipped += 1;
                            continue;
                        }
                    }
                }
                Ok(FetchEvent::Finished(termination)) => {
                    acc.pages = termination.pages();
                    outcome = Some(match termination {
                        FetchTermination::Exhausted { .. } => TagOutcome::Exhausted,
                        FetchTermination::PageCapReached { .. } => TagOutcome::PageCapReached,
                    });
                    continue;
                }
                Err(e) => e,
            };

            if !error.is_fetch_error() {
                if let Some(pb) = progress {
                    pb.finish_and_clear();
                }
                return Err(error);
            }

            warn!("Stopped: tag={} | fetched={} | {}", tag, acc.fetched, error);
            outcome = Some(TagOutcome::Failed {
                error: error.to_string(),
            });
            break;
        }

        if let Some(pb) = progress {
            pb.finish_with_message(format!("{tag}: {} questions", acc.fetched));
        }

        let report = acc.into_report(tag, outcome.unwrap_or(TagOutcome::Exhausted));
        debug!(
            "Tag {} finished: fetched={} skipped={} pages={}",
            tag, report.fetched, report.skipped, report.pages
        );
        Ok(report)
    }

    /// Count all `tags` one after another into a fresh table
    ///
    /// `on_tag` is called with each tag's report as soon as it is done.
    pub async fn collect(
        &self,
        tags: &[Tag],
        mut on_tag: impl FnMut(&TagReport),
    ) -> Result<Collection> {
        let mut collection = Collection::default();

        for tag in tags {
            let report = self.count_tag(tag, &mut collection.table).await?;
            on_tag(&report);
            collection.reports.push(report);
        }

        Ok(collection)
    }

    fn spinner(&self, tag: &Tag) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}] {pos} questions counted")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(format!("Fetching {tag}"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    }
}
