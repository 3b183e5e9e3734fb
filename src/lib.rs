//! tagstat - Count Stack Exchange questions per tag over time buckets
//!
//! This library provides functionality to:
//! - Compute a historical query window from month offsets
//! - Page through the `/questions` endpoint for each tag, obeying the API's
//!   backoff and quota signals
//! - Count questions per (day or ISO week, tag)
//! - Write the counts as a sorted CSV table
//!
//! # Examples
//!
//! ```no_run
//! use tagstat::{
//!     aggregation::Aggregator,
//!     output::write_counts,
//!     types::{Granularity, Tag},
//!     window::QueryWindow,
//! };
//! use tagstat_client::{FetchOptions, StackExchangeClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> tagstat::Result<()> {
//!     let client = Arc::new(StackExchangeClient::with_defaults()?);
//!     let window = QueryWindow::from_month_offsets(chrono::Utc::now(), 6, 2)?;
//!     let aggregator = Aggregator::new(client, window, FetchOptions::default())
//!         .with_granularity(Granularity::Week);
//!
//!     let tags = vec![Tag::new("rust")?, Tag::new("go")?];
//!     let collection = aggregator.collect(&tags, |_| {}).await?;
//!
//!     write_counts("data/questions_by_date.csv".as_ref(), &collection.table)?;
//!     Ok(())
//! }
//! ```

pub mod aggregation;
pub mod cli;
pub mod output;

pub use tagstat_core::{bucket, error, source, types, window};

// Re-export commonly used types
pub use error::{Result, TagstatError};
pub use types::{BucketDate, CountTable, Granularity, Tag};
