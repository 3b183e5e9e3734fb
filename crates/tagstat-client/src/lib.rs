//! Stack Exchange client and paginated fetcher for tagstat
//!
//! This crate talks to the `/questions` endpoint and turns its paged,
//! rate-limited responses into a single stream of question records.

pub mod client;
pub mod fetcher;

pub use client::StackExchangeClient;
pub use fetcher::{FetchEvent, FetchOptions, FetchTermination, fetch_questions};
