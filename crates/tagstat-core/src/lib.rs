//! Core types, traits, and utilities for tagstat
//!
//! This crate provides the foundational types, error handling, the
//! query window calculator, the bucketing function and the source trait
//! used by all other tagstat crates.

pub mod bucket;
pub mod error;
pub mod source;
pub mod types;
pub mod window;

// Re-export commonly used types
pub use bucket::{bucket_date, bucket_epoch};
pub use error::{Result, TagstatError};
pub use source::QuestionSource;
pub use types::{
    BucketDate, CountKey, CountRow, CountTable, Granularity, PageQuery, QuestionsPage, RawItem,
    Tag,
};
pub use window::QueryWindow;
