//! Source trait for question pages
//!
//! This module defines the `QuestionSource` trait the paginated fetcher
//! pulls from. The HTTP client implements it against the live API; tests
//! implement it with scripted pages.

use crate::error::Result;
use crate::types::{PageQuery, QuestionsPage};
use async_trait::async_trait;

/// Anything that can answer a single `/questions` page request.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch and decode one page.
    ///
    /// A non-success response must come back as an error; quota and
    /// backoff signals are left in the returned page for the caller.
    async fn fetch_page(&self, query: &PageQuery) -> Result<QuestionsPage>;
}

#[async_trait]
impl<S: QuestionSource + ?Sized> QuestionSource for std::sync::Arc<S> {
    async fn fetch_page(&self, query: &PageQuery) -> Result<QuestionsPage> {
        (**self).fetch_page(query).await
    }
}
