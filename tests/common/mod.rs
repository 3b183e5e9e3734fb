//! Common test utilities and helpers for tagstat tests
//!
//! Provides a scripted [`QuestionSource`] that answers per tag from a queue
//! of prepared pages, plus builders for pages and windows.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tagstat::{
    error::{Result, TagstatError},
    source::QuestionSource,
    types::{PageQuery, QuestionsPage, RawItem},
    window::QueryWindow,
};

/// Source answering each tag from its own queue of responses
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<HashMap<String, VecDeque<Result<QuestionsPage>>>>,
    queries: Mutex<Vec<PageQuery>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the responses for `tag`, served in order
    pub fn script(self, tag: &str, responses: Vec<Result<QuestionsPage>>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(tag.to_string(), responses.into());
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Pages requested for `tag`, in order
    pub fn requested_pages(&self, tag: &str) -> Vec<u32> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.tag.as_str() == tag)
            .map(|q| q.page)
            .collect()
    }
}

#[async_trait]
impl QuestionSource for ScriptedSource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<QuestionsPage> {
        self.queries.lock().unwrap().push(query.clone());
        self.responses
            .lock()
            .unwrap()
            .get_mut(query.tag.as_str())
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| {
                Err(TagstatError::Config(format!(
                    "no scripted response for {} page {}",
                    query.tag, query.page
                )))
            })
    }
}

/// Unix timestamp of noon on a date
pub fn noon(year: i32, month: u32, day: u32) -> i64 {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .unwrap()
        .timestamp()
}

/// A page of `count` questions, all created at `creation_date`
pub fn page_at(creation_date: i64, count: usize, has_more: bool) -> QuestionsPage {
    QuestionsPage {
        items: (0..count)
            .map(|i| RawItem {
                creation_date: Some(creation_date + i as i64),
                question_id: Some(i as u64),
            })
            .collect(),
        has_more,
        quota_max: Some(300),
        quota_remaining: Some(250),
        ..Default::default()
    }
}

/// A page whose items are created at the given timestamps
pub fn page_of(creation_dates: &[i64], has_more: bool) -> QuestionsPage {
    QuestionsPage {
        items: creation_dates
            .iter()
            .map(|&ts| RawItem {
                creation_date: Some(ts),
                question_id: None,
            })
            .collect(),
        has_more,
        ..Default::default()
    }
}

/// Error a server would produce for a failing page
pub fn http_error(status: u16, tag: &str, page: u32) -> TagstatError {
    TagstatError::Api {
        status,
        tag: tag.to_string(),
        page,
        reason: Some("throttle_violation (error_id 502)".to_string()),
        body: r#"{"error_id":502,"error_name":"throttle_violation"}"#.to_string(),
    }
}

/// March 2024, inclusive
pub fn march_2024() -> QueryWindow {
    QueryWindow::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
    )
    .unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
