//! HTTP client for the Stack Exchange `/questions` endpoint

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Url};
use std::time::Duration;
use tagstat_core::error::{Result, TagstatError};
use tagstat_core::source::QuestionSource;
use tagstat_core::types::{PageQuery, QuestionsPage};
use tracing::{debug, warn};

/// Stack Exchange questions endpoint
pub const DEFAULT_API_URL: &str = "https://api.stackexchange.com/2.3/questions";

/// Site queried when none is configured
pub const DEFAULT_SITE: &str = "stackoverflow";

/// Per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Characters of an error body kept in `TagstatError::Api`
pub const ERROR_BODY_LIMIT: usize = 1500;

/// Client for a Stack Exchange compatible `/questions` endpoint
#[derive(Debug, Clone)]
pub struct StackExchangeClient {
    client: Client,
    api_url: Url,
}

impl StackExchangeClient {
    /// Create a client for `api_url` with a per-request timeout
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let api_url = Url::parse(api_url)
            .map_err(|e| TagstatError::Config(format!("invalid API URL '{api_url}': {e}")))?;

        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(format!("tagstat/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, api_url })
    }

    /// Client for the public API with the default timeout
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_API_URL, DEFAULT_TIMEOUT)
    }

    fn page_url(&self, query: &PageQuery) -> Url {
        let mut url = self.api_url.clone();
        url.query_pairs_mut()
            .extend_pairs(query.to_params().iter().map(|(k, v)| (*k, v.as_str())));
        url
    }
}

#[async_trait]
impl QuestionSource for StackExchangeClient {
    async fn fetch_page(&self, query: &PageQuery) -> Result<QuestionsPage> {
        debug!("Requesting page {} for tag {}", query.page, query.tag);

        let response = self.client.get(self.page_url(query)).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<QuestionsPage>(&body)
                .ok()
                .and_then(|page| page.api_error());
            warn!(
                "HTTP {} for tag {} page {}: {}",
                status.as_u16(),
                query.tag,
                query.page,
                reason.as_deref().unwrap_or("no error details")
            );
            return Err(TagstatError::Api {
                status: status.as_u16(),
                tag: query.tag.to_string(),
                page: query.page,
                reason,
                body: truncate_body(&body, ERROR_BODY_LIMIT),
            });
        }

        let bytes = response.bytes().await?;
        let page: QuestionsPage = serde_json::from_slice(&bytes)?;

        debug!(
            "Page {} for tag {}: {} items, has_more={}, quota_remaining={:?}",
            query.page,
            query.tag,
            page.items.len(),
            page.has_more,
            page.quota_remaining
        );

        Ok(page)
    }
}

/// Keep at most `limit` characters of a response body
pub fn truncate_body(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}
