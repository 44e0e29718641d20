use std::{sync::Arc, time::Duration};

use campus_core::RawPlace;
use tokio::time::sleep;

use crate::{
    client::{PageRequest, PlaceSearchClient, SearchPage},
    error::{FetchError, SearchError},
    retry::RetryPolicy,
};

/// Pages needed for `count` hits.
#[must_use]
pub fn total_pages(count: u64, page_size: u32) -> u32 {
    let pages = count.div_ceil(u64::from(page_size.max(1)));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Emitted before each retry sleep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryNotice {
    /// Keyword being fetched.
    pub keyword: String,
    /// Page being fetched.
    pub page_index: u32,
    /// Attempt that just failed (1-based).
    pub attempt: u32,
    /// Sleep before the next attempt.
    pub delay: Duration,
    /// Error of the failed attempt.
    pub error: SearchError,
}

type RetryHook = Arc<dyn Fn(&RetryNotice) + Send + Sync>;

/// How a harvest ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEnd {
    /// Every page was fetched.
    Complete,
    /// A page failed for good; later pages were skipped.
    Abandoned {
        /// Page that failed.
        page_index: u32,
        /// Attempts spent on it.
        attempts: u32,
        /// Last error.
        error: SearchError,
    },
    /// Quota exhausted; the caller must stop the run.
    QuotaExhausted(String),
}

/// Places collected for one keyword.
#[derive(Debug, Clone)]
pub struct PageHarvest {
    /// Places in page order.
    pub places: Vec<RawPlace>,
    /// Page count derived from page 1 (0 until page 1 succeeds).
    pub total_pages: u32,
    /// Pages fetched successfully.
    pub pages_fetched: u32,
    /// Termination reason.
    pub end: HarvestEnd,
}

/// Drives a [`PlaceSearchClient`] through retries and pagination.
#[derive(Clone)]
pub struct PageFetcher {
    client: Arc<dyn PlaceSearchClient>,
    retry: RetryPolicy,
    pause: Duration,
    page_size: u32,
    on_retry: Option<RetryHook>,
}

impl std::fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFetcher")
            .field("retry", &self.retry)
            .field("pause", &self.pause)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl PageFetcher {
    /// Creates a fetcher with the default retry policy, no pause and pages
    /// of 20.
    #[must_use]
    pub fn new(client: Arc<dyn PlaceSearchClient>) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
            pause: Duration::ZERO,
            page_size: 20,
            on_retry: None,
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the pause observed after every page call.
    #[must_use]
    pub const fn pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Sets the page size (at least 1).
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Registers a callback run before each retry sleep.
    #[must_use]
    pub fn on_retry(mut self, hook: impl Fn(&RetryNotice) + Send + Sync + 'static) -> Self {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    /// Fetches one page, retrying rate limits and transport errors within
    /// the policy budget. Quota exhaustion is returned at once.
    ///
    /// # Errors
    ///
    /// [`FetchError::QuotaExhausted`] on status 121, otherwise
    /// [`FetchError::Abandoned`] once the error is final or the budget is
    /// spent.
    pub async fn fetch_page(&self, keyword: &str, page_index: u32) -> Result<SearchPage, FetchError> {
        let request = PageRequest {
            keyword: keyword.to_string(),
            page_index,
            page_size: self.page_size,
        };
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.search(&request).await {
                Ok(page) => return Ok(page),
                Err(SearchError::QuotaExhausted(message)) => {
                    return Err(FetchError::QuotaExhausted(message))
                }
                Err(error) if error.is_retryable() && self.retry.allows_retry_after(attempt) => {
                    let delay = self.retry.delay_for(attempt);
                    if let Some(hook) = &self.on_retry {
                        hook(&RetryNotice {
                            keyword: keyword.to_string(),
                            page_index,
                            attempt,
                            delay,
                            error,
                        });
                    }
                    sleep(delay).await;
                }
                Err(error) => {
                    return Err(FetchError::Abandoned {
                        page_index,
                        attempts: attempt,
                        source: error,
                    })
                }
            }
        }
    }

    /// Fetches every page for `keyword`. The page count comes from page 1;
    /// a failed page ends the harvest but keeps what was collected.
    pub async fn harvest(&self, keyword: &str) -> PageHarvest {
        let mut harvest = PageHarvest {
            places: Vec::new(),
            total_pages: 1,
            pages_fetched: 0,
            end: HarvestEnd::Complete,
        };
        let mut page_index = 1;
        while page_index <= harvest.total_pages {
            let result = self.fetch_page(keyword, page_index).await;
            if !self.pause.is_zero() {
                sleep(self.pause).await;
            }
            match result {
                Ok(page) => {
                    if page_index == 1 {
                        harvest.total_pages = total_pages(page.count, self.page_size);
                    }
                    harvest.pages_fetched += 1;
                    harvest.places.extend(page.places);
                }
                Err(FetchError::QuotaExhausted(message)) => {
                    harvest.end = HarvestEnd::QuotaExhausted(message);
                    break;
                }
                Err(FetchError::Abandoned {
                    page_index,
                    attempts,
                    source,
                }) => {
                    harvest.end = HarvestEnd::Abandoned {
                        page_index,
                        attempts,
                        error: source,
                    };
                    break;
                }
            }
            page_index += 1;
        }
        if harvest.pages_fetched == 0 {
            harvest.total_pages = 0;
        }
        harvest
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<SearchPage, SearchError>>>,
        calls: Mutex<Vec<PageRequest>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<SearchPage, SearchError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PlaceSearchClient for ScriptedClient {
        async fn search(&self, request: &PageRequest) -> Result<SearchPage, SearchError> {
            self.calls.lock().push(request.clone());
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(SearchPage::default()))
        }
    }

    fn page(count: u64, ids: &[&str]) -> Result<SearchPage, SearchError> {
        Ok(SearchPage {
            count,
            places: ids
                .iter()
                .map(|id| RawPlace {
                    id: Some((*id).to_string()),
                    title: Some(format!("title {id}")),
                    ..RawPlace::default()
                })
                .collect(),
        })
    }

    fn fetcher(client: Arc<ScriptedClient>, attempts: u32) -> PageFetcher {
        PageFetcher::new(client)
            .retry(RetryPolicy::new(attempts, Duration::ZERO))
            .page_size(2)
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(41, 20), 3);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[tokio::test]
    async fn harvest_walks_every_page() {
        let client = ScriptedClient::new(vec![
            page(5, &["a", "b"]),
            page(5, &["c", "d"]),
            page(5, &["e"]),
        ]);
        let harvest = fetcher(client.clone(), 3).harvest("北京大学").await;
        assert_eq!(harvest.end, HarvestEnd::Complete);
        assert_eq!(harvest.total_pages, 3);
        assert_eq!(harvest.places.len(), 5);
        let pages: Vec<_> = client.calls.lock().iter().map(|c| c.page_index).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn rate_limit_and_transport_share_one_budget() {
        let client = ScriptedClient::new(vec![
            Err(SearchError::RateLimited("qps".into())),
            Err(SearchError::Transport("timeout".into())),
            Err(SearchError::RateLimited("qps".into())),
        ]);
        let notices = Arc::new(Mutex::new(Vec::new()));
        let seen = notices.clone();
        let result = fetcher(client.clone(), 3)
            .on_retry(move |notice| seen.lock().push(notice.attempt))
            .fetch_page("北京大学", 1)
            .await;
        assert_eq!(
            result,
            Err(FetchError::Abandoned {
                page_index: 1,
                attempts: 3,
                source: SearchError::RateLimited("qps".into()),
            })
        );
        assert_eq!(client.calls.lock().len(), 3);
        assert_eq!(*notices.lock(), vec![1, 2]);
    }

    #[tokio::test]
    async fn retry_recovers_within_budget() {
        let client = ScriptedClient::new(vec![
            Err(SearchError::Transport("reset".into())),
            page(1, &["a"]),
        ]);
        let result = fetcher(client, 3).fetch_page("北京大学", 1).await.unwrap();
        assert_eq!(result.places.len(), 1);
    }

    #[tokio::test]
    async fn quota_is_not_retried() {
        let client = ScriptedClient::new(vec![
            page(6, &["a", "b"]),
            Err(SearchError::QuotaExhausted("daily".into())),
        ]);
        let harvest = fetcher(client.clone(), 5).harvest("北京大学").await;
        assert_eq!(harvest.end, HarvestEnd::QuotaExhausted("daily".into()));
        assert_eq!(harvest.places.len(), 2);
        assert_eq!(client.calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn api_error_abandons_remaining_pages() {
        let client = ScriptedClient::new(vec![
            page(6, &["a", "b"]),
            Err(SearchError::Api {
                status: 311,
                message: "bad".into(),
            }),
        ]);
        let harvest = fetcher(client.clone(), 5).harvest("北京大学").await;
        assert!(matches!(
            harvest.end,
            HarvestEnd::Abandoned {
                page_index: 2,
                attempts: 1,
                ..
            }
        ));
        assert_eq!(harvest.pages_fetched, 1);
        assert_eq!(harvest.total_pages, 3);
        assert_eq!(client.calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn zero_hits_stop_after_first_page() {
        let client = ScriptedClient::new(vec![page(0, &[])]);
        let harvest = fetcher(client.clone(), 2).harvest("无名学院").await;
        assert_eq!(harvest.total_pages, 0);
        assert!(harvest.places.is_empty());
        assert_eq!(client.calls.lock().len(), 1);
    }
}
