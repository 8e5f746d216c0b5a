use crate::config::StreakSettings;
use crate::history::source::{HistorySource, UpstreamError};
use crate::rate_limit::RateLimiter;
use domain::history::HistoryEvent;
use domain::value::UserName;
use log::{error, warn};
use std::sync::Arc;
use std::time::Duration;

/// 单页抓取结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFetch {
    Fetched(FetchedPage),
    /// 暂时性失败，已等待退避时间，调用方应重试同一页
    Retry,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub events: Vec<HistoryEvent>,
    pub total_pages: Option<u32>,
}

/// 带限速和失败退避的单页抓取器
pub struct PageFetcher {
    source: Arc<dyn HistorySource>,
    limiter: Arc<RateLimiter>,
    min_spacing: Duration,
    retry_backoff: Duration,
}

impl PageFetcher {
    pub fn new(
        source: Arc<dyn HistorySource>,
        limiter: Arc<RateLimiter>,
        settings: &StreakSettings,
    ) -> Self {
        Self {
            source,
            limiter,
            min_spacing: settings.min_request_spacing,
            retry_backoff: settings.retry_backoff,
        }
    }

    /// 抓取一页；没有时间戳的记录（正在播放）被直接丢弃
    ///
    /// 失败不会返回错误：等待退避时间后返回 `PageFetch::Retry`，页码由调用方保持不变。
    pub async fn fetch_page(&self, user: &UserName, page: u32, page_size: u32) -> PageFetch {
        self.limiter.throttle(self.min_spacing).await;

        match self.source.fetch_history(user, page, page_size).await {
            Ok(history) => PageFetch::Fetched(FetchedPage {
                events: history
                    .records
                    .iter()
                    .filter_map(HistoryEvent::from_record)
                    .collect(),
                total_pages: history.total_pages,
            }),
            Err(UpstreamError::Status(status)) => {
                warn!(
                    "Got {} at page {}, waiting {}ms before retrying",
                    status,
                    page,
                    self.retry_backoff.as_millis()
                );
                tokio::time::sleep(self.retry_backoff).await;
                PageFetch::Retry
            }
            Err(e) => {
                error!("Error fetching page {}: {}", page, e);
                tokio::time::sleep(self.retry_backoff).await;
                PageFetch::Retry
            }
        }
    }
}
