use crate::config::StreakSettings;
use crate::error::AppError;
use crate::history::fetcher::{PageFetch, PageFetcher};
use crate::history::source::HistorySource;
use crate::rate_limit::RateLimiter;
use domain::day::DaySet;
use domain::history::PageCursor;
use domain::value::UserName;
use log::{debug, info};
use std::sync::Arc;

/// 逐页拉取播放历史并折叠为收听日集合
///
/// 页码严格顺序推进，不同页码最多抓取 `max_pages` 个；同一页的重试次数默认不设上限。
pub struct HistoryAggregator {
    fetcher: PageFetcher,
    settings: StreakSettings,
}

impl HistoryAggregator {
    pub fn new(
        source: Arc<dyn HistorySource>,
        limiter: Arc<RateLimiter>,
        settings: StreakSettings,
    ) -> Self {
        Self {
            fetcher: PageFetcher::new(source, limiter, &settings),
            settings,
        }
    }

    pub fn settings(&self) -> &StreakSettings {
        &self.settings
    }

    pub async fn aggregate(&self, user: &UserName) -> Result<DaySet, AppError> {
        let mut cursor =
            PageCursor::new(self.settings.page_size)?.with_max_pages(self.settings.max_pages);
        let convention = self.settings.day_convention;
        let mut days = DaySet::new();
        let mut consecutive_failures = 0u32;

        while cursor.has_remaining() {
            let page_number = cursor.page_number();
            let page = match self
                .fetcher
                .fetch_page(user, page_number, cursor.page_size())
                .await
            {
                PageFetch::Fetched(page) => {
                    consecutive_failures = 0;
                    page
                }
                PageFetch::Retry => {
                    consecutive_failures += 1;
                    if let Some(limit) = self.settings.max_retries_per_page {
                        if consecutive_failures > limit {
                            return Err(AppError::RetriesExhausted {
                                page: page_number,
                                attempts: consecutive_failures,
                            });
                        }
                    }
                    continue;
                }
            };

            if cursor.is_first_page() {
                if let Some(total) = cursor.learn_total_pages(page.total_pages) {
                    info!("Total pages to fetch for {}: {}", user, total);
                }
            }

            if page.events.is_empty() {
                info!("No more history at page {}", page_number);
                break;
            }

            for event in &page.events {
                match event.day(&convention) {
                    Some(day) => {
                        days.insert(day);
                    }
                    None => debug!("Skipping out-of-range timestamp {}", event.played_at),
                }
            }

            if page_number % 10 == 0 {
                info!(
                    "Fetched page {}/{}, unique days: {}",
                    page_number,
                    cursor.total_pages_known().unwrap_or(cursor.max_pages()),
                    days.len()
                );
            }

            cursor.advance();
        }

        info!("Finished fetching. Total unique days: {}", days.len());
        Ok(days)
    }
}
