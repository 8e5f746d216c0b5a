use domain::day::DayConvention;
use domain::history::MAX_PAGES;
use std::time::Duration;

/// 连续天数计算配置
#[derive(Debug, Clone, PartialEq)]
pub struct StreakSettings {
    /// 每页记录数
    pub page_size: u32,
    /// 最多抓取的页数（不超过 500）
    pub max_pages: u32,
    /// 两次上游请求之间的最小间隔
    pub min_request_spacing: Duration,
    /// 请求失败后重试前的等待时间
    pub retry_backoff: Duration,
    /// 单页连续失败次数上限，None 表示无限重试
    pub max_retries_per_page: Option<u32>,
    /// 日期切分时区
    pub day_convention: DayConvention,
}

impl Default for StreakSettings {
    fn default() -> Self {
        Self {
            page_size: 200,
            max_pages: MAX_PAGES,
            min_request_spacing: Duration::from_millis(500),
            retry_backoff: Duration::from_millis(2000),
            max_retries_per_page: None,
            day_convention: DayConvention::Local,
        }
    }
}

/// 图片地址缓存配置
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCacheSettings {
    /// 缓存有效期
    pub ttl: Duration,
    /// 存储键前缀
    pub key_prefix: String,
    /// 未命中时调用解析器的最小间隔
    pub resolve_spacing: Duration,
}

impl Default for ImageCacheSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(7 * 24 * 3600), // 7 天
            key_prefix: "img_".to_string(),
            resolve_spacing: Duration::from_millis(500),
        }
    }
}

pub trait StreakConfig {
    fn streak_settings(&self) -> StreakSettings;
}

pub trait ImageCacheConfig {
    fn image_cache_settings(&self) -> ImageCacheSettings;
}
