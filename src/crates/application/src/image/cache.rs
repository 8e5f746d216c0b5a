use crate::config::ImageCacheSettings;
use crate::image::subject::ImageSubject;
use crate::image::ImageResolver;
use crate::rate_limit::RateLimiter;
use crate::shared::{Clock, KeyValueStore};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// 缓存条目（以 JSON 存入键值存储）
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    url: String,
    /// 解析时间（毫秒）
    timestamp: i64,
}

/// 带有效期的图片地址缓存
///
/// 只在有效期内复用结果，没有容量上限和其他淘汰策略；存储读写失败时退化为未命中/不写入。
pub struct ImageCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    limiter: RateLimiter,
    settings: ImageCacheSettings,
}

impl ImageCache {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        settings: ImageCacheSettings,
    ) -> Self {
        Self {
            store,
            clock,
            limiter: RateLimiter::new(),
            settings,
        }
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.settings.key_prefix, key)
    }

    /// 时间戳来自持久化存储，溢出或晚于当前时间都视为过期
    fn is_fresh(&self, resolved_at_ms: i64) -> bool {
        let ttl_ms = i64::try_from(self.settings.ttl.as_millis()).unwrap_or(i64::MAX);
        self.clock
            .now()
            .timestamp_millis()
            .checked_sub(resolved_at_ms)
            .map_or(false, |age_ms| (0..ttl_ms).contains(&age_ms))
    }

    /// 读取未过期的缓存地址
    pub async fn get_cached(&self, key: &str) -> Option<String> {
        let raw = match self.store.get_string(&self.storage_key(key)).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Error reading image cache for {}: {}", key, e);
                return None;
            }
        };
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Discarding unreadable image cache entry {}: {}", key, e);
                return None;
            }
        };
        if self.is_fresh(entry.timestamp) {
            Some(entry.url)
        } else {
            debug!("Image cache expired: {}", key);
            None
        }
    }

    /// 写入缓存；失败只记录日志
    pub async fn put(&self, key: &str, url: &str) {
        let entry = CacheEntry {
            url: url.to_string(),
            timestamp: self.clock.now().timestamp_millis(),
        };
        let value = match serde_json::to_string(&entry) {
            Ok(value) => value,
            Err(e) => {
                warn!("Error encoding image cache entry {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.store.set_string(&self.storage_key(key), &value).await {
            warn!("Error writing image cache for {}: {}", key, e);
        }
    }

    /// 命中未过期缓存时直接返回，否则调用解析器并缓存非空结果
    pub async fn get_or_resolve(
        &self,
        subject: &ImageSubject,
        resolver: &dyn ImageResolver,
    ) -> Option<String> {
        let key = subject.cache_key();
        if let Some(url) = self.get_cached(&key).await {
            debug!("Using cached image for {}", subject);
            return Some(url);
        }
        self.resolve_and_store(&key, subject, resolver).await
    }

    /// 依次为多个对象取图：命中缓存的立即返回，未命中的解析调用之间保持 `resolve_spacing` 间隔
    ///
    /// 找不到图片的对象不出现在结果中。
    pub async fn resolve_all(
        &self,
        subjects: &[ImageSubject],
        resolver: &dyn ImageResolver,
    ) -> HashMap<ImageSubject, String> {
        let mut images = HashMap::with_capacity(subjects.len());
        for subject in subjects {
            let key = subject.cache_key();
            if let Some(url) = self.get_cached(&key).await {
                debug!("Using cached image for {}", subject);
                images.insert(subject.clone(), url);
                continue;
            }
            self.limiter.throttle(self.settings.resolve_spacing).await;
            if let Some(url) = self.resolve_and_store(&key, subject, resolver).await {
                images.insert(subject.clone(), url);
            }
        }
        images
    }

    async fn resolve_and_store(
        &self,
        key: &str,
        subject: &ImageSubject,
        resolver: &dyn ImageResolver,
    ) -> Option<String> {
        match resolver.resolve(subject).await {
            Some(url) => {
                debug!("Saved image for {}: {}", subject, url);
                self.put(key, &url).await;
                Some(url)
            }
            None => {
                debug!("No image found for {}", subject);
                None
            }
        }
    }
}
