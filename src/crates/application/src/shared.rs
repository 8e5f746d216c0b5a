use chrono::{DateTime, Utc};

/// 持久化键值存储，读写均可能失败
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_string(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set_string(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// 墙上时钟（用于“今天”的判定和缓存过期）
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
