pub mod cache;
pub mod subject;

pub use cache::ImageCache;
pub use subject::ImageSubject;

use async_trait::async_trait;

/// 外部图片搜索（例如音乐平台的搜索接口）
#[async_trait]
pub trait ImageResolver: Send + Sync {
    /// 找不到图片或调用失败时返回 None
    async fn resolve(&self, subject: &ImageSubject) -> Option<String>;
}
