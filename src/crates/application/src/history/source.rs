use async_trait::async_trait;
use domain::history::HistoryRecord;
use domain::value::UserName;
use thiserror::Error;

/// 上游调用失败（均视为暂时性失败）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Upstream responded with status {0}")]
    Status(u16),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Decode error: {0}")]
    Decode(String),
}

/// 上游单页响应
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPage {
    pub records: Vec<HistoryRecord>,
    /// 上游报告的总页数（只在第 1 页被采用）
    pub total_pages: Option<u32>,
}

/// 播放历史上游（传输与编码细节由实现决定）
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn fetch_history(
        &self,
        user: &UserName,
        page: u32,
        page_size: u32,
    ) -> Result<HistoryPage, UpstreamError>;
}
