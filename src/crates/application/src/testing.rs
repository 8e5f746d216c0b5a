//! 测试用的端口替身

use crate::config::StreakSettings;
use crate::history::source::{HistoryPage, HistorySource, UpstreamError};
use crate::image::{ImageResolver, ImageSubject};
use crate::shared::{Clock, KeyValueStore};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use dashmap::DashMap;
use domain::day::DayConvention;
use domain::history::HistoryRecord;
use domain::value::UserName;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

type PageResult = Result<HistoryPage, UpstreamError>;

/// 按脚本依次返回响应的上游；脚本耗尽后返回 fallback
pub(crate) struct ScriptedSource {
    script: Mutex<VecDeque<PageResult>>,
    fallback: PageResult,
    calls: Mutex<Vec<u32>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<PageResult>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: Ok(HistoryPage::default()),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn with_fallback(mut self, fallback: PageResult) -> Self {
        self.fallback = fallback;
        self
    }

    /// 每次请求前需要从 gate 取得一个许可
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistorySource for ScriptedSource {
    async fn fetch_history(
        &self,
        _user: &UserName,
        page: u32,
        _page_size: u32,
    ) -> Result<HistoryPage, UpstreamError> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.calls.lock().unwrap().push(page);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

pub(crate) struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn at(rfc3339: &str) -> Self {
        let now = DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc);
        Self(Mutex::new(now))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// `day` 当天 UTC `hour` 点的 Unix 秒
pub(crate) fn ts(day: &str, hour: u32) -> i64 {
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp()
}

pub(crate) fn page(timestamps: &[i64], total_pages: Option<u32>) -> PageResult {
    Ok(HistoryPage {
        records: timestamps.iter().map(|t| HistoryRecord::played_at(*t)).collect(),
        total_pages,
    })
}

pub(crate) fn utc_settings() -> StreakSettings {
    StreakSettings {
        day_convention: DayConvention::Utc,
        ..StreakSettings::default()
    }
}

pub(crate) fn user() -> UserName {
    UserName::parse("rj").unwrap()
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.clone())
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_string(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.raw(key))
    }

    async fn set_string(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.insert_raw(key, value);
        Ok(())
    }
}

/// 读写都失败的存储（例如配额耗尽）
pub(crate) struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get_string(&self, _key: &str) -> anyhow::Result<Option<String>> {
        anyhow::bail!("storage unavailable")
    }

    async fn set_string(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
        anyhow::bail!("quota exceeded")
    }
}

/// 统计调用次数的解析器
pub(crate) struct CountingResolver {
    answer: Option<String>,
    missing: HashSet<ImageSubject>,
    calls: AtomicUsize,
}

impl CountingResolver {
    pub fn answering(answer: Option<&str>) -> Self {
        Self {
            answer: answer.map(str::to_string),
            missing: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn without_image_for(mut self, subject: ImageSubject) -> Self {
        self.missing.insert(subject);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageResolver for CountingResolver {
    async fn resolve(&self, subject: &ImageSubject) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.missing.contains(subject) {
            return None;
        }
        self.answer.clone()
    }
}
