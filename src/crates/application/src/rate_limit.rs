use tokio::sync::Mutex;
use tokio::time::{sleep_until, Duration, Instant};

/// 最小调用间隔限速器
///
/// 同一实例上的任意两次调用开始时间相隔不少于 `min_delay`；并发调用方按到达顺序排队。
#[derive(Debug, Default)]
pub struct RateLimiter {
    last_call_at: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 挂起直到距上次调用至少经过 `min_delay`，然后记录当前时刻
    pub async fn throttle(&self, min_delay: Duration) {
        let mut last_call_at = self.last_call_at.lock().await;
        if let Some(last) = *last_call_at {
            let ready_at = last + min_delay;
            if ready_at > Instant::now() {
                sleep_until(ready_at).await;
            }
        }
        *last_call_at = Some(Instant::now());
    }
}
