use domain::value::{CalculationEpoch, StreakResult};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// 对外可见的连续天数状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreakState {
    /// 计算尚未产出任何值（界面显示加载中）
    #[default]
    Pending,
    Ready(StreakResult),
}

/// 共享的进度面板：当前 epoch 与最近一次被接受的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakBoard {
    pub epoch: CalculationEpoch,
    pub state: StreakState,
}

/// 进度序列的发送端，随计算结束而释放
#[derive(Debug)]
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<StreakResult>,
}

impl ProgressSink {
    pub(crate) fn send(&self, value: StreakResult) {
        // 接收端已放弃时直接丢弃
        let _ = self.tx.send(value);
    }
}

/// 进度序列的接收端
///
/// 有限且不可重启：依次产出单调不减的计数，对应的计算返回后结束。
#[derive(Debug)]
pub struct ProgressStream {
    rx: mpsc::UnboundedReceiver<StreakResult>,
}

impl Stream for ProgressStream {
    type Item = StreakResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

pub fn progress_channel() -> (ProgressSink, ProgressStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSink { tx }, ProgressStream { rx })
}
