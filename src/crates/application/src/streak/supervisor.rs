use crate::history::HistoryAggregator;
use crate::shared::Clock;
use crate::streak::progress::{
    progress_channel, ProgressSink, ProgressStream, StreakBoard, StreakState,
};
use domain::day::{DayKey, DaySet};
use domain::streak::StreakWalk;
use domain::value::{CalculationEpoch, StreakResult, UserName};
use futures::FutureExt;
use log::{error, info};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// 一次计算请求的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationOutcome {
    /// 计算结束时该 epoch 仍是当前 epoch
    Completed(StreakResult),
    /// 计算结束前已有更新的请求，结果被丢弃
    Superseded(CalculationEpoch),
    /// 请求被拒绝，没有产生任何效果
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    AlreadyRunning,
    MissingUser,
}

/// 后台运行中的一次计算
pub struct StreakRun {
    pub epoch: CalculationEpoch,
    pub progress: ProgressStream,
    pub outcome: JoinHandle<CalculationOutcome>,
}

/// 单飞标记的持有者，释放时（包括 panic 和 future 被丢弃）清除标记
struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// 连续天数计算的对外入口
///
/// - 单飞：任意时刻最多一个聚合在运行，并发请求直接拒绝，不排队；
/// - epoch：每个请求都会推进 epoch，进度和最终结果只在其 epoch 仍为当前值时才投递。
///   被取代的计算不会被中断，其网络请求照常完成，只是输出被丢弃。
pub struct StreakSupervisor {
    aggregator: HistoryAggregator,
    clock: Arc<dyn Clock>,
    running: AtomicBool,
    board: watch::Sender<StreakBoard>,
}

impl StreakSupervisor {
    pub fn new(aggregator: HistoryAggregator, clock: Arc<dyn Clock>) -> Self {
        let (board, _) = watch::channel(StreakBoard::default());
        Self {
            aggregator,
            clock,
            running: AtomicBool::new(false),
            board,
        }
    }

    pub fn current_epoch(&self) -> CalculationEpoch {
        self.board.borrow().epoch
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn state(&self) -> StreakState {
        self.board.borrow().state
    }

    pub fn subscribe(&self) -> watch::Receiver<StreakBoard> {
        self.board.subscribe()
    }

    /// 执行一次计算，进度写入 `progress`，返回时 `progress` 被释放
    pub async fn run_streak_calculation(
        &self,
        user: &str,
        progress: ProgressSink,
    ) -> CalculationOutcome {
        let epoch = self.advance_epoch();
        self.run_for_epoch(epoch, user, progress).await
    }

    /// 在后台任务中执行计算；epoch 在调用时立即推进
    pub fn spawn_streak_calculation(self: &Arc<Self>, user: impl Into<String>) -> StreakRun {
        let epoch = self.advance_epoch();
        let (sink, progress) = progress_channel();
        let supervisor = Arc::clone(self);
        let user = user.into();
        let outcome =
            tokio::spawn(async move { supervisor.run_for_epoch(epoch, &user, sink).await });
        StreakRun {
            epoch,
            progress,
            outcome,
        }
    }

    fn advance_epoch(&self) -> CalculationEpoch {
        let mut epoch = CalculationEpoch::default();
        // 只推进 epoch，不通知订阅者：状态本身没有变化
        self.board.send_if_modified(|board| {
            board.epoch = board.epoch.next();
            epoch = board.epoch;
            false
        });
        epoch
    }

    fn is_current(&self, epoch: CalculationEpoch) -> bool {
        self.board.borrow().epoch == epoch
    }

    /// 仅当 `epoch` 仍为当前值时更新面板并写入进度序列
    fn deliver(&self, epoch: CalculationEpoch, state: StreakState, progress: &ProgressSink) {
        self.board.send_if_modified(|board| {
            if board.epoch != epoch {
                return false;
            }
            if let StreakState::Ready(value) = state {
                progress.send(value);
            }
            board.state = state;
            true
        });
    }

    async fn run_for_epoch(
        &self,
        epoch: CalculationEpoch,
        user: &str,
        progress: ProgressSink,
    ) -> CalculationOutcome {
        let user = match UserName::parse(user) {
            Ok(user) => user,
            Err(_) => {
                info!("No username, skipping streak calculation (epoch {})", epoch);
                return CalculationOutcome::Rejected(RejectReason::MissingUser);
            }
        };
        let _guard = match FlightGuard::acquire(&self.running) {
            Some(guard) => guard,
            None => {
                info!("Already calculating, rejected streak request (epoch {})", epoch);
                return CalculationOutcome::Rejected(RejectReason::AlreadyRunning);
            }
        };

        info!("Starting streak calculation for {} (epoch {})", user, epoch);
        self.deliver(epoch, StreakState::Pending, &progress);
        let today = self
            .aggregator
            .settings()
            .day_convention
            .day_of(self.clock.now());

        let aggregated = AssertUnwindSafe(self.aggregator.aggregate(&user))
            .catch_unwind()
            .await;
        let streak = match aggregated {
            Ok(Ok(days)) => self.count_back(epoch, &days, today, &progress),
            Ok(Err(e)) => {
                error!("Streak calculation failed: {}", e);
                0
            }
            Err(_) => {
                error!("Streak calculation panicked");
                0
            }
        };
        self.deliver(epoch, StreakState::Ready(streak), &progress);
        info!("Final streak: {} days (epoch {})", streak, epoch);

        if self.is_current(epoch) {
            CalculationOutcome::Completed(streak)
        } else {
            info!("Streak calculation superseded (epoch {})", epoch);
            CalculationOutcome::Superseded(epoch)
        }
    }

    fn count_back(
        &self,
        epoch: CalculationEpoch,
        days: &DaySet,
        today: DayKey,
        progress: &ProgressSink,
    ) -> StreakResult {
        let mut walk = StreakWalk::new(days, today);
        for count in walk.by_ref() {
            self.deliver(epoch, StreakState::Ready(count), progress);
        }
        if let Some(day) = walk.broken_at() {
            info!("Streak broken at {}", day);
        }
        walk.counted()
    }
}
