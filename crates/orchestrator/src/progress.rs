use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use teamform_domain::{TeamFormationError, TeamFormationResult};
use teamform_matching::BuildControl;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::task_store::{TaskStore, MAX_RUNNING_PROGRESS};

/// 查询候选人阶段
pub const LOOKUP_PROGRESS: u8 = 5;
/// 候选人查询完成，开始组建
pub const BUILD_START_PROGRESS: u8 = 10;
const BUILD_SPAN: f64 = 85.0;

/// 把组建完成比例映射为 10..=95 的整体进度
pub fn building_progress(fraction: f64) -> u8 {
    let progress = BUILD_START_PROGRESS as f64 + BUILD_SPAN * fraction.clamp(0.0, 1.0);
    (progress.floor() as u8).min(MAX_RUNNING_PROGRESS)
}

/// 运行在阻塞线程上的构建检查点：发布进度并响应取消
pub struct ProgressTracker {
    task_id: String,
    store: Arc<TaskStore>,
    cancel_token: CancellationToken,
    latest: AtomicU8,
}

impl ProgressTracker {
    pub fn new(task_id: String, store: Arc<TaskStore>, cancel_token: CancellationToken) -> Self {
        Self {
            task_id,
            store,
            cancel_token,
            latest: AtomicU8::new(BUILD_START_PROGRESS),
        }
    }

    pub fn current(&self) -> u8 {
        self.latest.load(Ordering::SeqCst)
    }
}

impl BuildControl for ProgressTracker {
    fn checkpoint(&self, completed_fraction: f64) -> TeamFormationResult<()> {
        self.ensure_active()?;
        let progress = building_progress(completed_fraction);
        let previous = self.latest.fetch_max(progress, Ordering::SeqCst);
        if progress > previous {
            self.store.publish_progress(
                &self.task_id,
                progress,
                Some(format!("正在组建团队 ({progress}%)")),
            );
        }
        Ok(())
    }

    fn ensure_active(&self) -> TeamFormationResult<()> {
        if self.cancel_token.is_cancelled() {
            return Err(TeamFormationError::Cancelled);
        }
        Ok(())
    }
}

/// 按固定间隔刷新运行中任务的状态消息，直到 `stop` 被取消
pub fn spawn_ticker(
    store: Arc<TaskStore>,
    tracker: Arc<ProgressTracker>,
    period: Duration,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {
                    let elapsed = store.elapsed_seconds(&tracker.task_id);
                    let progress = tracker.current();
                    store.publish_progress(
                        &tracker.task_id,
                        progress,
                        Some(format!("正在组建团队 ({progress}%)，已运行 {elapsed:.0} 秒")),
                    );
                }
            }
        }
    })
}
