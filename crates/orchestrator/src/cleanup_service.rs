use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::task_store::TaskStore;

/// 一次清理的统计
#[derive(Debug, Clone, Default)]
pub struct CleanupStats {
    pub evicted: usize,
    pub remaining: usize,
    pub duration: Duration,
}

/// 定期清理超过保留期的终态任务
pub struct CleanupService {
    store: Arc<TaskStore>,
    cleanup_interval: Duration,
    shutdown_tx: Option<oneshot::Sender<()>>,
    cleanup_handle: Option<JoinHandle<()>>,
}

impl CleanupService {
    pub fn new(store: Arc<TaskStore>, cleanup_interval: Duration) -> Self {
        Self {
            store,
            cleanup_interval,
            shutdown_tx: None,
            cleanup_handle: None,
        }
    }

    pub fn start(&mut self) {
        if self.cleanup_handle.is_some() {
            return;
        }
        info!("启动任务清理服务，间隔 {:?}", self.cleanup_interval);

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let store = Arc::clone(&self.store);
        let period = self.cleanup_interval;
        let handle = tokio::spawn(async move {
            let mut cleanup_interval = interval(period);
            // 第一次 tick 立即返回
            cleanup_interval.tick().await;

            loop {
                tokio::select! {
                    _ = cleanup_interval.tick() => {
                        Self::perform_cleanup(&store);
                    }
                    _ = &mut shutdown_rx => {
                        debug!("收到清理服务关闭信号");
                        break;
                    }
                }
            }

            info!("任务清理服务已停止");
        });

        self.cleanup_handle = Some(handle);
    }

    pub async fn stop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }

        if let Some(handle) = self.cleanup_handle.take() {
            if let Err(e) = handle.await {
                warn!("等待清理服务停止时出错: {}", e);
            }
        }
    }

    fn perform_cleanup(store: &TaskStore) -> CleanupStats {
        let start_time = Instant::now();
        let evicted = store.evict_expired();
        let stats = CleanupStats {
            evicted,
            remaining: store.len(),
            duration: start_time.elapsed(),
        };

        if evicted > 0 {
            metrics::counter!("teamform_tasks_evicted_total").increment(evicted as u64);
            info!(
                "清理了 {} 个过期任务，剩余 {} 个 (耗时 {:?})",
                stats.evicted, stats.remaining, stats.duration
            );
        } else {
            debug!("没有需要清理的过期任务");
        }
        stats
    }
}
