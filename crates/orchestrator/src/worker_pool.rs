use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::runner::TaskRunner;

/// 固定数量的 worker，共享同一个任务队列
pub struct WorkerPool {
    shutdown_tx: broadcast::Sender<()>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn start(
        worker_count: usize,
        queue: Arc<Mutex<mpsc::Receiver<String>>>,
        runner: Arc<TaskRunner>,
    ) -> Self {
        let worker_count = worker_count.max(1);
        let (shutdown_tx, _) = broadcast::channel(1);

        let handles = (0..worker_count)
            .map(|worker_index| {
                let queue = Arc::clone(&queue);
                let runner = Arc::clone(&runner);
                let shutdown_rx = shutdown_tx.subscribe();
                tokio::spawn(Self::worker_loop(worker_index, queue, runner, shutdown_rx))
            })
            .collect();

        info!("启动了 {} 个任务 worker", worker_count);
        Self {
            shutdown_tx,
            handles,
        }
    }

    async fn worker_loop(
        worker_index: usize,
        queue: Arc<Mutex<mpsc::Receiver<String>>>,
        runner: Arc<TaskRunner>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        loop {
            let next = tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("worker {} 收到关闭信号", worker_index);
                    break;
                }
                next = async { queue.lock().await.recv().await } => next,
            };

            match next {
                Some(task_id) => {
                    debug!("worker {} 取得任务 {}", worker_index, task_id);
                    runner.run(&task_id).await;
                }
                None => {
                    debug!("任务队列已关闭，worker {} 退出", worker_index);
                    break;
                }
            }
        }
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// 通知所有 worker 停止并等待它们退出；正在执行的任务会先跑完
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!("等待 worker 退出时出错: {}", e);
            }
        }
        info!("所有任务 worker 已停止");
    }
}
