//! 任务编排器：接收请求、排队、分发给 worker，并提供状态查询与取消

use std::sync::Arc;
use std::time::Duration;

use teamform_config::AppConfig;
use teamform_domain::{
    Candidate, CandidateRepository, RequestLimits, TaskSnapshot, TeamFormationError, TeamFormationRequest,
    TeamFormationResult,
};
use teamform_matching::StrategySet;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::cleanup_service::CleanupService;
use crate::runner::TaskRunner;
use crate::task_store::TaskStore;
use crate::worker_pool::WorkerPool;

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub retention: Duration,
    pub cleanup_interval: Duration,
    pub max_runtime: Duration,
    pub progress_interval: Duration,
    pub limits: RequestLimits,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let orchestrator = &config.orchestrator;
        Self {
            worker_count: orchestrator.worker_count,
            queue_capacity: orchestrator.queue_capacity,
            retention: Duration::from_secs(orchestrator.retention_seconds),
            cleanup_interval: Duration::from_secs(orchestrator.cleanup_interval_seconds),
            max_runtime: Duration::from_secs(orchestrator.max_runtime_seconds),
            progress_interval: Duration::from_millis(orchestrator.progress_interval_ms),
            limits: config.request_limits(),
        }
    }
}

pub struct TaskOrchestrator {
    store: Arc<TaskStore>,
    queue_tx: mpsc::Sender<String>,
    limits: RequestLimits,
    repository: Arc<dyn CandidateRepository>,
    workers: Mutex<Option<WorkerPool>>,
    cleanup: Mutex<CleanupService>,
}

impl TaskOrchestrator {
    /// 创建编排器并启动 worker 池与清理服务；需要在 tokio 运行时内调用
    pub fn start(
        settings: OrchestratorSettings,
        repository: Arc<dyn CandidateRepository>,
        strategies: StrategySet,
    ) -> Arc<Self> {
        let store = Arc::new(TaskStore::new(settings.retention));
        let (queue_tx, queue_rx) = mpsc::channel(settings.queue_capacity.max(1));

        let runner = Arc::new(TaskRunner::new(
            Arc::clone(&store),
            Arc::clone(&repository),
            strategies,
            settings.max_runtime,
            settings.progress_interval,
        ));
        let workers = WorkerPool::start(
            settings.worker_count,
            Arc::new(Mutex::new(queue_rx)),
            runner,
        );

        let mut cleanup = CleanupService::new(Arc::clone(&store), settings.cleanup_interval);
        cleanup.start();

        info!(
            "任务编排器已启动 (worker: {}, 队列容量: {}, 保留期: {:?})",
            settings.worker_count, settings.queue_capacity, settings.retention
        );

        Arc::new(Self {
            store,
            queue_tx,
            limits: settings.limits,
            repository,
            workers: Mutex::new(Some(workers)),
            cleanup: Mutex::new(cleanup),
        })
    }

    /// 校验请求并创建任务；队列满时任务保持 queued，不阻塞调用方
    pub fn submit(&self, request: &TeamFormationRequest) -> TeamFormationResult<String> {
        let (algorithm, skill_request) = request.validate(&self.limits)?;
        let task_id = self.store.insert_queued(algorithm, skill_request);

        match self.queue_tx.try_send(task_id.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(id)) => {
                debug!("任务队列已满，任务 {} 等待入队", id);
                let queue_tx = self.queue_tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = queue_tx.send(id).await {
                        warn!("任务 {} 入队失败: 队列已关闭", e.0);
                    }
                });
            }
            Err(mpsc::error::TrySendError::Closed(id)) => {
                self.store.remove(&id);
                return Err(TeamFormationError::Internal(
                    "任务队列已关闭，无法接收新任务".to_string(),
                ));
            }
        }

        metrics::counter!("teamform_tasks_submitted_total", "algorithm" => algorithm.code())
            .increment(1);
        info!("已提交任务 {} (算法: {})", task_id, algorithm);
        Ok(task_id)
    }

    pub fn get_status(&self, task_id: &str) -> TeamFormationResult<TaskSnapshot> {
        self.store.get(task_id)
    }

    /// 取消任务，对终态任务是幂等的空操作
    pub fn cancel(&self, task_id: &str) -> TeamFormationResult<TaskSnapshot> {
        let snapshot = self.store.cancel(task_id)?;
        info!("已请求取消任务 {} (当前状态: {})", task_id, snapshot.status.as_str());
        Ok(snapshot)
    }

    pub fn list_tasks(&self) -> Vec<TaskSnapshot> {
        self.store.list()
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    /// 候选池中出现过的技能，按字母序
    pub async fn keywords(&self, limit: usize) -> TeamFormationResult<Vec<String>> {
        self.repository.list_skills(limit).await
    }

    /// 按姓名或技能搜索候选人
    pub async fn search_candidates(
        &self,
        query: &str,
        limit: usize,
    ) -> TeamFormationResult<Vec<Candidate>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(TeamFormationError::InvalidRequest(
                "搜索关键词不能为空".to_string(),
            ));
        }
        self.repository.search_candidates(query, limit).await
    }

    /// 仍在运行的 worker 数量，关闭后为 0
    pub async fn worker_count(&self) -> usize {
        self.workers
            .lock()
            .await
            .as_ref()
            .map_or(0, WorkerPool::worker_count)
    }

    /// 取消所有未结束的任务，停止 worker 与清理服务
    pub async fn shutdown(&self) {
        let cancelled = self.store.cancel_all();
        if cancelled > 0 {
            info!("关闭时取消了 {} 个未完成任务", cancelled);
        }

        if let Some(workers) = self.workers.lock().await.take() {
            workers.shutdown().await;
        }
        self.cleanup.lock().await.stop().await;
        info!("任务编排器已关闭");
    }
}
