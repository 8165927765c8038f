use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Utc};
use teamform_domain::{
    Algorithm, CandidateRepository, SkillRequest, TaskErrorDetail, TaskStatus, TeamFormationError,
    TeamFormationOutput, TeamFormationResult,
};
use teamform_matching::{aggregate, StrategySet, TeamBuilder};
use tokio::time::{sleep_until, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::progress::{self, ProgressTracker, BUILD_START_PROGRESS, LOOKUP_PROGRESS};
use crate::task_store::TaskStore;

/// 执行单个任务：查询候选人、在阻塞线程上运行策略、写回结果
pub struct TaskRunner {
    store: Arc<TaskStore>,
    repository: Arc<dyn CandidateRepository>,
    strategies: StrategySet,
    max_runtime: Duration,
    progress_interval: Duration,
}

impl TaskRunner {
    pub fn new(
        store: Arc<TaskStore>,
        repository: Arc<dyn CandidateRepository>,
        strategies: StrategySet,
        max_runtime: Duration,
        progress_interval: Duration,
    ) -> Self {
        Self {
            store,
            repository,
            strategies,
            max_runtime,
            progress_interval,
        }
    }

    pub async fn run(&self, task_id: &str) -> Option<TaskStatus> {
        let Some(started) = self.store.start(task_id) else {
            debug!("任务 {} 已取消或不存在，跳过", task_id);
            return None;
        };
        let algorithm = started.algorithm;
        let request = started.request;
        let token = started.cancel_token;

        info!(
            "开始执行任务 {} (算法: {}, 关键词: {:?})",
            task_id, algorithm, request.skills
        );

        let deadline = Instant::now() + self.max_runtime;
        let outcome = self.execute(task_id, algorithm, &request, token, deadline).await;

        let status = match outcome {
            Ok(output) => {
                let status = self.store.complete(task_id, output);
                if status == TaskStatus::Completed {
                    info!("任务 {} 完成", task_id);
                }
                status
            }
            Err(TeamFormationError::Cancelled) => {
                self.store.mark_cancelled(task_id);
                info!("任务 {} 已取消", task_id);
                TaskStatus::Cancelled
            }
            Err(e @ TeamFormationError::TaskTimeout { .. }) => {
                error!("任务 {} 超过运行上限 {:?}", task_id, self.max_runtime);
                self.record_failure(task_id, algorithm, &request, &e);
                TaskStatus::Failed
            }
            Err(e) => {
                warn!("任务 {} 失败: {}", task_id, e);
                self.record_failure(task_id, algorithm, &request, &e);
                TaskStatus::Failed
            }
        };

        metrics::counter!(
            "teamform_tasks_finished_total",
            "algorithm" => algorithm.code(),
            "status" => status.as_str()
        )
        .increment(1);

        Some(status)
    }

    fn record_failure(
        &self,
        task_id: &str,
        algorithm: Algorithm,
        request: &SkillRequest,
        error: &TeamFormationError,
    ) {
        let elapsed = self.store.elapsed_seconds(task_id);
        let detail = TaskErrorDetail::from_error(error, algorithm, &request.skills, elapsed);
        self.store.fail(task_id, error, detail);
    }

    fn timeout_error(&self) -> TeamFormationError {
        TeamFormationError::TaskTimeout {
            limit_seconds: self.max_runtime.as_secs(),
        }
    }

    /// 查询与构建共用同一个截止时间
    async fn execute(
        &self,
        task_id: &str,
        algorithm: Algorithm,
        request: &SkillRequest,
        token: CancellationToken,
        deadline: Instant,
    ) -> TeamFormationResult<TeamFormationOutput> {
        self.store.publish_progress(
            task_id,
            LOOKUP_PROGRESS,
            Some("正在查询候选人".to_string()),
        );

        let candidates = tokio::select! {
            _ = token.cancelled() => return Err(TeamFormationError::Cancelled),
            _ = sleep_until(deadline) => return Err(self.timeout_error()),
            result = self.repository.lookup_candidates(&request.skills) => result?,
        };
        if candidates.is_empty() {
            return Err(TeamFormationError::no_candidates(&request.skills));
        }
        self.store.publish_progress(
            task_id,
            BUILD_START_PROGRESS,
            Some(format!("找到 {} 名候选人，开始组建团队", candidates.len())),
        );

        let tracker = Arc::new(ProgressTracker::new(
            task_id.to_string(),
            Arc::clone(&self.store),
            token.clone(),
        ));
        let ticker_stop = token.child_token();
        let _ticker_guard = ticker_stop.clone().drop_guard();
        progress::spawn_ticker(
            Arc::clone(&self.store),
            Arc::clone(&tracker),
            self.progress_interval,
            ticker_stop,
        );

        let policy = self.strategies.get(algorithm);
        let reference_year = Utc::now().year();
        let build_request = request.clone();
        let mut build = tokio::task::spawn_blocking(move || {
            TeamBuilder::new(policy.as_ref(), reference_year).build_teams(
                &candidates,
                &build_request,
                tracker.as_ref(),
            )
        });

        let joined = match timeout_at(deadline, &mut build).await {
            Ok(joined) => joined,
            Err(_) => {
                // 令构建在下一个检查点退出，等它结束后才记录失败
                token.cancel();
                if let Err(e) = build.await {
                    warn!("任务 {} 的策略线程退出异常: {}", task_id, e);
                }
                return Err(self.timeout_error());
            }
        };
        let teams = joined
            .map_err(|e| TeamFormationError::Internal(format!("策略执行线程异常: {e}")))??;

        let summary = aggregate(&teams, &request.skills, algorithm, request.num_teams);
        Ok(TeamFormationOutput { teams, summary })
    }
}
