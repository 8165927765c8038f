//! 任务状态存储
//!
//! 每个任务只有一个写者（执行它的 worker，外加取消操作），读者通过快照读取。
//! 终态任务在保留期后被清理，过期任务在读取时也视为不存在。

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use teamform_domain::{
    Algorithm, SkillRequest, TaskErrorDetail, TaskSnapshot, TaskStatus, TeamFormationError,
    TeamFormationOutput, TeamFormationResult,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// 非终态时进度的上限
pub const MAX_RUNNING_PROGRESS: u8 = 99;

struct TaskRecord {
    task_id: String,
    algorithm: Algorithm,
    request: SkillRequest,
    status: TaskStatus,
    progress: u8,
    message: String,
    result: Option<TeamFormationOutput>,
    error: Option<TaskErrorDetail>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    created: Instant,
    finished: Option<Instant>,
    cancel_token: CancellationToken,
}

impl TaskRecord {
    fn elapsed(&self) -> Duration {
        self.finished
            .unwrap_or_else(Instant::now)
            .saturating_duration_since(self.created)
    }

    fn is_expired(&self, retention: Duration) -> bool {
        self.status.is_terminal()
            && self
                .finished
                .is_some_and(|finished| finished.elapsed() >= retention)
    }

    fn finish(&mut self, status: TaskStatus, message: String) {
        self.status = status;
        self.message = message;
        self.finished_at = Some(Utc::now());
        self.finished = Some(Instant::now());
    }

    fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            task_id: self.task_id.clone(),
            algorithm: self.algorithm,
            keywords: self.request.skills.clone(),
            status: self.status,
            progress: self.progress,
            elapsed_seconds: self.elapsed().as_secs_f64(),
            message: self.message.clone(),
            result: self.result.clone(),
            error: self.error.clone(),
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// worker 开始执行任务时取得的信息
#[derive(Debug, Clone)]
pub struct StartedTask {
    pub algorithm: Algorithm,
    pub request: SkillRequest,
    pub cancel_token: CancellationToken,
}

pub struct TaskStore {
    tasks: RwLock<HashMap<String, TaskRecord>>,
    retention: Duration,
}

impl TaskStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            retention,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, TaskRecord>> {
        self.tasks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, TaskRecord>> {
        self.tasks.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// 创建 queued 状态的任务并返回任务ID
    pub fn insert_queued(&self, algorithm: Algorithm, request: SkillRequest) -> String {
        let task_id = Uuid::new_v4().to_string();
        let record = TaskRecord {
            task_id: task_id.clone(),
            algorithm,
            request,
            status: TaskStatus::Queued,
            progress: 0,
            message: "任务已排队，等待执行".to_string(),
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            created: Instant::now(),
            finished: None,
            cancel_token: CancellationToken::new(),
        };
        self.write().insert(task_id.clone(), record);
        task_id
    }

    pub fn remove(&self, task_id: &str) -> bool {
        self.write().remove(task_id).is_some()
    }

    pub fn get(&self, task_id: &str) -> TeamFormationResult<TaskSnapshot> {
        let tasks = self.read();
        match tasks.get(task_id) {
            Some(record) if !record.is_expired(self.retention) => Ok(record.snapshot()),
            _ => Err(TeamFormationError::task_not_found(task_id)),
        }
    }

    /// 所有未过期任务，按创建时间排序
    pub fn list(&self) -> Vec<TaskSnapshot> {
        let tasks = self.read();
        let mut snapshots: Vec<TaskSnapshot> = tasks
            .values()
            .filter(|record| !record.is_expired(self.retention))
            .map(TaskRecord::snapshot)
            .collect();
        snapshots.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        snapshots
    }

    pub fn elapsed_seconds(&self, task_id: &str) -> f64 {
        self.read()
            .get(task_id)
            .map(|record| record.elapsed().as_secs_f64())
            .unwrap_or_default()
    }

    /// queued -> running；任务不存在或不再是 queued 时返回 None
    pub fn start(&self, task_id: &str) -> Option<StartedTask> {
        let mut tasks = self.write();
        let record = tasks.get_mut(task_id)?;
        if record.status != TaskStatus::Queued {
            debug!("任务 {} 状态为 {}，跳过执行", task_id, record.status.as_str());
            return None;
        }
        record.status = TaskStatus::Running;
        record.started_at = Some(Utc::now());
        record.message = "任务开始执行".to_string();
        Some(StartedTask {
            algorithm: record.algorithm,
            request: record.request.clone(),
            cancel_token: record.cancel_token.clone(),
        })
    }

    /// 发布进度：只增不减、运行中不超过 99，终态任务忽略写入
    pub fn publish_progress(&self, task_id: &str, progress: u8, message: Option<String>) -> bool {
        let mut tasks = self.write();
        let Some(record) = tasks.get_mut(task_id) else {
            return false;
        };
        if record.status != TaskStatus::Running {
            return false;
        }
        record.progress = record.progress.max(progress.min(MAX_RUNNING_PROGRESS));
        if let Some(message) = message {
            record.message = message;
        }
        true
    }

    /// running -> completed；若已请求取消则改为 cancelled
    pub fn complete(&self, task_id: &str, output: TeamFormationOutput) -> TaskStatus {
        let mut tasks = self.write();
        let Some(record) = tasks.get_mut(task_id) else {
            return TaskStatus::Failed;
        };
        if record.status.is_terminal() {
            return record.status;
        }
        if record.cancel_token.is_cancelled() {
            record.finish(TaskStatus::Cancelled, "任务已取消".to_string());
            return TaskStatus::Cancelled;
        }
        let message = format!(
            "已组建 {} 个团队，其中 {} 个完整",
            output.summary.total_teams, output.summary.complete_teams
        );
        record.progress = 100;
        record.result = Some(output);
        record.finish(TaskStatus::Completed, message);
        TaskStatus::Completed
    }

    pub fn fail(&self, task_id: &str, error: &TeamFormationError, detail: TaskErrorDetail) -> bool {
        let mut tasks = self.write();
        match tasks.get_mut(task_id) {
            Some(record) if !record.status.is_terminal() => {
                record.error = Some(detail);
                record.finish(TaskStatus::Failed, error.user_message().to_string());
                true
            }
            _ => false,
        }
    }

    pub fn mark_cancelled(&self, task_id: &str) -> bool {
        let mut tasks = self.write();
        match tasks.get_mut(task_id) {
            Some(record) if !record.status.is_terminal() => {
                record.cancel_token.cancel();
                record.finish(TaskStatus::Cancelled, "任务已取消".to_string());
                true
            }
            _ => false,
        }
    }

    /// 取消任务：queued 直接进入 cancelled，running 只设置取消令牌，终态不做任何事
    pub fn cancel(&self, task_id: &str) -> TeamFormationResult<TaskSnapshot> {
        let mut tasks = self.write();
        let record = match tasks.get_mut(task_id) {
            Some(record) if !record.is_expired(self.retention) => record,
            _ => return Err(TeamFormationError::task_not_found(task_id)),
        };
        match record.status {
            TaskStatus::Queued => {
                record.cancel_token.cancel();
                record.finish(TaskStatus::Cancelled, "任务已取消".to_string());
            }
            TaskStatus::Running => {
                record.cancel_token.cancel();
                record.message = "正在取消任务".to_string();
            }
            _ => {}
        }
        Ok(record.snapshot())
    }

    /// 取消所有未结束的任务：queued 直接结束，running 设置取消令牌
    pub fn cancel_all(&self) -> usize {
        let mut tasks = self.write();
        let mut count = 0;
        for record in tasks.values_mut().filter(|r| !r.status.is_terminal()) {
            record.cancel_token.cancel();
            if record.status == TaskStatus::Queued {
                record.finish(TaskStatus::Cancelled, "任务已取消".to_string());
            }
            count += 1;
        }
        count
    }

    /// 删除超过保留期的终态任务
    pub fn evict_expired(&self) -> usize {
        let mut tasks = self.write();
        let before = tasks.len();
        tasks.retain(|_, record| !record.is_expired(self.retention));
        before - tasks.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
