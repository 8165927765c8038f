//! 客户端轮询：按退避间隔查询任务状态直到终态或达到轮询上限

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use teamform_domain::{TaskSnapshot, TeamFormationResult};
use tracing::{debug, warn};

use crate::orchestrator::TaskOrchestrator;

/// 任务状态的来源：进程内的编排器，或远程 HTTP 服务
#[async_trait]
pub trait TaskStatusSource: Send + Sync {
    async fn fetch_status(&self, task_id: &str) -> TeamFormationResult<TaskSnapshot>;
}

#[async_trait]
impl TaskStatusSource for TaskOrchestrator {
    async fn fetch_status(&self, task_id: &str) -> TeamFormationResult<TaskSnapshot> {
        self.get_status(task_id)
    }
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    pub max_polls: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(5),
            multiplier: 1.5,
            max_polls: 600,
        }
    }
}

impl PollerConfig {
    fn next_interval(&self, current: Duration) -> Duration {
        current.mul_f64(self.multiplier.max(1.0)).min(self.max_interval)
    }
}

#[derive(Debug, Clone)]
pub enum PollOutcome {
    Terminal(TaskSnapshot),
    /// 达到轮询上限时任务仍未结束
    Exhausted {
        polls: usize,
        last: Option<TaskSnapshot>,
    },
}

impl PollOutcome {
    pub fn snapshot(&self) -> Option<&TaskSnapshot> {
        match self {
            PollOutcome::Terminal(snapshot) => Some(snapshot),
            PollOutcome::Exhausted { last, .. } => last.as_ref(),
        }
    }
}

enum PollState {
    Polling {
        polls: usize,
        interval: Duration,
        last: Option<TaskSnapshot>,
    },
    Done(PollOutcome),
}

pub struct TaskPoller {
    source: Arc<dyn TaskStatusSource>,
    config: PollerConfig,
}

impl TaskPoller {
    pub fn new(source: Arc<dyn TaskStatusSource>, config: PollerConfig) -> Self {
        Self { source, config }
    }

    /// 轮询直到任务进入终态；任务不存在或不可重试的错误直接返回
    pub async fn wait<F>(&self, task_id: &str, mut on_update: F) -> TeamFormationResult<PollOutcome>
    where
        F: FnMut(&TaskSnapshot) + Send,
    {
        let mut state = PollState::Polling {
            polls: 0,
            interval: self.config.initial_interval,
            last: None,
        };

        loop {
            state = match state {
                PollState::Done(outcome) => return Ok(outcome),
                PollState::Polling { polls, last, .. } if polls >= self.config.max_polls => {
                    warn!("任务 {} 轮询 {} 次后仍未结束", task_id, polls);
                    PollState::Done(PollOutcome::Exhausted { polls, last })
                }
                PollState::Polling {
                    polls,
                    interval,
                    last,
                } => {
                    let fetched = self.source.fetch_status(task_id).await;
                    self.transition(task_id, polls + 1, interval, last, fetched, &mut on_update)
                        .await?
                }
            };
        }
    }

    async fn transition<F>(
        &self,
        task_id: &str,
        polls: usize,
        interval: Duration,
        last: Option<TaskSnapshot>,
        fetched: TeamFormationResult<TaskSnapshot>,
        on_update: &mut F,
    ) -> TeamFormationResult<PollState>
    where
        F: FnMut(&TaskSnapshot) + Send,
    {
        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_retryable() => {
                debug!("查询任务 {} 状态失败，稍后重试: {}", task_id, e);
                tokio::time::sleep(interval).await;
                return Ok(PollState::Polling {
                    polls,
                    interval: self.config.next_interval(interval),
                    last,
                });
            }
            Err(e) => return Err(e),
        };

        on_update(&snapshot);
        if snapshot.status.is_terminal() {
            return Ok(PollState::Done(PollOutcome::Terminal(snapshot)));
        }

        // 进度有变化时回到初始间隔
        let progressed = last
            .as_ref()
            .is_none_or(|previous| previous.progress != snapshot.progress);
        let next = if progressed {
            self.config.initial_interval
        } else {
            self.config.next_interval(interval)
        };
        tokio::time::sleep(next).await;

        Ok(PollState::Polling {
            polls,
            interval: next,
            last: Some(snapshot),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use teamform_domain::{Algorithm, TaskStatus, TeamFormationError};

    struct ScriptedSource {
        responses: Mutex<VecDeque<TeamFormationResult<TaskSnapshot>>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<TeamFormationResult<TaskSnapshot>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl TaskStatusSource for ScriptedSource {
        async fn fetch_status(&self, task_id: &str) -> TeamFormationResult<TaskSnapshot> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TeamFormationError::task_not_found(task_id)))
        }
    }

    fn snapshot(status: TaskStatus, progress: u8) -> TaskSnapshot {
        TaskSnapshot {
            task_id: "t-1".to_string(),
            algorithm: Algorithm::Acet,
            keywords: vec!["ml".to_string()],
            status,
            progress,
            elapsed_seconds: 0.0,
            message: String::new(),
            result: None,
            error: None,
            created_at: chrono::Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    fn fast_config(max_polls: usize) -> PollerConfig {
        PollerConfig {
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(4),
            multiplier: 2.0,
            max_polls,
        }
    }

    #[test]
    fn test_backoff_is_bounded() {
        let config = fast_config(10);
        let mut interval = config.initial_interval;
        for _ in 0..10 {
            interval = config.next_interval(interval);
        }
        assert_eq!(interval, config.max_interval);
    }

    #[tokio::test]
    async fn test_poller_reaches_terminal_state() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(snapshot(TaskStatus::Queued, 0)),
            Err(TeamFormationError::timeout_error("slow")),
            Ok(snapshot(TaskStatus::Running, 40)),
            Ok(snapshot(TaskStatus::Completed, 100)),
        ]));
        let poller = TaskPoller::new(source, fast_config(10));

        let mut seen = Vec::new();
        let outcome = poller
            .wait("t-1", |s| seen.push(s.progress))
            .await
            .unwrap();

        assert!(matches!(outcome, PollOutcome::Terminal(ref s) if s.status == TaskStatus::Completed));
        assert_eq!(seen, vec![0, 40, 100]);
    }

    #[tokio::test]
    async fn test_poller_gives_up_after_max_polls() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(snapshot(TaskStatus::Running, 10)),
            Ok(snapshot(TaskStatus::Running, 10)),
            Ok(snapshot(TaskStatus::Running, 10)),
        ]));
        let poller = TaskPoller::new(source, fast_config(2));

        let outcome = poller.wait("t-1", |_| {}).await.unwrap();
        match outcome {
            PollOutcome::Exhausted { polls, last } => {
                assert_eq!(polls, 2);
                assert_eq!(last.unwrap().progress, 10);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_poller_surfaces_missing_task() {
        let source = Arc::new(ScriptedSource::new(vec![]));
        let poller = TaskPoller::new(source, fast_config(5));
        let result = poller.wait("gone", |_| {}).await;
        assert!(matches!(result, Err(TeamFormationError::TaskNotFound { .. })));
    }
}
