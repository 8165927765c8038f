use serde::{Deserialize, Serialize};
use teamform_domain::RequestLimits;

use crate::validation::{ConfigValidator, ValidationUtils};
use crate::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// 并发执行任务的 worker 数量
    pub worker_count: usize,
    /// 等待队列容量，满时任务保持 queued 状态等待入队
    pub queue_capacity: usize,
    /// 终态任务保留时长
    pub retention_seconds: u64,
    pub cleanup_interval_seconds: u64,
    /// 单个任务的最长运行时间
    pub max_runtime_seconds: u64,
    /// 定时进度上报间隔
    pub progress_interval_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            queue_capacity: 256,
            retention_seconds: 3600,
            cleanup_interval_seconds: 60,
            max_runtime_seconds: 900,
            progress_interval_ms: 500,
        }
    }
}

impl ConfigValidator for OrchestratorConfig {
    fn validate(&self) -> ConfigResult<()> {
        ValidationUtils::validate_count(self.worker_count, "orchestrator.worker_count")?;
        ValidationUtils::validate_count(self.queue_capacity, "orchestrator.queue_capacity")?;
        ValidationUtils::validate_timeout_seconds(
            self.retention_seconds,
            "orchestrator.retention_seconds",
        )?;
        ValidationUtils::validate_timeout_seconds(
            self.cleanup_interval_seconds,
            "orchestrator.cleanup_interval_seconds",
        )?;
        ValidationUtils::validate_timeout_seconds(
            self.max_runtime_seconds,
            "orchestrator.max_runtime_seconds",
        )?;
        if self.progress_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "orchestrator.progress_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RepositoryConfig {
    /// 候选人查询超时
    pub lookup_timeout_seconds: u64,
    /// JSON 候选人数据文件；为空时使用空的内存仓储
    pub data_path: Option<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_seconds: 30,
            data_path: None,
        }
    }
}

impl ConfigValidator for RepositoryConfig {
    fn validate(&self) -> ConfigResult<()> {
        ValidationUtils::validate_timeout_seconds(
            self.lookup_timeout_seconds,
            "repository.lookup_timeout_seconds",
        )?;
        if let Some(path) = &self.data_path {
            ValidationUtils::validate_not_empty(path, "repository.data_path")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_keywords: usize,
    pub max_team_size: usize,
    pub max_teams: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = RequestLimits::default();
        Self {
            max_keywords: limits.max_keywords,
            max_team_size: limits.max_team_size,
            max_teams: limits.max_teams,
        }
    }
}

impl LimitsConfig {
    pub fn request_limits(&self) -> RequestLimits {
        RequestLimits {
            max_keywords: self.max_keywords,
            max_team_size: self.max_team_size,
            max_teams: self.max_teams,
        }
    }
}

impl ConfigValidator for LimitsConfig {
    fn validate(&self) -> ConfigResult<()> {
        ValidationUtils::validate_count(self.max_keywords, "limits.max_keywords")?;
        ValidationUtils::validate_count(self.max_team_size, "limits.max_team_size")?;
        ValidationUtils::validate_count(self.max_teams, "limits.max_teams")?;
        Ok(())
    }
}
