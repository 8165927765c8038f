use thiserror::Error;

#[derive(Debug, Error)]
pub enum TeamFormationError {
    #[error("无效的请求: {0}")]
    InvalidRequest(String),
    #[error("未找到匹配关键词的候选人: {}", .keywords.join(", "))]
    NoCandidates { keywords: Vec<String> },
    #[error("候选人仓储不可用: {0}")]
    RepositoryUnavailable(String),
    #[error("操作超时: {0}")]
    Timeout(String),
    #[error("任务未找到: {id}")]
    TaskNotFound { id: String },
    #[error("任务运行超过上限 {limit_seconds} 秒")]
    TaskTimeout { limit_seconds: u64 },
    #[error("任务已取消")]
    Cancelled,
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

pub type TeamFormationResult<T> = Result<T, TeamFormationError>;

impl TeamFormationError {
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRequest(msg.into())
    }
    pub fn no_candidates(keywords: &[String]) -> Self {
        Self::NoCandidates {
            keywords: keywords.to_vec(),
        }
    }
    pub fn repository_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::RepositoryUnavailable(msg.into())
    }
    pub fn timeout_error<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }
    pub fn task_not_found<S: Into<String>>(id: S) -> Self {
        Self::TaskNotFound { id: id.into() }
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TeamFormationError::Internal(_) | TeamFormationError::Configuration(_)
        )
    }
    /// 调用方可以原样重试的错误；服务内部从不自动重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TeamFormationError::RepositoryUnavailable(_) | TeamFormationError::Timeout(_)
        )
    }
    /// 稳定的错误类别标识，写入任务的 error 字段和 API 响应
    pub fn kind(&self) -> &'static str {
        match self {
            TeamFormationError::InvalidRequest(_) => "INVALID_REQUEST",
            TeamFormationError::NoCandidates { .. } => "NO_CANDIDATES",
            TeamFormationError::RepositoryUnavailable(_) => "REPOSITORY_UNAVAILABLE",
            TeamFormationError::Timeout(_) => "REPOSITORY_TIMEOUT",
            TeamFormationError::TaskNotFound { .. } => "TASK_NOT_FOUND",
            TeamFormationError::TaskTimeout { .. } => "TASK_TIMEOUT",
            TeamFormationError::Cancelled => "CANCELLED",
            TeamFormationError::Configuration(_) => "CONFIGURATION_ERROR",
            TeamFormationError::Serialization(_) => "SERIALIZATION_ERROR",
            TeamFormationError::Internal(_) => "INTERNAL_ERROR",
        }
    }
    pub fn user_message(&self) -> &str {
        match self {
            TeamFormationError::InvalidRequest(_) => "请求参数有误",
            TeamFormationError::NoCandidates { .. } => "没有找到具备所需技能的人员",
            TeamFormationError::RepositoryUnavailable(_) => "候选人数据源暂时不可用，请稍后重试",
            TeamFormationError::Timeout(_) => "候选人查询超时，请稍后重试",
            TeamFormationError::TaskNotFound { .. } => "请求的任务不存在或已过期",
            TeamFormationError::TaskTimeout { .. } => "团队组建耗时过长，已被终止",
            TeamFormationError::Cancelled => "任务已被取消",
            _ => "系统繁忙，请稍后重试",
        }
    }
    /// 面向调用方的调整建议
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            TeamFormationError::InvalidRequest(_) => vec![
                "至少提供一个关键词",
                "团队规模和团队数量必须为正整数",
            ],
            TeamFormationError::NoCandidates { .. } => vec![
                "尝试使用更宽泛或更常见的关键词",
                "检查关键词拼写",
            ],
            TeamFormationError::RepositoryUnavailable(_) | TeamFormationError::Timeout(_) => {
                vec!["稍后使用相同参数重新提交"]
            }
            TeamFormationError::TaskTimeout { .. } => vec![
                "减少关键词数量或团队数量",
                "选择更简单的算法，例如 ACET",
            ],
            TeamFormationError::TaskNotFound { .. } => vec!["任务结果仅保留有限时间，请重新提交"],
            _ => vec![],
        }
    }
}

impl From<serde_json::Error> for TeamFormationError {
    fn from(err: serde_json::Error) -> Self {
        TeamFormationError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for TeamFormationError {
    fn from(err: anyhow::Error) -> Self {
        TeamFormationError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests;
