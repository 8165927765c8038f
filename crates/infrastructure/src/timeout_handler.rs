//! Timeout handling for candidate lookups and other async operations

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use teamform_domain::{Candidate, CandidateRepository, TeamFormationError, TeamFormationResult};
use tokio::time::timeout;
use tracing::{error, instrument};

/// Default timeout values for different operation types
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Candidate repository lookups
    pub repository_timeout: Duration,
    /// Data loading at startup
    pub loading_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            repository_timeout: Duration::from_secs(30),
            loading_timeout: Duration::from_secs(120),
        }
    }
}

/// Timeout handler utility for async operations
#[derive(Debug, Clone)]
pub struct TimeoutHandler {
    config: TimeoutConfig,
}

impl TimeoutHandler {
    pub fn new(config: TimeoutConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::new(TimeoutConfig::default())
    }

    /// Execute candidate repository operation with timeout
    #[instrument(skip(self, operation))]
    pub async fn repository_operation<F, T>(
        &self,
        operation: F,
        operation_name: &str,
    ) -> TeamFormationResult<T>
    where
        F: Future<Output = TeamFormationResult<T>>,
    {
        self.execute_with_timeout(
            operation,
            self.config.repository_timeout,
            "候选人仓储",
            operation_name,
        )
        .await
    }

    /// Execute data loading operation with timeout
    #[instrument(skip(self, operation))]
    pub async fn loading_operation<F, T>(
        &self,
        operation: F,
        operation_name: &str,
    ) -> TeamFormationResult<T>
    where
        F: Future<Output = TeamFormationResult<T>>,
    {
        self.execute_with_timeout(
            operation,
            self.config.loading_timeout,
            "数据加载",
            operation_name,
        )
        .await
    }

    async fn execute_with_timeout<F, T>(
        &self,
        operation: F,
        timeout_duration: Duration,
        operation_type: &str,
        operation_name: &str,
    ) -> TeamFormationResult<T>
    where
        F: Future<Output = TeamFormationResult<T>>,
    {
        match timeout(timeout_duration, operation).await {
            Ok(result) => result,
            Err(_) => {
                let error_msg = format!(
                    "{operation_type}操作 '{operation_name}' 超时 (超时时间: {timeout_duration:?})"
                );
                error!("{}", error_msg);
                Err(TeamFormationError::timeout_error(error_msg))
            }
        }
    }
}

/// 为任意候选人仓储加上查询超时
pub struct TimeoutCandidateRepository {
    inner: Arc<dyn CandidateRepository>,
    handler: TimeoutHandler,
}

impl TimeoutCandidateRepository {
    pub fn new(inner: Arc<dyn CandidateRepository>, lookup_timeout: Duration) -> Self {
        Self {
            inner,
            handler: TimeoutHandler::new(TimeoutConfig {
                repository_timeout: lookup_timeout,
                ..TimeoutConfig::default()
            }),
        }
    }
}

#[async_trait]
impl CandidateRepository for TimeoutCandidateRepository {
    async fn lookup_candidates(&self, skills: &[String]) -> TeamFormationResult<Vec<Candidate>> {
        self.handler
            .repository_operation(self.inner.lookup_candidates(skills), "lookup_candidates")
            .await
    }

    async fn list_skills(&self, limit: usize) -> TeamFormationResult<Vec<String>> {
        self.handler
            .repository_operation(self.inner.list_skills(limit), "list_skills")
            .await
    }

    async fn search_candidates(
        &self,
        query: &str,
        limit: usize,
    ) -> TeamFormationResult<Vec<Candidate>> {
        self.handler
            .repository_operation(self.inner.search_candidates(query, limit), "search_candidates")
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
