//! Mock implementations of the candidate repository

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use teamform_domain::{Candidate, CandidateRepository};
use teamform_errors::{TeamFormationError, TeamFormationResult};

/// 可配置失败与延迟的候选人仓储
#[derive(Debug, Clone)]
pub struct MockCandidateRepository {
    candidates: Arc<Vec<Candidate>>,
    delay: Option<Duration>,
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl MockCandidateRepository {
    pub fn new() -> Self {
        Self::with_candidates(Vec::new())
    }

    pub fn with_candidates(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates: Arc::new(candidates),
            delay: None,
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 每次查询前等待指定时长
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 所有查询都返回 `RepositoryUnavailable`
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// `lookup_candidates` 的调用次数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> TeamFormationResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(message) => Err(TeamFormationError::repository_unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MockCandidateRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CandidateRepository for MockCandidateRepository {
    async fn lookup_candidates(&self, skills: &[String]) -> TeamFormationResult<Vec<Candidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;

        Ok(self
            .candidates
            .iter()
            .filter(|c| skills.iter().any(|s| c.has_skill(s)))
            .cloned()
            .collect())
    }

    async fn list_skills(&self, limit: usize) -> TeamFormationResult<Vec<String>> {
        self.respond().await?;

        let skills: BTreeSet<String> = self
            .candidates
            .iter()
            .flat_map(|c| c.skills.iter().cloned())
            .collect();
        Ok(skills.into_iter().take(limit).collect())
    }

    async fn search_candidates(
        &self,
        query: &str,
        limit: usize,
    ) -> TeamFormationResult<Vec<Candidate>> {
        self.respond().await?;

        let needle = query.to_lowercase();
        let mut found: Vec<Candidate> = self
            .candidates
            .iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&needle)
                    || c.skills.iter().any(|s| s.contains(&needle))
            })
            .cloned()
            .collect();
        found.sort_by_key(|c| c.id);
        found.truncate(limit);
        Ok(found)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::CandidatePools;

    #[tokio::test]
    async fn test_mock_filters_by_skill() {
        let repo = MockCandidateRepository::with_candidates(CandidatePools::partial_coverage());
        let found = repo.lookup_candidates(&["ml".to_string()]).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(repo.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_search_and_skills() {
        let repo = MockCandidateRepository::with_candidates(CandidatePools::partial_coverage());
        let found = repo.search_candidates("bob", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 2);
        assert_eq!(repo.list_skills(10).await.unwrap(), vec!["ml", "nlp"]);
        assert_eq!(repo.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let repo = MockCandidateRepository::new().failing("graph offline");
        let result = repo.lookup_candidates(&["ml".to_string()]).await;
        assert!(matches!(
            result,
            Err(TeamFormationError::RepositoryUnavailable(_))
        ));
    }
}
