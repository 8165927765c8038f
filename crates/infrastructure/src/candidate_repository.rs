//! 候选人仓储的参考实现
//!
//! 真实部署中候选人来自图数据库；这里提供内存与 JSON 文件两种数据源

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use teamform_domain::{Candidate, CandidateRepository, TeamFormationError, TeamFormationResult};
use tokio::sync::RwLock;
use tracing::{debug, info};

fn filter_by_skills(candidates: &[Candidate], skills: &[String]) -> Vec<Candidate> {
    candidates
        .iter()
        .filter(|c| skills.iter().any(|s| c.has_skill(s)))
        .cloned()
        .collect()
}

fn distinct_skills(candidates: &[Candidate], limit: usize) -> Vec<String> {
    let skills: BTreeSet<&String> = candidates.iter().flat_map(|c| c.skills.iter()).collect();
    skills.into_iter().take(limit).cloned().collect()
}

fn search(candidates: &[Candidate], query: &str, limit: usize) -> Vec<Candidate> {
    let needle = query.trim().to_lowercase();
    let mut found: Vec<Candidate> = candidates
        .iter()
        .filter(|c| {
            c.name.to_lowercase().contains(&needle)
                || c.skills.iter().any(|s| s.contains(&needle))
        })
        .cloned()
        .collect();
    found.sort_by_key(|c| c.id);
    found.truncate(limit);
    found
}

/// 内存候选人仓储
#[derive(Debug, Clone, Default)]
pub struct InMemoryCandidateRepository {
    candidates: Arc<RwLock<Vec<Candidate>>>,
}

impl InMemoryCandidateRepository {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        let candidates = candidates.into_iter().map(Candidate::normalized).collect();
        Self {
            candidates: Arc::new(RwLock::new(candidates)),
        }
    }

    pub async fn candidate_count(&self) -> usize {
        self.candidates.read().await.len()
    }
}

#[async_trait]
impl CandidateRepository for InMemoryCandidateRepository {
    async fn lookup_candidates(&self, skills: &[String]) -> TeamFormationResult<Vec<Candidate>> {
        let candidates = self.candidates.read().await;
        let found = filter_by_skills(&candidates, skills);
        debug!("内存仓储查询 {:?}，返回 {} 名候选人", skills, found.len());
        Ok(found)
    }

    async fn list_skills(&self, limit: usize) -> TeamFormationResult<Vec<String>> {
        Ok(distinct_skills(&self.candidates.read().await, limit))
    }

    async fn search_candidates(
        &self,
        query: &str,
        limit: usize,
    ) -> TeamFormationResult<Vec<Candidate>> {
        let found = search(&self.candidates.read().await, query, limit);
        debug!("内存仓储搜索 '{}'，返回 {} 名候选人", query, found.len());
        Ok(found)
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}

/// 启动时从 JSON 文件加载候选人数组
#[derive(Debug, Clone)]
pub struct JsonFileCandidateRepository {
    inner: InMemoryCandidateRepository,
    source: String,
}

impl JsonFileCandidateRepository {
    pub async fn load(path: impl AsRef<Path>) -> TeamFormationResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            TeamFormationError::repository_unavailable(format!(
                "无法读取候选人数据文件 {}: {e}",
                path.display()
            ))
        })?;
        let candidates: Vec<Candidate> = serde_json::from_str(&content)?;
        info!(
            "从 {} 加载了 {} 名候选人",
            path.display(),
            candidates.len()
        );

        Ok(Self {
            inner: InMemoryCandidateRepository::new(candidates),
            source: path.display().to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub async fn candidate_count(&self) -> usize {
        self.inner.candidate_count().await
    }
}

#[async_trait]
impl CandidateRepository for JsonFileCandidateRepository {
    async fn lookup_candidates(&self, skills: &[String]) -> TeamFormationResult<Vec<Candidate>> {
        self.inner.lookup_candidates(skills).await
    }

    async fn list_skills(&self, limit: usize) -> TeamFormationResult<Vec<String>> {
        self.inner.list_skills(limit).await
    }

    async fn search_candidates(
        &self,
        query: &str,
        limit: usize,
    ) -> TeamFormationResult<Vec<Candidate>> {
        self.inner.search_candidates(query, limit).await
    }

    fn name(&self) -> &str {
        "json_file"
    }
}
