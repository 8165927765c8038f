//! 候选池目录：技能关键词与候选人搜索

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use teamform_domain::Candidate;

use crate::{
    error::{ApiError, ApiResult},
    response::success,
    routes::AppState,
};

const DEFAULT_KEYWORD_LIMIT: usize = 100;
const MAX_KEYWORD_LIMIT: usize = 1000;
const DEFAULT_SEARCH_LIMIT: usize = 10;
const MAX_SEARCH_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct KeywordQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordList {
    pub keywords: Vec<String>,
    pub count: usize,
}

/// 搜索结果中的候选人，不含合作关系
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: u64,
    pub name: String,
    pub skills: Vec<String>,
    pub paper_count: u32,
    pub citation_count: u64,
    pub organizations: Vec<String>,
}

impl From<Candidate> for CandidateSummary {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name,
            skills: candidate.skills.into_iter().collect(),
            paper_count: candidate.paper_count,
            citation_count: candidate.citation_count,
            organizations: candidate.organizations.into_iter().collect(),
        }
    }
}

fn clamp_limit(limit: Option<usize>, default: usize, max: usize) -> usize {
    limit.unwrap_or(default).clamp(1, max)
}

/// 候选池中的技能关键词，按字母序
pub async fn list_keywords(
    State(state): State<AppState>,
    query: Result<Query<KeywordQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let limit = clamp_limit(query.limit, DEFAULT_KEYWORD_LIMIT, MAX_KEYWORD_LIMIT);
    let keywords = state.orchestrator.keywords(limit).await?;
    Ok(success(KeywordList {
        count: keywords.len(),
        keywords,
    }))
}

/// 按姓名或技能搜索候选人
pub async fn search_candidates(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let limit = clamp_limit(query.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
    let found: Vec<CandidateSummary> = state
        .orchestrator
        .search_candidates(&query.q, limit)
        .await?
        .into_iter()
        .map(CandidateSummary::from)
        .collect();
    Ok(success(found))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None, 10, 100), 10);
        assert_eq!(clamp_limit(Some(0), 10, 100), 1);
        assert_eq!(clamp_limit(Some(5000), 10, 100), 100);
    }
}
