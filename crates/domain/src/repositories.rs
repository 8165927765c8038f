//! 领域仓储抽象
//!
//! 候选人数据来自外部图数据库，这里只定义查询能力

use async_trait::async_trait;
use teamform_errors::TeamFormationResult;

use crate::entities::Candidate;

/// 候选人仓储抽象
#[async_trait]
pub trait CandidateRepository: Send + Sync {
    /// 返回至少具备一项给定技能的候选人；技能已规范化。
    /// 数据源不可用时返回 `RepositoryUnavailable`
    async fn lookup_candidates(&self, skills: &[String]) -> TeamFormationResult<Vec<Candidate>>;

    /// 数据源中出现过的技能，去重后按字母序返回前 `limit` 项
    async fn list_skills(&self, limit: usize) -> TeamFormationResult<Vec<String>>;

    /// 姓名或任一技能包含 `query`（不区分大小写）的候选人，按 id 升序返回前 `limit` 名
    async fn search_candidates(
        &self,
        query: &str,
        limit: usize,
    ) -> TeamFormationResult<Vec<Candidate>>;

    fn name(&self) -> &str;
}
