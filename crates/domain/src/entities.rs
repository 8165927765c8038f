use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use teamform_errors::TeamFormationError;

use crate::value_objects::{normalize_skill, Algorithm};

/// 两名候选人之间的合作关系
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollaborationEdge {
    pub peer_id: u64,
    /// 合作强度，例如共同论文数
    pub weight: f64,
    /// 最近一次合作的年份
    #[serde(default)]
    pub last_year: Option<i32>,
}

/// 候选人快照，单次任务内不可变
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub id: u64,
    pub name: String,
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub paper_count: u32,
    #[serde(default)]
    pub organizations: BTreeSet<String>,
    #[serde(default)]
    pub citation_count: u64,
    #[serde(default)]
    pub collaborations: Vec<CollaborationEdge>,
    /// 最近一篇论文或合作的年份
    #[serde(default)]
    pub last_active_year: Option<i32>,
    /// 候选人对各技能的亲和度，未列出的技能默认为 1.0
    #[serde(default)]
    pub skill_affinity: BTreeMap<String, f64>,
}

impl Candidate {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            skills: BTreeSet::new(),
            paper_count: 0,
            organizations: BTreeSet::new(),
            citation_count: 0,
            collaborations: Vec::new(),
            last_active_year: None,
            skill_affinity: BTreeMap::new(),
        }
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.contains(skill)
    }

    pub fn affinity(&self, skill: &str) -> f64 {
        self.skill_affinity.get(skill).copied().unwrap_or(1.0)
    }

    /// 与指定候选人的合作强度，没有合作关系时为 0
    pub fn edge_weight_to(&self, peer_id: u64) -> f64 {
        self.collaborations
            .iter()
            .filter(|edge| edge.peer_id == peer_id)
            .map(|edge| edge.weight)
            .sum()
    }

    pub fn shares_organization_with(&self, other: &Candidate) -> bool {
        !self.organizations.is_disjoint(&other.organizations)
    }

    /// 最近活跃年份：取 last_active_year 与合作记录中较新的一个
    pub fn most_recent_year(&self) -> Option<i32> {
        self.collaborations
            .iter()
            .filter_map(|edge| edge.last_year)
            .chain(self.last_active_year)
            .max()
    }

    /// 技能、组织与亲和度键统一规范化，仓储加载数据后调用
    pub fn normalized(mut self) -> Self {
        self.skills = self.skills.iter().map(|s| normalize_skill(s)).collect();
        self.skills.remove("");
        self.organizations = self
            .organizations
            .iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        self.skill_affinity = self
            .skill_affinity
            .iter()
            .map(|(skill, value)| (normalize_skill(skill), *value))
            .collect();
        self
    }
}

/// 团队成员：候选人信息加上其被选入时所满足的技能
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamMember {
    pub id: u64,
    pub name: String,
    pub added_for_skill: String,
    pub skills: Vec<String>,
    pub paper_count: u32,
    pub organizations: Vec<String>,
    pub citation_count: u64,
}

impl TeamMember {
    pub fn from_candidate(candidate: &Candidate, added_for_skill: impl Into<String>) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name.clone(),
            added_for_skill: added_for_skill.into(),
            skills: candidate.skills.iter().cloned().collect(),
            paper_count: candidate.paper_count,
            organizations: candidate.organizations.iter().cloned().collect(),
            citation_count: candidate.citation_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub team_number: usize,
    pub members: Vec<TeamMember>,
    pub completeness: f64,
    pub skills_covered: Vec<String>,
    pub requested_skills: Vec<String>,
    /// 组建该团队花费的时间（秒）
    #[serde(default)]
    pub formation_seconds: f64,
}

impl Team {
    /// 根据成员技能计算覆盖集合和完整度，覆盖集合按请求顺序排列
    pub fn new(team_number: usize, members: Vec<TeamMember>, requested_skills: &[String]) -> Self {
        let skills_covered: Vec<String> = requested_skills
            .iter()
            .filter(|skill| members.iter().any(|m| m.skills.contains(skill)))
            .cloned()
            .collect();
        let completeness = if requested_skills.is_empty() {
            0.0
        } else {
            skills_covered.len() as f64 / requested_skills.len() as f64
        };
        Self {
            team_number,
            members,
            completeness,
            skills_covered,
            requested_skills: requested_skills.to_vec(),
            formation_seconds: 0.0,
        }
    }

    pub fn with_formation_time(mut self, elapsed: Duration) -> Self {
        self.formation_seconds = elapsed.as_secs_f64();
        self
    }

    pub fn is_complete(&self) -> bool {
        self.skills_covered.len() == self.requested_skills.len()
    }

    pub fn missing_skills(&self) -> Vec<String> {
        self.requested_skills
            .iter()
            .filter(|skill| !self.skills_covered.contains(skill))
            .cloned()
            .collect()
    }
}

/// 非致命告警，随汇总一起返回
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SummaryWarning {
    InsufficientCoverage {
        team_number: usize,
        missing_skills: Vec<String>,
    },
    FewerTeamsThanRequested {
        requested: usize,
        formed: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub requested_skills: Vec<String>,
    pub algorithm: Algorithm,
    pub algorithm_name: String,
    pub total_teams: usize,
    pub complete_teams: usize,
    pub incomplete_teams: usize,
    pub total_members: usize,
    pub average_team_size: f64,
    pub average_completeness: f64,
    /// 完整团队数占请求团队数的百分比
    pub success_rate: f64,
    pub warnings: Vec<SummaryWarning>,
}

/// 一次团队组建的完整结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamFormationOutput {
    pub teams: Vec<Team>,
    pub summary: Summary,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

/// 写入失败任务的结构化错误
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskErrorDetail {
    pub kind: String,
    pub message: String,
    pub algorithm: Algorithm,
    pub keywords: Vec<String>,
    pub elapsed_seconds: f64,
    pub suggestions: Vec<String>,
}

impl TaskErrorDetail {
    pub fn from_error(
        error: &TeamFormationError,
        algorithm: Algorithm,
        keywords: &[String],
        elapsed_seconds: f64,
    ) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
            algorithm,
            keywords: keywords.to_vec(),
            elapsed_seconds,
            suggestions: error.suggestions().into_iter().map(String::from).collect(),
        }
    }
}

/// 轮询时返回的任务快照
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSnapshot {
    pub task_id: String,
    pub algorithm: Algorithm,
    pub keywords: Vec<String>,
    pub status: TaskStatus,
    pub progress: u8,
    pub elapsed_seconds: f64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TeamFormationOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskErrorDetail>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: u64, skills: &[&str]) -> Candidate {
        let mut c = Candidate::new(id, format!("person-{id}"));
        c.skills = skills.iter().map(|s| s.to_string()).collect();
        c
    }

    #[test]
    fn test_team_completeness_and_coverage() {
        let requested: Vec<String> = vec!["ml".into(), "nlp".into(), "optimization".into()];
        let members = vec![
            TeamMember::from_candidate(&candidate(1, &["ml", "vision"]), "ml"),
            TeamMember::from_candidate(&candidate(2, &["nlp"]), "nlp"),
        ];
        let team = Team::new(1, members, &requested);

        assert_eq!(team.skills_covered, vec!["ml".to_string(), "nlp".to_string()]);
        assert!((team.completeness - 2.0 / 3.0).abs() < 1e-9);
        assert!(!team.is_complete());
        assert_eq!(team.missing_skills(), vec!["optimization".to_string()]);
    }

    #[test]
    fn test_candidate_normalized() {
        let mut c = candidate(1, &["  Machine  Learning", "NLP", " "]);
        c.skill_affinity.insert("NLP ".to_string(), 2.0);
        let c = c.normalized();
        assert!(c.has_skill("machine learning"));
        assert!(c.has_skill("nlp"));
        assert_eq!(c.skills.len(), 2);
        assert_eq!(c.affinity("nlp"), 2.0);
        assert_eq!(c.affinity("machine learning"), 1.0);
    }

    #[test]
    fn test_most_recent_year_prefers_newest_signal() {
        let mut c = candidate(1, &["ml"]);
        c.last_active_year = Some(2019);
        c.collaborations.push(CollaborationEdge {
            peer_id: 2,
            weight: 1.0,
            last_year: Some(2022),
        });
        assert_eq!(c.most_recent_year(), Some(2022));
        assert_eq!(c.edge_weight_to(2), 1.0);
        assert_eq!(c.edge_weight_to(3), 0.0);
    }

    #[test]
    fn test_task_status_serialization() {
        assert_eq!(serde_json::to_string(&TaskStatus::Queued).unwrap(), "\"queued\"");
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }

    #[test]
    fn test_team_json_shape() {
        let requested: Vec<String> = vec!["ml".into()];
        let team = Team::new(
            1,
            vec![TeamMember::from_candidate(&candidate(7, &["ml"]), "ml")],
            &requested,
        )
        .with_formation_time(Duration::from_millis(1500));
        let value = serde_json::to_value(&team).unwrap();
        assert_eq!(value["team_number"], 1);
        assert_eq!(value["members"][0]["id"], 7);
        assert_eq!(value["members"][0]["added_for_skill"], "ml");
        assert_eq!(value["completeness"], 1.0);
        assert_eq!(value["skills_covered"][0], "ml");
        assert_eq!(value["formation_seconds"], 1.5);
    }
}
