use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use teamform_errors::{TeamFormationError, TeamFormationResult};

/// 七种团队组建算法
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Algorithm {
    #[serde(rename = "ACET")]
    Acet,
    #[serde(rename = "CAT")]
    Cat,
    #[serde(rename = "OAT")]
    Oat,
    #[serde(rename = "PRT")]
    Prt,
    #[serde(rename = "COT")]
    Cot,
    #[serde(rename = "TAT")]
    Tat,
    #[serde(rename = "CIT")]
    Cit,
}

impl Algorithm {
    pub const fn all() -> [Algorithm; 7] {
        [
            Algorithm::Acet,
            Algorithm::Cat,
            Algorithm::Oat,
            Algorithm::Prt,
            Algorithm::Cot,
            Algorithm::Tat,
            Algorithm::Cit,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Algorithm::Acet => "ACET",
            Algorithm::Cat => "CAT",
            Algorithm::Oat => "OAT",
            Algorithm::Prt => "PRT",
            Algorithm::Cot => "COT",
            Algorithm::Tat => "TAT",
            Algorithm::Cit => "CIT",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Algorithm::Acet => "All-Connections-Equal Team Formation",
            Algorithm::Cat => "Co-Authorship Team Formation",
            Algorithm::Oat => "Organizational Affiliation Team Formation",
            Algorithm::Prt => "Prioritized Relationship Team Formation",
            Algorithm::Cot => "Cohesion-Optimized Team Formation",
            Algorithm::Tat => "Time-Aware Team Formation",
            Algorithm::Cit => "Citation-Optimized Team Formation",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Algorithm::Acet => "Considers all types of connections equally",
            Algorithm::Cat => "Builds teams favouring co-authorship relations",
            Algorithm::Oat => "Builds teams favouring shared organizational affiliation",
            Algorithm::Prt => "Fills skills in caller priority order, co-authorship before organization",
            Algorithm::Cot => "Maximizes average pairwise collaboration strength inside each team",
            Algorithm::Tat => "Favours people with recent activity and collaborations",
            Algorithm::Cit => "Favours citation impact",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Algorithm {
    type Err = TeamFormationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Algorithm::all()
            .into_iter()
            .find(|algorithm| algorithm.code() == code)
            .ok_or_else(|| {
                TeamFormationError::invalid_request(format!(
                    "未知算法: {s}，可选值: ACET, CAT, OAT, PRT, COT, TAT, CIT"
                ))
            })
    }
}

/// 算法目录条目，对外展示用
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlgorithmInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl From<Algorithm> for AlgorithmInfo {
    fn from(algorithm: Algorithm) -> Self {
        Self {
            id: algorithm.code().to_string(),
            name: algorithm.name().to_string(),
            description: algorithm.description().to_string(),
        }
    }
}

/// 技能标签规范化：去掉首尾空白、合并内部空白、转小写
pub fn normalize_skill(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 请求上限，来自配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub max_keywords: usize,
    pub max_team_size: usize,
    pub max_teams: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_keywords: 20,
            max_team_size: 20,
            max_teams: 20,
        }
    }
}

/// 已校验的技能请求
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillRequest {
    /// 规范化、去重且保持原顺序的技能列表
    pub skills: Vec<String>,
    pub team_size: usize,
    pub num_teams: usize,
    /// 调用方指定的技能优先级（PRT 使用），已规范化且是 skills 的子集
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skill_priorities: Vec<String>,
}

impl SkillRequest {
    pub fn new(
        keywords: &[String],
        team_size: usize,
        num_teams: usize,
        skill_priorities: &[String],
        limits: &RequestLimits,
    ) -> TeamFormationResult<Self> {
        let mut skills: Vec<String> = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let skill = normalize_skill(keyword);
            if !skill.is_empty() && !skills.contains(&skill) {
                skills.push(skill);
            }
        }

        if skills.is_empty() {
            return Err(TeamFormationError::invalid_request(
                "至少需要一个非空关键词",
            ));
        }
        if skills.len() > limits.max_keywords {
            return Err(TeamFormationError::invalid_request(format!(
                "关键词数量 {} 超过上限 {}",
                skills.len(),
                limits.max_keywords
            )));
        }
        if team_size == 0 || team_size > limits.max_team_size {
            return Err(TeamFormationError::invalid_request(format!(
                "团队规模必须在 1 到 {} 之间，实际为 {team_size}",
                limits.max_team_size
            )));
        }
        if num_teams == 0 || num_teams > limits.max_teams {
            return Err(TeamFormationError::invalid_request(format!(
                "团队数量必须在 1 到 {} 之间，实际为 {num_teams}",
                limits.max_teams
            )));
        }

        let mut priorities: Vec<String> = Vec::new();
        for raw in skill_priorities {
            let skill = normalize_skill(raw);
            if skill.is_empty() || priorities.contains(&skill) {
                continue;
            }
            if !skills.contains(&skill) {
                return Err(TeamFormationError::invalid_request(format!(
                    "优先级中的技能 '{skill}' 不在关键词列表中"
                )));
            }
            priorities.push(skill);
        }

        Ok(Self {
            skills,
            team_size,
            num_teams,
            skill_priorities: priorities,
        })
    }

    /// 按优先级排列的技能：先是显式优先级，其余保持请求顺序
    pub fn prioritized_skills(&self) -> Vec<String> {
        let mut ordered = self.skill_priorities.clone();
        for skill in &self.skills {
            if !ordered.contains(skill) {
                ordered.push(skill.clone());
            }
        }
        ordered
    }
}

/// 提交接口的原始请求体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamFormationRequest {
    pub algorithm: String,
    pub keywords: Vec<String>,
    pub team_size: i64,
    pub num_teams: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skill_priorities: Vec<String>,
}

impl TeamFormationRequest {
    /// 校验并转换为算法与规范化后的技能请求
    pub fn validate(&self, limits: &RequestLimits) -> TeamFormationResult<(Algorithm, SkillRequest)> {
        let algorithm: Algorithm = self.algorithm.parse()?;
        let team_size = positive(self.team_size, "团队规模")?;
        let num_teams = positive(self.num_teams, "团队数量")?;
        let request = SkillRequest::new(
            &self.keywords,
            team_size,
            num_teams,
            &self.skill_priorities,
            limits,
        )?;
        Ok((algorithm, request))
    }
}

fn positive(value: i64, field: &str) -> TeamFormationResult<usize> {
    if value <= 0 {
        return Err(TeamFormationError::invalid_request(format!(
            "{field}必须为正整数，实际为 {value}"
        )));
    }
    usize::try_from(value)
        .map_err(|_| TeamFormationError::invalid_request(format!("{field}超出范围: {value}")))
}
