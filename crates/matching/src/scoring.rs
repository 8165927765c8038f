//! 候选人评分
//!
//! 纯函数：池统计与参考年份都由调用方传入，不读取时钟

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use teamform_config::StrategyOverride;
use teamform_domain::Candidate;

/// 各归一化评分项的权重
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub paper: f64,
    pub citation: f64,
    pub connectivity: f64,
    pub collaboration: f64,
    pub organization: f64,
    pub recency: f64,
}

impl ScoringWeights {
    /// 用配置覆盖默认权重，未设置的项保持不变
    pub fn with_override(self, overrides: &StrategyOverride) -> Self {
        Self {
            paper: overrides.paper.unwrap_or(self.paper),
            citation: overrides.citation.unwrap_or(self.citation),
            connectivity: overrides.connectivity.unwrap_or(self.connectivity),
            collaboration: overrides.collaboration.unwrap_or(self.collaboration),
            organization: overrides.organization.unwrap_or(self.organization),
            recency: overrides.recency.unwrap_or(self.recency),
        }
    }
}

/// 候选池的最大值统计，用于归一化
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoolStats {
    pub max_papers: u32,
    pub max_citations: u64,
    pub max_edges: usize,
    pub max_edge_weight: f64,
}

impl PoolStats {
    pub fn from_candidates(candidates: &[Candidate]) -> Self {
        candidates.iter().fold(Self::default(), |stats, c| Self {
            max_papers: stats.max_papers.max(c.paper_count),
            max_citations: stats.max_citations.max(c.citation_count),
            max_edges: stats.max_edges.max(c.collaborations.len()),
            max_edge_weight: c
                .collaborations
                .iter()
                .map(|edge| edge.weight)
                .fold(stats.max_edge_weight, f64::max),
        })
    }
}

/// 一次评分所需的上下文
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub stats: &'a PoolStats,
    pub weights: &'a ScoringWeights,
    /// 计算时间衰减所用的"当前"年份
    pub reference_year: i32,
    pub half_life_years: f64,
    /// 当前团队已选成员
    pub teammates: &'a [&'a Candidate],
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub matched_skill: Option<String>,
    pub quality: f64,
}

/// 两人之间的合作强度，取双方记录中的较大值
pub fn pair_weight(a: &Candidate, b: &Candidate) -> f64 {
    a.edge_weight_to(b.id).max(b.edge_weight_to(a.id))
}

fn ratio(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// 在给定技能中选出亲和度最高的一项，平手时取列表中靠前者
pub fn best_skill(candidate: &Candidate, skills: &[String]) -> Option<String> {
    let mut best: Option<(&String, f64)> = None;
    for skill in skills.iter().filter(|s| candidate.has_skill(s)) {
        let affinity = candidate.affinity(skill);
        match best {
            Some((_, current)) if affinity <= current => {}
            _ => best = Some((skill, affinity)),
        }
    }
    best.map(|(skill, _)| skill.clone())
}

pub fn paper_term(candidate: &Candidate, stats: &PoolStats) -> f64 {
    ratio(candidate.paper_count as f64, stats.max_papers as f64)
}

pub fn citation_term(candidate: &Candidate, stats: &PoolStats) -> f64 {
    ratio(candidate.citation_count as f64, stats.max_citations as f64)
}

pub fn connectivity_term(candidate: &Candidate, stats: &PoolStats) -> f64 {
    ratio(candidate.collaborations.len() as f64, stats.max_edges as f64)
}

pub fn collaboration_term(candidate: &Candidate, teammates: &[&Candidate], stats: &PoolStats) -> f64 {
    if teammates.is_empty() {
        return 0.0;
    }
    let total: f64 = teammates.iter().map(|mate| pair_weight(candidate, mate)).sum();
    ratio(total, teammates.len() as f64 * stats.max_edge_weight)
}

pub fn organization_term(candidate: &Candidate, teammates: &[&Candidate]) -> f64 {
    if teammates.is_empty() {
        return 0.0;
    }
    let shared = teammates
        .iter()
        .filter(|mate| candidate.shares_organization_with(mate))
        .count();
    shared as f64 / teammates.len() as f64
}

pub fn recency_term(candidate: &Candidate, reference_year: i32, half_life_years: f64) -> f64 {
    match candidate.most_recent_year() {
        Some(year) if half_life_years > 0.0 => {
            let years_since = (reference_year - year).max(0) as f64;
            0.5_f64.powf(years_since / half_life_years)
        }
        _ => 0.0,
    }
}

/// 加权质量分
pub fn quality(candidate: &Candidate, ctx: &ScoringContext<'_>) -> f64 {
    let w = ctx.weights;
    let mut total = 0.0;
    if w.paper > 0.0 {
        total += w.paper * paper_term(candidate, ctx.stats);
    }
    if w.citation > 0.0 {
        total += w.citation * citation_term(candidate, ctx.stats);
    }
    if w.connectivity > 0.0 {
        total += w.connectivity * connectivity_term(candidate, ctx.stats);
    }
    if w.collaboration > 0.0 {
        total += w.collaboration * collaboration_term(candidate, ctx.teammates, ctx.stats);
    }
    if w.organization > 0.0 {
        total += w.organization * organization_term(candidate, ctx.teammates);
    }
    if w.recency > 0.0 {
        total += w.recency * recency_term(candidate, ctx.reference_year, ctx.half_life_years);
    }
    total
}

/// 对候选人评分：只有具备 `requested \ covered` 中某项技能时才算匹配
pub fn score(
    candidate: &Candidate,
    covered: &BTreeSet<String>,
    requested: &[String],
    ctx: &ScoringContext<'_>,
) -> CandidateScore {
    let open: Vec<String> = requested
        .iter()
        .filter(|skill| !covered.contains(*skill))
        .cloned()
        .collect();
    CandidateScore {
        matched_skill: best_skill(candidate, &open),
        quality: quality(candidate, ctx),
    }
}

/// 候选人排序：质量分降序，引用数降序，id 升序
pub fn rank(a_quality: f64, a: &Candidate, b_quality: f64, b: &Candidate) -> Ordering {
    b_quality
        .total_cmp(&a_quality)
        .then_with(|| b.citation_count.cmp(&a.citation_count))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use teamform_domain::CollaborationEdge;

    fn candidate(id: u64, skills: &[&str]) -> Candidate {
        let mut c = Candidate::new(id, format!("c{id}"));
        c.skills = skills.iter().map(|s| s.to_string()).collect();
        c
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_best_skill_prefers_affinity_then_request_order() {
        let mut c = candidate(1, &["ml", "nlp", "vision"]);
        assert_eq!(best_skill(&c, &strings(&["nlp", "ml"])), Some("nlp".to_string()));

        c.skill_affinity.insert("ml".to_string(), 2.5);
        assert_eq!(best_skill(&c, &strings(&["nlp", "ml"])), Some("ml".to_string()));
        assert_eq!(best_skill(&c, &strings(&["databases"])), None);
    }

    #[test]
    fn test_score_only_matches_uncovered_skills() {
        let c = candidate(1, &["ml"]);
        let stats = PoolStats::from_candidates(std::slice::from_ref(&c));
        let weights = ScoringWeights {
            connectivity: 1.0,
            ..Default::default()
        };
        let ctx = ScoringContext {
            stats: &stats,
            weights: &weights,
            reference_year: 2024,
            half_life_years: 5.0,
            teammates: &[],
        };
        let requested = strings(&["ml", "nlp"]);

        let open = score(&c, &BTreeSet::new(), &requested, &ctx);
        assert_eq!(open.matched_skill.as_deref(), Some("ml"));

        let covered: BTreeSet<String> = ["ml".to_string()].into_iter().collect();
        let closed = score(&c, &covered, &requested, &ctx);
        assert_eq!(closed.matched_skill, None);
    }

    #[test]
    fn test_terms_are_normalized() {
        let mut a = candidate(1, &["ml"]);
        a.paper_count = 10;
        a.citation_count = 50;
        a.collaborations = vec![
            CollaborationEdge { peer_id: 2, weight: 4.0, last_year: None },
            CollaborationEdge { peer_id: 3, weight: 1.0, last_year: None },
        ];
        let mut b = candidate(2, &["nlp"]);
        b.paper_count = 5;
        b.citation_count = 100;
        b.collaborations = vec![CollaborationEdge { peer_id: 1, weight: 2.0, last_year: None }];
        let pool = vec![a.clone(), b.clone()];
        let stats = PoolStats::from_candidates(&pool);

        assert_eq!(paper_term(&b, &stats), 0.5);
        assert_eq!(citation_term(&a, &stats), 0.5);
        assert_eq!(connectivity_term(&b, &stats), 0.5);
        // 双方记录不一致时取较大值 4.0
        assert_eq!(collaboration_term(&b, &[&a], &stats), 1.0);
        assert_eq!(collaboration_term(&b, &[], &stats), 0.0);
    }

    #[test]
    fn test_organization_term() {
        let mut a = candidate(1, &["ml"]);
        a.organizations.insert("MIT".to_string());
        let mut b = candidate(2, &["nlp"]);
        b.organizations.insert("MIT".to_string());
        let mut c = candidate(3, &["db"]);
        c.organizations.insert("CMU".to_string());

        assert_eq!(organization_term(&a, &[&b, &c]), 0.5);
        assert_eq!(organization_term(&a, &[]), 0.0);
    }

    #[test]
    fn test_recency_half_life() {
        let mut c = candidate(1, &["ml"]);
        assert_eq!(recency_term(&c, 2024, 5.0), 0.0);

        c.last_active_year = Some(2024);
        assert_eq!(recency_term(&c, 2024, 5.0), 1.0);

        c.last_active_year = Some(2019);
        assert!((recency_term(&c, 2024, 5.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rank_tie_breaks() {
        let mut a = candidate(5, &["ml"]);
        a.citation_count = 10;
        let mut b = candidate(3, &["ml"]);
        b.citation_count = 10;
        let mut c = candidate(9, &["ml"]);
        c.citation_count = 20;

        assert_eq!(rank(0.9, &a, 0.1, &c), Ordering::Less);
        assert_eq!(rank(0.5, &a, 0.5, &c), Ordering::Greater);
        assert_eq!(rank(0.5, &a, 0.5, &b), Ordering::Greater);
    }

    #[test]
    fn test_weights_override() {
        let defaults = ScoringWeights {
            collaboration: 0.7,
            connectivity: 0.3,
            ..Default::default()
        };
        let overrides = StrategyOverride {
            collaboration: Some(1.0),
            ..Default::default()
        };
        let merged = defaults.with_override(&overrides);
        assert_eq!(merged.collaboration, 1.0);
        assert_eq!(merged.connectivity, 0.3);
    }
}
