use std::collections::BTreeMap;
use std::sync::Arc;

use teamform_config::StrategiesConfig;
use teamform_domain::{Algorithm, Candidate, SkillRequest, TeamFormationResult};

use crate::builder::{BuildControl, Selection};
use crate::cohesion;
use crate::scoring::ScoringWeights;

pub const DEFAULT_HALF_LIFE_YEARS: f64 = 5.0;
pub const DEFAULT_MAX_SWAP_ROUNDS: usize = 10;

/// 贪心骨架的可变部分：权重、技能填充顺序以及贪心后的调整
pub trait ScoringPolicy: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    fn weights(&self) -> &ScoringWeights;

    fn half_life_years(&self) -> f64 {
        DEFAULT_HALF_LIFE_YEARS
    }

    /// 技能的考虑顺序
    fn skill_order(&self, request: &SkillRequest) -> Vec<String> {
        request.skills.clone()
    }

    /// 为 true 时按 `skill_order` 逐项填充，而不是在所有未覆盖技能中择优
    fn sequential_fill(&self) -> bool {
        false
    }

    /// 团队已有成员时，候选人是否可以加入
    fn admits(&self, _candidate: &Candidate, _teammates: &[&Candidate], _reference_year: i32) -> bool {
        true
    }

    /// 无人通过 `admits` 时是否改为考虑与现有成员同机构的候选人
    fn organization_fallback(&self) -> bool {
        false
    }

    /// 贪心完成后对单个团队做局部调整，`available[i]` 表示候选人 i 尚未被使用
    fn refine(
        &self,
        _selections: &mut Vec<Selection>,
        _candidates: &[Candidate],
        _available: &mut [bool],
        _requested: &[String],
        _control: &dyn BuildControl,
    ) -> TeamFormationResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        self.algorithm().code()
    }
}

/// 新成员须在 `max_years` 年内与某位现有成员合作过
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecencyWindow {
    pub max_years: u32,
    /// 没有年份的合作记录是否算在窗口内
    pub include_undated: bool,
}

impl RecencyWindow {
    pub fn admits(&self, candidate: &Candidate, teammates: &[&Candidate], reference_year: i32) -> bool {
        teammates.iter().any(|mate| {
            let outgoing = candidate.collaborations.iter().filter(|e| e.peer_id == mate.id);
            let incoming = mate.collaborations.iter().filter(|e| e.peer_id == candidate.id);
            outgoing.chain(incoming).any(|edge| match edge.last_year {
                Some(year) => reference_year - year <= self.max_years as i32,
                None => self.include_undated,
            })
        })
    }
}

/// 只靠权重区分的策略：ACET、CAT、OAT、TAT、CIT
pub struct WeightedPolicy {
    algorithm: Algorithm,
    weights: ScoringWeights,
    half_life_years: f64,
    recency_window: Option<RecencyWindow>,
    organization_fallback: bool,
}

impl WeightedPolicy {
    pub fn new(algorithm: Algorithm, weights: ScoringWeights) -> Self {
        Self {
            algorithm,
            weights,
            half_life_years: DEFAULT_HALF_LIFE_YEARS,
            recency_window: None,
            organization_fallback: false,
        }
    }

    pub fn with_half_life(mut self, half_life_years: f64) -> Self {
        self.half_life_years = half_life_years;
        self
    }

    pub fn with_recency_window(mut self, window: RecencyWindow, organization_fallback: bool) -> Self {
        self.recency_window = Some(window);
        self.organization_fallback = organization_fallback;
        self
    }

    pub fn acet() -> Self {
        Self::new(Algorithm::Acet, default_weights(Algorithm::Acet))
    }

    pub fn cat() -> Self {
        Self::new(Algorithm::Cat, default_weights(Algorithm::Cat))
    }

    pub fn oat() -> Self {
        Self::new(Algorithm::Oat, default_weights(Algorithm::Oat))
    }

    pub fn tat() -> Self {
        Self::new(Algorithm::Tat, default_weights(Algorithm::Tat))
    }

    pub fn cit() -> Self {
        Self::new(Algorithm::Cit, default_weights(Algorithm::Cit))
    }
}

impl ScoringPolicy for WeightedPolicy {
    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    fn half_life_years(&self) -> f64 {
        self.half_life_years
    }

    fn admits(&self, candidate: &Candidate, teammates: &[&Candidate], reference_year: i32) -> bool {
        match &self.recency_window {
            Some(window) => window.admits(candidate, teammates, reference_year),
            None => true,
        }
    }

    fn organization_fallback(&self) -> bool {
        self.organization_fallback
    }
}

/// PRT：按调用方给出的优先级依次填充技能
pub struct PrioritizedPolicy {
    weights: ScoringWeights,
}

impl PrioritizedPolicy {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }
}

impl Default for PrioritizedPolicy {
    fn default() -> Self {
        Self::new(default_weights(Algorithm::Prt))
    }
}

impl ScoringPolicy for PrioritizedPolicy {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Prt
    }

    fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    fn skill_order(&self, request: &SkillRequest) -> Vec<String> {
        request.prioritized_skills()
    }

    fn sequential_fill(&self) -> bool {
        true
    }
}

/// COT：贪心之后做交换式局部搜索，提升团队内平均合作强度
pub struct CohesionPolicy {
    weights: ScoringWeights,
    max_swap_rounds: usize,
}

impl CohesionPolicy {
    pub fn new(weights: ScoringWeights, max_swap_rounds: usize) -> Self {
        Self {
            weights,
            max_swap_rounds,
        }
    }
}

impl Default for CohesionPolicy {
    fn default() -> Self {
        Self::new(default_weights(Algorithm::Cot), DEFAULT_MAX_SWAP_ROUNDS)
    }
}

impl ScoringPolicy for CohesionPolicy {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Cot
    }

    fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    fn refine(
        &self,
        selections: &mut Vec<Selection>,
        candidates: &[Candidate],
        available: &mut [bool],
        requested: &[String],
        control: &dyn BuildControl,
    ) -> TeamFormationResult<()> {
        cohesion::improve_cohesion(
            selections,
            candidates,
            available,
            requested,
            self.max_swap_rounds,
            control,
        )?;
        Ok(())
    }
}

/// 各算法的默认权重
pub fn default_weights(algorithm: Algorithm) -> ScoringWeights {
    match algorithm {
        Algorithm::Acet => ScoringWeights {
            connectivity: 1.0,
            paper: 0.1,
            ..Default::default()
        },
        Algorithm::Cat => ScoringWeights {
            collaboration: 1.0,
            connectivity: 0.2,
            ..Default::default()
        },
        Algorithm::Oat => ScoringWeights {
            organization: 1.0,
            connectivity: 0.2,
            ..Default::default()
        },
        Algorithm::Prt => ScoringWeights {
            collaboration: 1.0,
            organization: 0.5,
            ..Default::default()
        },
        Algorithm::Cot => ScoringWeights {
            collaboration: 0.7,
            connectivity: 0.3,
            ..Default::default()
        },
        Algorithm::Tat => ScoringWeights {
            recency: 1.0,
            collaboration: 0.3,
            citation: 0.2,
            ..Default::default()
        },
        Algorithm::Cit => ScoringWeights {
            citation: 1.0,
            recency: 0.2,
            paper: 0.1,
            ..Default::default()
        },
    }
}

/// 按配置构建单个算法的策略
pub fn create_policy(algorithm: Algorithm, config: &StrategiesConfig) -> Arc<dyn ScoringPolicy> {
    let overrides = config.for_algorithm(algorithm);
    let weights = default_weights(algorithm).with_override(overrides);
    let half_life = overrides.half_life_years.unwrap_or(DEFAULT_HALF_LIFE_YEARS);

    match algorithm {
        Algorithm::Prt => Arc::new(PrioritizedPolicy::new(weights)),
        Algorithm::Cot => Arc::new(CohesionPolicy::new(
            weights,
            overrides.max_swap_rounds.unwrap_or(DEFAULT_MAX_SWAP_ROUNDS),
        )),
        Algorithm::Tat | Algorithm::Cit => {
            let policy = WeightedPolicy::new(algorithm, weights).with_half_life(half_life);
            match overrides.time_threshold_years {
                Some(max_years) => Arc::new(policy.with_recency_window(
                    RecencyWindow {
                        max_years,
                        include_undated: overrides.include_undated_collaborations.unwrap_or(false),
                    },
                    overrides.organization_fallback.unwrap_or(true),
                )),
                None => Arc::new(policy),
            }
        }
        other => Arc::new(WeightedPolicy::new(other, weights).with_half_life(half_life)),
    }
}

/// 七种策略的注册表
#[derive(Clone)]
pub struct StrategySet {
    policies: BTreeMap<Algorithm, Arc<dyn ScoringPolicy>>,
}

impl StrategySet {
    pub fn from_config(config: &StrategiesConfig) -> Self {
        Algorithm::all()
            .into_iter()
            .fold(Self { policies: BTreeMap::new() }, |set, algorithm| {
                set.with_policy(algorithm, create_policy(algorithm, config))
            })
    }

    /// 注册或替换某个算法的策略
    pub fn with_policy(mut self, algorithm: Algorithm, policy: Arc<dyn ScoringPolicy>) -> Self {
        self.policies.insert(algorithm, policy);
        self
    }

    pub fn get(&self, algorithm: Algorithm) -> Arc<dyn ScoringPolicy> {
        match self.policies.get(&algorithm) {
            Some(policy) => Arc::clone(policy),
            None => create_policy(algorithm, &StrategiesConfig::default()),
        }
    }

    pub fn algorithms(&self) -> Vec<Algorithm> {
        self.policies.keys().copied().collect()
    }
}

impl Default for StrategySet {
    fn default() -> Self {
        Self::from_config(&StrategiesConfig::default())
    }
}
