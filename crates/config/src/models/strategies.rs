use serde::{Deserialize, Serialize};
use teamform_domain::Algorithm;

use crate::validation::{ConfigValidator, ValidationUtils};
use crate::{ConfigError, ConfigResult};

/// 单个算法的权重覆盖，未设置的项沿用算法默认值
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StrategyOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connectivity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaboration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recency: Option<f64>,
    /// TAT 的时间衰减半衰期（年）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub half_life_years: Option<f64>,
    /// COT 局部搜索的最大交换轮数
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_swap_rounds: Option<usize>,
    /// TAT/CIT：新成员须在最近若干年内与某位现有成员合作过
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_threshold_years: Option<u32>,
    /// TAT/CIT：没有年份的合作记录是否计入时间窗口，默认不计入
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_undated_collaborations: Option<bool>,
    /// TAT/CIT：时间窗口内无人可选时，是否退而选择同机构的候选人，默认开启
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_fallback: Option<bool>,
}

impl StrategyOverride {
    fn validate_for(&self, section: &str) -> ConfigResult<()> {
        let weights = [
            ("paper", self.paper),
            ("citation", self.citation),
            ("connectivity", self.connectivity),
            ("collaboration", self.collaboration),
            ("organization", self.organization),
            ("recency", self.recency),
        ];
        for (name, value) in weights {
            if let Some(value) = value {
                ValidationUtils::validate_weight(value, &format!("strategies.{section}.{name}"))?;
            }
        }
        if let Some(half_life) = self.half_life_years {
            if !half_life.is_finite() || half_life <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "strategies.{section}.half_life_years must be greater than 0"
                )));
            }
        }
        if let Some(rounds) = self.max_swap_rounds {
            ValidationUtils::validate_count(rounds, &format!("strategies.{section}.max_swap_rounds"))?;
        }
        if let Some(years) = self.time_threshold_years {
            ValidationUtils::validate_count(
                years as usize,
                &format!("strategies.{section}.time_threshold_years"),
            )?;
        }
        Ok(())
    }

    /// 时间窗口相关的键只对 TAT 与 CIT 有意义
    fn reject_recency_window(&self, section: &str) -> ConfigResult<()> {
        let keys = [
            ("time_threshold_years", self.time_threshold_years.is_some()),
            (
                "include_undated_collaborations",
                self.include_undated_collaborations.is_some(),
            ),
            ("organization_fallback", self.organization_fallback.is_some()),
        ];
        match keys.iter().find(|(_, set)| *set) {
            Some((key, _)) => Err(ConfigError::Validation(format!(
                "strategies.{section}.{key} is only supported for tat and cit"
            ))),
            None => Ok(()),
        }
    }
}

/// 每种算法一个可选的 `[strategies.<code>]` 小节
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StrategiesConfig {
    pub acet: StrategyOverride,
    pub cat: StrategyOverride,
    pub oat: StrategyOverride,
    pub prt: StrategyOverride,
    pub cot: StrategyOverride,
    pub tat: StrategyOverride,
    pub cit: StrategyOverride,
}

impl StrategiesConfig {
    pub fn for_algorithm(&self, algorithm: Algorithm) -> &StrategyOverride {
        match algorithm {
            Algorithm::Acet => &self.acet,
            Algorithm::Cat => &self.cat,
            Algorithm::Oat => &self.oat,
            Algorithm::Prt => &self.prt,
            Algorithm::Cot => &self.cot,
            Algorithm::Tat => &self.tat,
            Algorithm::Cit => &self.cit,
        }
    }
}

impl ConfigValidator for StrategiesConfig {
    fn validate(&self) -> ConfigResult<()> {
        for algorithm in Algorithm::all() {
            let section = algorithm.code().to_lowercase();
            let overrides = self.for_algorithm(algorithm);
            overrides.validate_for(&section)?;
            if !matches!(algorithm, Algorithm::Tat | Algorithm::Cit) {
                overrides.reject_recency_window(&section)?;
            }
        }
        Ok(())
    }
}
