use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use teamform_domain::RequestLimits;

use super::{
    api_observability::{ApiConfig, ObservabilityConfig},
    orchestrator::{LimitsConfig, OrchestratorConfig, RepositoryConfig},
    strategies::StrategiesConfig,
};
use crate::validation::ConfigValidator;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub orchestrator: OrchestratorConfig,
    pub repository: RepositoryConfig,
    pub limits: LimitsConfig,
    pub strategies: StrategiesConfig,
    pub api: ApiConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 加载顺序：内置默认值 → TOML 文件 → `TEAMFORM_` 环境变量
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder().add_source(
            ConfigBuilder::try_from(&AppConfig::default()).context("构建默认配置失败")?,
        );

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else {
            let default_paths = [
                "config/teamform.toml",
                "teamform.toml",
                "/etc/teamform/config.toml",
            ];

            if let Some(path) = default_paths.iter().find(|p| Path::new(p).exists()) {
                tracing::debug!("使用配置文件: {}", path);
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("TEAMFORM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }

    pub fn request_limits(&self) -> RequestLimits {
        self.limits.request_limits()
    }
}

impl ConfigValidator for AppConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        self.orchestrator.validate()?;
        self.repository.validate()?;
        self.limits.validate()?;
        self.strategies.validate()?;
        self.api.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LogFormat;
    use teamform_domain::Algorithm;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.orchestrator.worker_count, 4);
        assert_eq!(config.orchestrator.retention_seconds, 3600);
        assert_eq!(config.orchestrator.max_runtime_seconds, 900);
        assert_eq!(config.limits.max_keywords, 20);
        assert_eq!(config.api.bind_address, "0.0.0.0:8080");
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_app_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid = AppConfig::default();
        invalid.orchestrator.worker_count = 0;
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_app_config_from_toml() {
        let toml_str = r#"
[orchestrator]
worker_count = 2
retention_seconds = 120

[limits]
max_team_size = 8

[strategies.cot]
collaboration = 0.9
max_swap_rounds = 3

[observability]
log_level = "debug"
log_format = "json"
"#;

        let config = AppConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.orchestrator.worker_count, 2);
        assert_eq!(config.orchestrator.retention_seconds, 120);
        assert_eq!(config.orchestrator.max_runtime_seconds, 900);
        assert_eq!(config.request_limits().max_team_size, 8);
        assert_eq!(config.request_limits().max_keywords, 20);

        let cot = config.strategies.for_algorithm(Algorithm::Cot);
        assert_eq!(cot.collaboration, Some(0.9));
        assert_eq!(cot.max_swap_rounds, Some(3));
        assert_eq!(cot.connectivity, None);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_app_config_rejects_negative_weight() {
        let toml_str = r#"
[strategies.cit]
citation = -1.0
"#;
        assert!(AppConfig::from_toml(toml_str).is_err());
    }

    #[test]
    fn test_recency_window_keys_only_for_tat_and_cit() {
        let accepted = AppConfig::from_toml(
            r#"
[strategies.tat]
time_threshold_years = 5
include_undated_collaborations = true
organization_fallback = false
"#,
        )
        .unwrap();
        let tat = accepted.strategies.for_algorithm(Algorithm::Tat);
        assert_eq!(tat.time_threshold_years, Some(5));
        assert_eq!(tat.include_undated_collaborations, Some(true));
        assert_eq!(tat.organization_fallback, Some(false));

        let rejected = AppConfig::from_toml(
            r#"
[strategies.acet]
time_threshold_years = 5
"#,
        );
        assert!(rejected.is_err());
    }

    #[test]
    fn test_app_config_toml_roundtrip() {
        let mut config = AppConfig::default();
        config.strategies.tat.half_life_years = Some(3.0);
        let serialized = config.to_toml().unwrap();
        let parsed = AppConfig::from_toml(&serialized).unwrap();
        assert_eq!(parsed, config);
    }
}
