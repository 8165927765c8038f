use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use teamform_api::create_app;
use teamform_config::AppConfig;
use teamform_domain::{AlgorithmInfo, CandidateRepository};
use teamform_infrastructure::{
    InMemoryCandidateRepository, JsonFileCandidateRepository, TimeoutCandidateRepository,
    TimeoutHandler,
};
use teamform_matching::StrategySet;
use teamform_orchestrator::{OrchestratorSettings, TaskOrchestrator};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{info, warn};

/// 主应用程序：候选人仓储、任务编排器与 API 服务器
pub struct Application {
    config: AppConfig,
    orchestrator: Arc<TaskOrchestrator>,
    algorithms: Vec<AlgorithmInfo>,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let repository = build_repository(&config).await?;
        let strategies = StrategySet::from_config(&config.strategies);
        let algorithms = strategies
            .algorithms()
            .into_iter()
            .map(AlgorithmInfo::from)
            .collect();

        let orchestrator = TaskOrchestrator::start(
            OrchestratorSettings::from_config(&config),
            repository,
            strategies,
        );

        Ok(Self {
            config,
            orchestrator,
            algorithms,
        })
    }

    pub fn orchestrator(&self) -> &Arc<TaskOrchestrator> {
        &self.orchestrator
    }

    /// 构建 HTTP 路由；启用指标时附加 `/metrics`
    pub fn router(&self) -> Router {
        let router = create_app(
            Arc::clone(&self.orchestrator),
            self.algorithms.clone(),
            &self.config.api,
        );

        if !self.config.observability.metrics_enabled {
            return router;
        }
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => router.route(
                "/metrics",
                get(move || {
                    let handle = handle.clone();
                    async move { handle.render() }
                }),
            ),
            Err(e) => {
                warn!("安装指标记录器失败，/metrics 不可用: {}", e);
                router
            }
        }
    }

    /// 运行直到收到关闭信号，然后关闭编排器
    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        if self.config.api.enabled {
            let listener = TcpListener::bind(&self.config.api.bind_address)
                .await
                .with_context(|| format!("绑定地址失败: {}", self.config.api.bind_address))?;
            self.serve(listener, shutdown_rx).await?;
        } else {
            info!("API服务器已禁用，仅运行任务编排器");
            let mut shutdown_rx = shutdown_rx;
            let _ = shutdown_rx.recv().await;
        }

        self.orchestrator.shutdown().await;
        Ok(())
    }

    /// 在给定监听器上提供 API，收到关闭信号后停止接收新连接
    pub async fn serve(
        &self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        let address = listener.local_addr().context("读取监听地址失败")?;
        info!("API服务器启动在 http://{}", address);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API服务器收到关闭信号");
            })
            .await
            .context("API服务器运行失败")?;

        info!("API服务器已停止");
        Ok(())
    }
}

/// 按配置创建候选人仓储，并加上查询超时
pub async fn build_repository(config: &AppConfig) -> Result<Arc<dyn CandidateRepository>> {
    let handler = TimeoutHandler::with_default_config();

    let inner: Arc<dyn CandidateRepository> = match &config.repository.data_path {
        Some(path) => {
            let repository = handler
                .loading_operation(JsonFileCandidateRepository::load(path), "load_candidates")
                .await
                .with_context(|| format!("加载候选人数据失败: {path}"))?;
            info!(
                "候选人数据源: {} ({} 名候选人)",
                repository.source(),
                repository.candidate_count().await
            );
            Arc::new(repository)
        }
        None => {
            warn!("未配置 repository.data_path，使用空的内存候选人仓储");
            Arc::new(InMemoryCandidateRepository::default())
        }
    };

    Ok(Arc::new(TimeoutCandidateRepository::new(
        inner,
        Duration::from_secs(config.repository.lookup_timeout_seconds),
    )))
}
