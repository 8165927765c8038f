use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use teamform_domain::AlgorithmInfo;
use teamform_orchestrator::TaskOrchestrator;

use crate::handlers::{
    algorithms::{get_algorithm, list_algorithms},
    catalog::{list_keywords, search_candidates},
    health::health_check,
    not_found,
    tasks::{cancel_task, get_task_status, list_tasks, submit_task},
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TaskOrchestrator>,
    pub algorithms: Arc<Vec<AlgorithmInfo>>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        // 团队组建任务
        .route("/api/team-tasks", get(list_tasks).post(submit_task))
        .route("/api/team-tasks/{task_id}", get(get_task_status))
        .route("/api/team-tasks/{task_id}/cancel", post(cancel_task))
        // 算法目录
        .route("/api/algorithms", get(list_algorithms))
        .route("/api/algorithms/{algorithm_id}", get(get_algorithm))
        // 候选池目录
        .route("/api/keywords", get(list_keywords))
        .route("/api/candidates/search", get(search_candidates))
        .fallback(not_found)
        .with_state(state)
}
