//! # Teamform API
//!
//! 团队组建服务的 REST API，基于 Axum 构建。
//!
//! ## API 端点
//!
//! - `POST /api/team-tasks` - 提交团队组建任务，返回 `202 {task_id}`
//! - `GET /api/team-tasks` - 列出未过期的任务
//! - `GET /api/team-tasks/{task_id}` - 查询任务状态与结果
//! - `POST /api/team-tasks/{task_id}/cancel` - 取消任务
//! - `GET /api/algorithms` - 可用算法目录
//! - `GET /api/algorithms/{id}` - 单个算法说明，未知代码返回 404
//! - `GET /api/keywords?limit=` - 候选池中的技能关键词
//! - `GET /api/candidates/search?q=&limit=` - 按姓名或技能搜索候选人
//! - `GET /health` - 健康检查
//!
//! ## 错误格式
//!
//! 所有错误返回统一结构：
//!
//! ```json
//! {"error": {"message": "...", "type": "INVALID_REQUEST", "code": 400,
//!            "suggestions": ["..."], "timestamp": "..."}}
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, trace_layer};
use routes::{create_routes, AppState};
use teamform_config::ApiConfig;
use teamform_domain::AlgorithmInfo;
use teamform_orchestrator::TaskOrchestrator;

pub use error::{ApiError, ApiResult};
pub use response::ApiResponse;

/// 创建完整的API应用
pub fn create_app(
    orchestrator: Arc<TaskOrchestrator>,
    algorithms: Vec<AlgorithmInfo>,
    api_config: &ApiConfig,
) -> Router {
    let state = AppState {
        orchestrator,
        algorithms: Arc::new(algorithms),
    };

    let router = create_routes(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(axum::middleware::from_fn(request_logging)),
    );

    if api_config.cors_enabled {
        router.layer(cors_layer(api_config))
    } else {
        router
    }
}
