use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use teamform_domain::{Algorithm, TaskSnapshot, TaskStatus, TeamFormationRequest};
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    response::{accepted, success, ApiResponse},
    routes::AppState,
};

/// 提交成功后返回的任务ID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTaskResponse {
    pub task_id: String,
}

/// 任务列表中的条目，不含结果正文
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListItem {
    pub task_id: String,
    pub algorithm: Algorithm,
    pub keywords: Vec<String>,
    pub status: TaskStatus,
    pub progress: u8,
    pub elapsed_seconds: f64,
}

impl From<TaskSnapshot> for TaskListItem {
    fn from(snapshot: TaskSnapshot) -> Self {
        Self {
            task_id: snapshot.task_id,
            algorithm: snapshot.algorithm,
            keywords: snapshot.keywords,
            status: snapshot.status,
            progress: snapshot.progress,
            elapsed_seconds: snapshot.elapsed_seconds,
        }
    }
}

/// 提交团队组建任务
pub async fn submit_task(
    State(state): State<AppState>,
    payload: Result<Json<TeamFormationRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let task_id = state.orchestrator.submit(&request)?;
    Ok(accepted(SubmitTaskResponse { task_id }))
}

/// 查询任务状态
pub async fn get_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<TaskSnapshot>> {
    let snapshot = state.orchestrator.get_status(&task_id)?;
    debug!(
        "任务 {} 状态: {} ({}%)",
        task_id,
        snapshot.status.as_str(),
        snapshot.progress
    );
    Ok(Json(snapshot))
}

/// 取消任务；对已结束的任务是幂等的
pub async fn cancel_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<ApiResponse<TaskListItem>> {
    let snapshot = state.orchestrator.cancel(&task_id)?;
    let message = match snapshot.status {
        TaskStatus::Cancelled => "任务已取消",
        TaskStatus::Running => "已请求取消，任务将在下一个检查点停止",
        _ => "任务已结束，无需取消",
    };
    Ok(ApiResponse::success_with_message(
        TaskListItem::from(snapshot),
        message.to_string(),
    ))
}

/// 列出所有未过期的任务
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let items: Vec<TaskListItem> = state
        .orchestrator
        .list_tasks()
        .into_iter()
        .map(TaskListItem::from)
        .collect();
    Ok(success(items))
}
