use axum::extract::{Path, State};
use axum::response::IntoResponse;

use crate::{
    error::{ApiError, ApiResult},
    response::success,
    routes::AppState,
};

/// 列出可用的团队组建算法
pub async fn list_algorithms(
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    Ok(success(state.algorithms.as_ref().clone()))
}

/// 单个算法的说明，代码不区分大小写
pub async fn get_algorithm(
    State(state): State<AppState>,
    Path(algorithm_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let info = state
        .algorithms
        .iter()
        .find(|info| info.id.eq_ignore_ascii_case(&algorithm_id))
        .cloned()
        .ok_or(ApiError::NotFound)?;
    Ok(success(info))
}
