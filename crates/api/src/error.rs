use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use teamform_domain::TeamFormationError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    TeamFormation(#[from] TeamFormationError),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("未找到资源")]
    NotFound,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::TeamFormation(TeamFormationError::InvalidRequest(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::TeamFormation(TeamFormationError::TaskNotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            ApiError::TeamFormation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_message, error_type, suggestions) = match &self {
            ApiError::TeamFormation(err @ TeamFormationError::InvalidRequest(msg)) => (
                format!("请求参数无效: {msg}"),
                err.kind().to_string(),
                err.suggestions().into_iter().map(String::from).collect(),
            ),
            ApiError::TeamFormation(err @ TeamFormationError::TaskNotFound { id }) => (
                format!("任务 {id} 不存在或已过期"),
                err.kind().to_string(),
                vec![
                    "请检查任务ID是否正确".to_string(),
                    "任务结果仅保留有限时间，请重新提交".to_string(),
                ],
            ),
            ApiError::TeamFormation(err) => (
                err.user_message().to_string(),
                err.kind().to_string(),
                vec![
                    "系统遇到内部错误，请稍后重试".to_string(),
                    "查看 GET /health 检查系统状态".to_string(),
                ],
            ),
            ApiError::BadRequest(msg) => (
                format!("请求参数错误: {msg}"),
                "BAD_REQUEST".to_string(),
                vec![
                    "请检查JSON格式与查询参数是否正确".to_string(),
                    "提交任务时确保 algorithm、keywords、team_size、num_teams 字段都已提供"
                        .to_string(),
                ],
            ),
            ApiError::NotFound => (
                "请求的资源不存在".to_string(),
                "NOT_FOUND".to_string(),
                vec!["请检查请求URL是否正确".to_string()],
            ),
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": error_type,
                "code": status.as_u16(),
                "suggestions": suggestions,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_maps_to_bad_request() {
        let error: ApiError = TeamFormationError::invalid_request("关键词不能为空").into();
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_task_not_found_maps_to_not_found() {
        let error: ApiError = TeamFormationError::task_not_found("abc").into();
        assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_other_errors_map_to_internal() {
        for error in [
            TeamFormationError::Internal("boom".to_string()),
            TeamFormationError::repository_unavailable("down"),
            TeamFormationError::config_error("bad"),
        ] {
            let api_error: ApiError = error.into();
            assert_eq!(
                api_error.into_response().status(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }

    #[test]
    fn test_bad_request_and_not_found() {
        assert_eq!(
            ApiError::BadRequest("json".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(format!("{}", ApiError::NotFound), "未找到资源");
    }
}
