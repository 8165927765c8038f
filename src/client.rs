//! 访问远程团队组建服务的 HTTP 客户端

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use teamform_api::handlers::catalog::{CandidateSummary, KeywordList};
use teamform_domain::{
    AlgorithmInfo, TaskSnapshot, TeamFormationError, TeamFormationRequest, TeamFormationResult,
};
use teamform_orchestrator::TaskStatusSource;

pub struct HttpTaskClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpTaskClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> TeamFormationResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| TeamFormationError::Internal(format!("创建HTTP客户端失败: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub async fn submit(&self, request: &TeamFormationRequest) -> TeamFormationResult<String> {
        let response = self
            .http
            .post(format!("{}/api/team-tasks", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_body(response).await?;
        body["task_id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| TeamFormationError::Internal("响应中缺少 task_id".to_string()))
    }

    pub async fn cancel(&self, task_id: &str) -> TeamFormationResult<CancelAck> {
        let response = self
            .http
            .post(format!("{}/api/team-tasks/{task_id}/cancel", self.base_url))
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_body(response).await.map_err(|e| not_found_as(e, task_id))?;
        Ok(CancelAck {
            status: body["data"]["status"].as_str().unwrap_or_default().to_string(),
            message: body["message"].as_str().unwrap_or_default().to_string(),
        })
    }

    pub async fn algorithms(&self) -> TeamFormationResult<Vec<AlgorithmInfo>> {
        let response = self
            .http
            .get(format!("{}/api/algorithms", self.base_url))
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_body(response).await?;
        Ok(serde_json::from_value(body["data"].clone())?)
    }

    pub async fn keywords(&self, limit: usize) -> TeamFormationResult<Vec<String>> {
        let response = self
            .http
            .get(format!("{}/api/keywords", self.base_url))
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_body(response).await?;
        let list: KeywordList = serde_json::from_value(body["data"].clone())?;
        Ok(list.keywords)
    }

    pub async fn search_candidates(
        &self,
        query: &str,
        limit: usize,
    ) -> TeamFormationResult<Vec<CandidateSummary>> {
        let response = self
            .http
            .get(format!("{}/api/candidates/search", self.base_url))
            .query(&[("q", query.to_string()), ("limit", limit.to_string())])
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_body(response).await?;
        Ok(serde_json::from_value(body["data"].clone())?)
    }
}

/// 取消请求的确认信息
#[derive(Debug, Clone)]
pub struct CancelAck {
    pub status: String,
    pub message: String,
}

#[async_trait]
impl TaskStatusSource for HttpTaskClient {
    async fn fetch_status(&self, task_id: &str) -> TeamFormationResult<TaskSnapshot> {
        let response = self
            .http
            .get(format!("{}/api/team-tasks/{task_id}", self.base_url))
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_body(response).await.map_err(|e| not_found_as(e, task_id))?;
        Ok(serde_json::from_value(body)?)
    }
}

fn transport_error(err: reqwest::Error) -> TeamFormationError {
    if err.is_timeout() || err.is_connect() {
        TeamFormationError::timeout_error(format!("请求团队组建服务失败: {err}"))
    } else {
        TeamFormationError::Internal(format!("请求团队组建服务失败: {err}"))
    }
}

fn not_found_as(err: TeamFormationError, task_id: &str) -> TeamFormationError {
    match err {
        TeamFormationError::TaskNotFound { .. } => TeamFormationError::task_not_found(task_id),
        other => other,
    }
}

/// 成功时返回 JSON；错误响应按状态码还原为对应的错误类型
async fn read_body(response: reqwest::Response) -> TeamFormationResult<Value> {
    let status = response.status();
    let body: Value = response.json().await.map_err(transport_error)?;
    if status.is_success() {
        return Ok(body);
    }

    let message = body["error"]["message"]
        .as_str()
        .unwrap_or("未知错误")
        .to_string();
    Err(match status {
        StatusCode::BAD_REQUEST => TeamFormationError::invalid_request(message),
        StatusCode::NOT_FOUND => TeamFormationError::task_not_found(message),
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            TeamFormationError::timeout_error(message)
        }
        _ => TeamFormationError::Internal(format!("{status}: {message}")),
    })
}
