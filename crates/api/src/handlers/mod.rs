pub mod algorithms;
pub mod catalog;
pub mod health;
pub mod tasks;

use crate::error::ApiError;

/// 未匹配任何路由
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
