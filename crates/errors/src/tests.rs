#[cfg(test)]
mod error_tests {
    use crate::*;

    #[test]
    fn test_team_formation_error_display() {
        let error = TeamFormationError::InvalidRequest("keywords 不能为空".to_string());
        assert_eq!(error.to_string(), "无效的请求: keywords 不能为空");

        let error = TeamFormationError::no_candidates(&["ml".to_string(), "nlp".to_string()]);
        assert_eq!(error.to_string(), "未找到匹配关键词的候选人: ml, nlp");

        let error = TeamFormationError::task_not_found("abc");
        assert_eq!(error.to_string(), "任务未找到: abc");

        let error = TeamFormationError::TaskTimeout { limit_seconds: 900 };
        assert_eq!(error.to_string(), "任务运行超过上限 900 秒");

        let error = TeamFormationError::Cancelled;
        assert_eq!(error.to_string(), "任务已取消");
    }

    #[test]
    fn test_creation_methods() {
        assert!(matches!(
            TeamFormationError::invalid_request("bad"),
            TeamFormationError::InvalidRequest(_)
        ));
        assert!(matches!(
            TeamFormationError::repository_unavailable("down"),
            TeamFormationError::RepositoryUnavailable(_)
        ));
        assert!(matches!(
            TeamFormationError::timeout_error("slow"),
            TeamFormationError::Timeout(_)
        ));
        assert!(matches!(
            TeamFormationError::config_error("missing"),
            TeamFormationError::Configuration(_)
        ));
    }

    #[test]
    fn test_is_retryable() {
        assert!(TeamFormationError::repository_unavailable("down").is_retryable());
        assert!(TeamFormationError::timeout_error("slow").is_retryable());

        assert!(!TeamFormationError::invalid_request("bad").is_retryable());
        assert!(!TeamFormationError::no_candidates(&[]).is_retryable());
        assert!(!TeamFormationError::TaskTimeout { limit_seconds: 1 }.is_retryable());
        assert!(!TeamFormationError::Cancelled.is_retryable());
    }

    #[test]
    fn test_is_fatal() {
        assert!(TeamFormationError::Internal("boom".to_string()).is_fatal());
        assert!(TeamFormationError::config_error("bad").is_fatal());
        assert!(!TeamFormationError::task_not_found("x").is_fatal());
    }

    #[test]
    fn test_kind_and_suggestions() {
        assert_eq!(TeamFormationError::no_candidates(&[]).kind(), "NO_CANDIDATES");
        assert_eq!(
            TeamFormationError::TaskTimeout { limit_seconds: 1 }.kind(),
            "TASK_TIMEOUT"
        );
        assert_eq!(TeamFormationError::task_not_found("x").kind(), "TASK_NOT_FOUND");

        assert!(!TeamFormationError::no_candidates(&[]).suggestions().is_empty());
        assert!(TeamFormationError::TaskTimeout { limit_seconds: 1 }
            .suggestions()
            .iter()
            .any(|s| s.contains("ACET")));
        assert!(TeamFormationError::Internal("x".to_string())
            .suggestions()
            .is_empty());
    }

    #[test]
    fn test_user_message() {
        assert_eq!(
            TeamFormationError::task_not_found("x").user_message(),
            "请求的任务不存在或已过期"
        );
        assert_eq!(
            TeamFormationError::Internal("x".to_string()).user_message(),
            "系统繁忙，请稍后重试"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: TeamFormationError = json_error.into();
        assert!(matches!(error, TeamFormationError::Serialization(_)));
    }
}
