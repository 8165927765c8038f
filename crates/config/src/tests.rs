mod loader_tests {
    use crate::AppConfig;

    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_file_merges_with_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[orchestrator]
max_runtime_seconds = 60

[repository]
lookup_timeout_seconds = 5
data_path = "data/candidates.json"
"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(config.orchestrator.max_runtime_seconds, 60);
        assert_eq!(config.orchestrator.retention_seconds, 3600);
        assert_eq!(config.repository.lookup_timeout_seconds, 5);
        assert_eq!(
            config.repository.data_path.as_deref(),
            Some("data/candidates.json")
        );
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = AppConfig::load(Some("/nonexistent/teamform.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[orchestrator]\nworker_count = 0").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_environment_override() {
        std::env::set_var("TEAMFORM_LIMITS__MAX_TEAMS", "7");
        let config = AppConfig::load(None).unwrap();
        std::env::remove_var("TEAMFORM_LIMITS__MAX_TEAMS");

        assert_eq!(config.limits.max_teams, 7);
    }
}
