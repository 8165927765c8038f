use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use teamform_api::create_app;
use teamform_config::ApiConfig;
use teamform_domain::{Algorithm, AlgorithmInfo};
use teamform_matching::StrategySet;
use teamform_orchestrator::{OrchestratorSettings, TaskOrchestrator};
use teamform_testing_utils::{CandidatePools, MockCandidateRepository, TestEnv};

fn setup(repository: MockCandidateRepository) -> (Router, Arc<TaskOrchestrator>) {
    let settings = OrchestratorSettings {
        worker_count: 2,
        progress_interval: Duration::from_millis(20),
        ..OrchestratorSettings::default()
    };
    let orchestrator =
        TaskOrchestrator::start(settings, Arc::new(repository), StrategySet::default());
    let algorithms = Algorithm::all().into_iter().map(AlgorithmInfo::from).collect();
    let app = create_app(Arc::clone(&orchestrator), algorithms, &ApiConfig::default());
    (app, orchestrator)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn wait_until_terminal(app: &Router, task_id: &str) -> Value {
    let uri = format!("/api/team-tasks/{task_id}");
    let finished = TestEnv::wait_for(
        || {
            let app = app.clone();
            let uri = uri.clone();
            async move {
                let (_, body) = send(&app, get(&uri)).await;
                matches!(body["status"].as_str(), Some("completed" | "failed" | "cancelled"))
            }
        },
        Duration::from_secs(5),
    )
    .await;
    assert!(finished, "任务 {task_id} 未结束");
    send(app, get(&uri)).await.1
}

#[tokio::test]
async fn test_health_check() {
    let (app, orchestrator) = setup(MockCandidateRepository::new());
    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "teamform");
    assert_eq!(body["workers"], 2);

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_list_algorithms() {
    let (app, orchestrator) = setup(MockCandidateRepository::new());
    let (status, body) = send(&app, get("/api/algorithms")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["ACET", "CAT", "OAT", "PRT", "COT", "TAT", "CIT"]);

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_submit_and_poll_to_completion() {
    let (app, orchestrator) = setup(MockCandidateRepository::with_candidates(
        CandidatePools::partial_coverage(),
    ));

    let (status, body) = send(
        &app,
        post_json(
            "/api/team-tasks",
            json!({
                "algorithm": "ACET",
                "keywords": ["ml", "nlp", "optimization"],
                "team_size": 3,
                "num_teams": 1
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let task_id = body["task_id"].as_str().unwrap().to_string();

    let body = wait_until_terminal(&app, &task_id).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["progress"], 100);
    assert!(body["elapsed_seconds"].is_number());
    assert!(body.get("error").is_none());

    let team = &body["result"]["teams"][0];
    assert_eq!(team["team_number"], 1);
    assert_eq!(team["members"].as_array().unwrap().len(), 3);
    assert_eq!(team["skills_covered"], json!(["ml", "nlp"]));
    assert_eq!(team["requested_skills"], json!(["ml", "nlp", "optimization"]));
    assert_eq!(team["members"][0]["added_for_skill"], "ml");

    let summary = &body["result"]["summary"];
    assert_eq!(summary["total_teams"], 1);
    assert_eq!(summary["incomplete_teams"], 1);
    assert_eq!(summary["warnings"][0]["type"], "insufficient_coverage");

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_submit_validation_errors() {
    let (app, orchestrator) = setup(MockCandidateRepository::new());

    let cases = [
        json!({"algorithm": "ACET", "keywords": [], "team_size": 3, "num_teams": 1}),
        json!({"algorithm": "ACET", "keywords": ["ml"], "team_size": -1, "num_teams": 1}),
        json!({"algorithm": "NOPE", "keywords": ["ml"], "team_size": 3, "num_teams": 1}),
    ];
    for case in cases {
        let (status, body) = send(&app, post_json("/api/team-tasks", case.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{case}");
        assert_eq!(body["error"]["type"], "INVALID_REQUEST");
        assert_eq!(body["error"]["code"], 400);
        assert!(!body["error"]["suggestions"].as_array().unwrap().is_empty());
    }

    // 缺少字段的 JSON 也是 400
    let (status, body) = send(
        &app,
        post_json("/api/team-tasks", json!({"algorithm": "ACET"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "BAD_REQUEST");

    assert!(orchestrator.list_tasks().is_empty());
    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_unknown_task_returns_404() {
    let (app, orchestrator) = setup(MockCandidateRepository::new());

    let (status, body) = send(&app, get("/api/team-tasks/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "TASK_NOT_FOUND");

    let (status, _) = send(
        &app,
        post_json("/api/team-tasks/does-not-exist/cancel", json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_failed_task_reports_error_detail() {
    let (app, orchestrator) = setup(MockCandidateRepository::new().failing("neo4j offline"));

    let (_, body) = send(
        &app,
        post_json(
            "/api/team-tasks",
            json!({"algorithm": "CIT", "keywords": ["ml"], "team_size": 2, "num_teams": 1}),
        ),
    )
    .await;
    let task_id = body["task_id"].as_str().unwrap().to_string();

    let body = wait_until_terminal(&app, &task_id).await;
    assert_eq!(body["status"], "failed");
    assert_eq!(body["error"]["kind"], "REPOSITORY_UNAVAILABLE");
    assert_eq!(body["error"]["algorithm"], "CIT");
    assert_eq!(body["error"]["keywords"], json!(["ml"]));
    assert!(body.get("result").is_none());

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let (app, orchestrator) = setup(
        MockCandidateRepository::with_candidates(CandidatePools::partial_coverage())
            .with_delay(Duration::from_secs(2)),
    );

    let (_, body) = send(
        &app,
        post_json(
            "/api/team-tasks",
            json!({"algorithm": "COT", "keywords": ["ml"], "team_size": 2, "num_teams": 1}),
        ),
    )
    .await;
    let task_id = body["task_id"].as_str().unwrap().to_string();
    let cancel_uri = format!("/api/team-tasks/{task_id}/cancel");

    let (status, body) = send(&app, post_json(&cancel_uri, json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let body = wait_until_terminal(&app, &task_id).await;
    assert_eq!(body["status"], "cancelled");

    let (status, body) = send(&app, post_json(&cancel_uri, json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_submissions_are_isolated() {
    let (app, orchestrator) = setup(MockCandidateRepository::with_candidates(
        CandidatePools::research_group(),
    ));

    let submissions = ["ACET", "CAT", "OAT", "PRT", "COT", "TAT", "CIT"].map(|algorithm| {
        let app = app.clone();
        async move {
            let (status, body) = send(
                &app,
                post_json(
                    "/api/team-tasks",
                    json!({
                        "algorithm": algorithm,
                        "keywords": ["ml", "databases"],
                        "team_size": 2,
                        "num_teams": 1
                    }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::ACCEPTED);
            body["task_id"].as_str().unwrap().to_string()
        }
    });
    let task_ids = futures::future::join_all(submissions).await;

    let (_, listing) = send(&app, get("/api/team-tasks")).await;
    assert_eq!(listing["data"].as_array().unwrap().len(), 7);

    for (task_id, algorithm) in task_ids.iter().zip(["ACET", "CAT", "OAT", "PRT", "COT", "TAT", "CIT"]) {
        let body = wait_until_terminal(&app, task_id).await;
        assert_eq!(body["status"], "completed", "{algorithm}");
        assert_eq!(body["algorithm"], algorithm);
        assert_eq!(body["result"]["summary"]["algorithm"], algorithm);
    }

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_algorithm_detail_and_unknown_routes() {
    let (app, orchestrator) = setup(MockCandidateRepository::new());

    let (status, body) = send(&app, get("/api/algorithms/cot")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "COT");
    assert!(body["data"]["description"].as_str().is_some());

    let (status, body) = send(&app, get("/api/algorithms/XYZ")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "NOT_FOUND");

    let (status, body) = send(&app, get("/api/no-such-route")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 404);

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_keywords_endpoint() {
    let (app, orchestrator) = setup(MockCandidateRepository::with_candidates(
        CandidatePools::research_group(),
    ));

    let (status, body) = send(&app, get("/api/keywords")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["keywords"],
        json!(["databases", "ml", "nlp", "optimization", "vision"])
    );
    assert_eq!(body["data"]["count"], 5);

    let (_, body) = send(&app, get("/api/keywords?limit=2")).await;
    assert_eq!(body["data"]["keywords"], json!(["databases", "ml"]));

    let (status, body) = send(&app, get("/api/keywords?limit=many")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "BAD_REQUEST");

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_candidate_search_endpoint() {
    let (app, orchestrator) = setup(MockCandidateRepository::with_candidates(
        CandidatePools::partial_coverage(),
    ));

    let (status, body) = send(&app, get("/api/candidates/search?q=ML")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<u64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(body["data"][0]["name"], "Alice");
    assert_eq!(body["data"][0]["citation_count"], 300);
    assert!(body["data"][0].get("collaborations").is_none());

    let (_, body) = send(&app, get("/api/candidates/search?q=ml&limit=1")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, get("/api/candidates/search?q=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "INVALID_REQUEST");

    orchestrator.shutdown().await;
}
