// ABOUTME: HTTP surface tests against a scripted pipeline
// ABOUTME: Covers the MIP-003 endpoints, validation mapping, and the payment gate

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use promptforge_api::payment::{PaymentError, PaymentRequest, PaymentStatus};
use promptforge_api::{create_router, AppState, PaymentClient};
use promptforge_governor::{GovernorConfig, RateGovernor, ResponseCache};
use promptforge_pipeline::test_utils::{draft_prompt_document, FakeGenerator};
use promptforge_pipeline::{PipelineConfig, PipelineEngine};
use promptforge_storage::ContextStore;

struct TestApp {
    server: TestServer,
    generator: Arc<FakeGenerator>,
    _dirs: (TempDir, TempDir),
}

fn scripted_generator() -> FakeGenerator {
    FakeGenerator::new()
        .respond_when("Thinking mode: logical", "assumes remote work")
        .respond_when("Thinking mode: analytical", "action: manage tasks")
        .respond_when("Thinking mode: computational", "sequential flow")
        .respond_when("Thinking mode: outcome", "audience: team leads")
        .respond_when("Produce the document now", &draft_prompt_document())
        .respond_when("Rewrite the document", &draft_prompt_document())
}

fn test_app(payment: Option<Arc<dyn PaymentClient>>) -> TestApp {
    let context_dir = TempDir::new().unwrap();
    let checkpoint_dir = TempDir::new().unwrap();
    let generator = Arc::new(scripted_generator());
    let governor = Arc::new(RateGovernor::new(GovernorConfig {
        per_second: 100,
        per_minute: 100,
        ..GovernorConfig::default()
    }));
    let cache = Arc::new(ResponseCache::new(Duration::from_secs(900)));

    let engine = Arc::new(PipelineEngine::new(
        generator.clone(),
        governor.clone(),
        cache.clone(),
        ContextStore::new(context_dir.path()),
        PipelineConfig::new(checkpoint_dir.path()),
    ));

    let state = AppState::new(
        engine,
        governor,
        cache,
        payment,
        "agent_test_identifier".to_string(),
    );
    let server = TestServer::new(create_router(state)).unwrap();

    TestApp {
        server,
        generator,
        _dirs: (context_dir, checkpoint_dir),
    }
}

fn start_job_body(text: &str) -> Value {
    json!({
        "identifier_from_purchaser": "user_123",
        "input_data": { "text": text }
    })
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = test_app(None);
    let response = app.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn availability_carries_identifier_and_stats() {
    let app = test_app(None);
    let body = app.server.get("/availability").await.json::<Value>();
    assert_eq!(body["status"], "available");
    assert_eq!(body["agentIdentifier"], "agent_test_identifier");
    assert!(body["governor"]["limit_per_minute"].is_number());
    assert!(body["cache"]["hits"].is_number());
}

#[tokio::test]
async fn input_schema_declares_length_bounds() {
    let app = test_app(None);
    let body = app.server.get("/input_schema").await.json::<Value>();
    let text_field = &body["input_data"][0];
    assert_eq!(text_field["id"], "text");
    assert_eq!(text_field["data"]["validation"]["min_length"], 10);
    assert_eq!(text_field["data"]["validation"]["max_length"], 5000);
}

#[tokio::test]
async fn unpaid_start_job_runs_inline_and_completes() {
    let app = test_app(None);
    let response = app
        .server
        .post("/start_job")
        .json(&start_job_body("Build a task management app for remote teams"))
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["status"], "completed");
    let result = body["result"].as_str().unwrap();
    assert!(result.contains("## 1. Role"));
    assert_eq!(app.generator.calls(), 7);

    let job_id = body["job_id"].as_str().unwrap();
    let status = app
        .server
        .get("/status")
        .add_query_param("job_id", job_id)
        .await
        .json::<Value>();
    assert_eq!(status["status"], "completed");
    assert!(status["result"].as_str().unwrap().contains("## 1. Role"));
}

#[tokio::test]
async fn too_short_text_is_rejected_without_model_calls() {
    let app = test_app(None);
    let response = app.server.post("/start_job").json(&start_job_body("App")).await;
    response.assert_status_bad_request();

    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["kind"], "validation_error");
    assert_eq!(body["error"]["retry_recommended"], false);
    assert_eq!(app.generator.calls(), 0);
}

#[tokio::test]
async fn missing_text_is_a_bad_request() {
    let app = test_app(None);
    let response = app
        .server
        .post("/start_job")
        .json(&json!({
            "identifier_from_purchaser": "user_123",
            "input_data": {}
        }))
        .await;
    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"]["kind"], "bad_request");
}

#[tokio::test]
async fn unknown_job_status_is_404() {
    let app = test_app(None);
    let response = app
        .server
        .get("/status")
        .add_query_param("job_id", "does-not-exist")
        .await;
    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["error"]["kind"], "not_found");
}

#[tokio::test]
async fn provide_input_merges_into_existing_job() {
    let app = test_app(None);
    let started = app
        .server
        .post("/start_job")
        .json(&start_job_body("Build a task management app for remote teams"))
        .await
        .json::<Value>();
    let job_id = started["job_id"].as_str().unwrap();

    let response = app
        .server
        .post("/provide_input")
        .json(&json!({
            "job_id": job_id,
            "input_data": { "notes": "prefer kanban terminology" }
        }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["success"], true);

    let missing = app
        .server
        .post("/provide_input")
        .json(&json!({ "job_id": "nope", "input_data": {} }))
        .await;
    missing.assert_status_not_found();
}

struct FakePaymentClient;

#[async_trait]
impl PaymentClient for FakePaymentClient {
    async fn create_payment_request(
        &self,
        _identifier_from_purchaser: &str,
        _input_data: &HashMap<String, String>,
    ) -> Result<PaymentRequest, PaymentError> {
        Ok(PaymentRequest {
            blockchain_identifier: "bchain_123".to_string(),
            pay_by_time: "2026-09-01T00:00:00Z".to_string(),
        })
    }

    async fn check_payment_status(
        &self,
        _blockchain_identifier: &str,
    ) -> Result<PaymentStatus, PaymentError> {
        Ok(PaymentStatus::Pending)
    }

    async fn complete_payment(
        &self,
        _blockchain_identifier: &str,
        _result_hash: &str,
    ) -> Result<(), PaymentError> {
        Ok(())
    }
}

#[tokio::test]
async fn paid_start_job_awaits_payment_without_running_the_pipeline() {
    let app = test_app(Some(Arc::new(FakePaymentClient)));
    let response = app
        .server
        .post("/start_job")
        .json(&start_job_body("Build a task management app for remote teams"))
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["status"], "success");
    assert_eq!(body["blockchainIdentifier"], "bchain_123");
    assert!(body["payByTime"].is_string());
    assert_eq!(app.generator.calls(), 0);

    let job_id = body["job_id"].as_str().unwrap();
    let status = app
        .server
        .get("/status")
        .add_query_param("job_id", job_id)
        .await
        .json::<Value>();
    assert_eq!(status["status"], "awaiting_payment");
    assert_eq!(status["payment_status"], "pending");
}

struct FailingPaymentClient;

#[async_trait]
impl PaymentClient for FailingPaymentClient {
    async fn create_payment_request(
        &self,
        _identifier_from_purchaser: &str,
        _input_data: &HashMap<String, String>,
    ) -> Result<PaymentRequest, PaymentError> {
        Err(PaymentError::Request("connection refused".to_string()))
    }

    async fn check_payment_status(
        &self,
        _blockchain_identifier: &str,
    ) -> Result<PaymentStatus, PaymentError> {
        Err(PaymentError::Request("connection refused".to_string()))
    }

    async fn complete_payment(
        &self,
        _blockchain_identifier: &str,
        _result_hash: &str,
    ) -> Result<(), PaymentError> {
        Err(PaymentError::Request("connection refused".to_string()))
    }
}

#[tokio::test]
async fn payment_failure_falls_through_to_unpaid_execution() {
    let app = test_app(Some(Arc::new(FailingPaymentClient)));
    let response = app
        .server
        .post("/start_job")
        .json(&start_job_body("Build a task management app for remote teams"))
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["status"], "completed");
    assert_eq!(app.generator.calls(), 7);
}
