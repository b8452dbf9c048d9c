// ABOUTME: MIP-003 endpoint handlers: availability, schema, job lifecycle, health
// ABOUTME: Success bodies follow the protocol shapes, failures the shared error envelope

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use promptforge_core::{
    DocumentMode, EngineeringRequest, OutputStyle, MAX_DESCRIPTION_LEN, MIN_DESCRIPTION_LEN,
};
use promptforge_pipeline::PipelineError;

use crate::jobs::{Job, JobStatus};
use crate::payment::PaymentStatus;
use crate::response::{ApiResponse, AppError};
use crate::AppState;

/// How often a spawned monitor polls the payment service, and for how long
/// before the job expires unpaid.
const PAYMENT_POLL_INTERVAL: Duration = Duration::from_secs(30);
const PAYMENT_POLL_ATTEMPTS: u32 = 30;

#[derive(Debug, Deserialize)]
pub struct StartJobRequest {
    pub identifier_from_purchaser: String,
    pub input_data: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub job_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ProvideInputRequest {
    pub job_id: String,
    pub input_data: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub status: &'static str,
    #[serde(rename = "agentIdentifier")]
    pub agent_identifier: String,
    pub message: &'static str,
    pub governor: promptforge_governor::GovernorStats,
    pub cache: promptforge_governor::CacheStats,
}

pub async fn availability(State(state): State<AppState>) -> Json<AvailabilityResponse> {
    Json(AvailabilityResponse {
        status: "available",
        agent_identifier: state.agent_identifier.clone(),
        message: "Server operational",
        governor: state.governor.stats(),
        cache: state.cache.stats(),
    })
}

pub async fn input_schema() -> Json<Value> {
    Json(json!({
        "input_data": [
            {
                "id": "text",
                "type": "string",
                "name": "Document Description",
                "data": {
                    "description": "Brief description of the prompt or PRD you need engineered",
                    "placeholder": "e.g., 'Create a prompt for analyzing customer feedback sentiment'",
                    "validation": {
                        "required": true,
                        "min_length": MIN_DESCRIPTION_LEN,
                        "max_length": MAX_DESCRIPTION_LEN
                    }
                }
            },
            {
                "id": "mode",
                "type": "option",
                "name": "Document Mode",
                "data": {
                    "description": "prompt (default) or prd",
                    "values": ["prompt", "prd"],
                    "validation": { "required": false }
                }
            },
            {
                "id": "style",
                "type": "option",
                "name": "Output Style",
                "data": {
                    "description": "structured (default), minimal, or conversational",
                    "values": ["structured", "minimal", "conversational"],
                    "validation": { "required": false }
                }
            }
        ]
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

fn request_from_input(
    input_data: &HashMap<String, String>,
    identifier_from_purchaser: &str,
) -> Result<EngineeringRequest, AppError> {
    let text = input_data
        .get("text")
        .map(String::as_str)
        .unwrap_or_default();
    if text.is_empty() {
        return Err(AppError::BadRequest(
            "Text field required in input_data".to_string(),
        ));
    }

    let mode = match input_data.get("mode") {
        Some(raw) => DocumentMode::from_str(raw).map_err(AppError::BadRequest)?,
        None => DocumentMode::default(),
    };
    let style = match input_data.get("style") {
        Some(raw) => OutputStyle::from_str(raw).map_err(AppError::BadRequest)?,
        None => OutputStyle::default(),
    };

    let request = EngineeringRequest::new(
        text,
        style,
        mode,
        Some(identifier_from_purchaser.to_string()),
    )
    .map_err(PipelineError::Validation)?;
    Ok(request)
}

pub async fn start_job(
    State(state): State<AppState>,
    Json(payload): Json<StartJobRequest>,
) -> Result<Json<Value>, AppError> {
    let request = request_from_input(&payload.input_data, &payload.identifier_from_purchaser)?;
    let job_id = Uuid::new_v4().to_string();
    info!(%job_id, mode = %request.mode, "starting job");

    if let Some(payment) = state.payment.clone() {
        match payment
            .create_payment_request(&payload.identifier_from_purchaser, &payload.input_data)
            .await
        {
            Ok(payment_request) => {
                let mut job = Job::new(
                    job_id.clone(),
                    JobStatus::AwaitingPayment,
                    payload.input_data,
                    payload.identifier_from_purchaser,
                );
                job.payment_status = Some("pending".to_string());
                job.blockchain_identifier =
                    Some(payment_request.blockchain_identifier.clone());
                state.jobs.insert(job).await;

                spawn_payment_monitor(
                    state.clone(),
                    job_id.clone(),
                    request,
                    payment_request.blockchain_identifier.clone(),
                );

                return Ok(Json(json!({
                    "status": "success",
                    "job_id": job_id,
                    "blockchainIdentifier": payment_request.blockchain_identifier,
                    "payByTime": payment_request.pay_by_time,
                })));
            }
            Err(error) => {
                // Keep serving unpaid rather than refusing the job.
                warn!(%error, "payment request failed, executing without payment");
            }
        }
    }

    state
        .jobs
        .insert(Job::new(
            job_id.clone(),
            JobStatus::Running,
            payload.input_data,
            payload.identifier_from_purchaser,
        ))
        .await;

    match state.engine.run(&request).await {
        Ok(outcome) => {
            let result_document = outcome.document.clone();
            state
                .jobs
                .update(&job_id, |job| {
                    job.status = JobStatus::Completed;
                    job.result = Some(outcome);
                })
                .await;
            Ok(Json(json!({
                "status": "completed",
                "job_id": job_id,
                "result": result_document,
            })))
        }
        Err(pipeline_error) => {
            state
                .jobs
                .update(&job_id, |job| {
                    job.status = JobStatus::Failed;
                    job.error = Some(pipeline_error.to_string());
                })
                .await;
            Err(AppError::Pipeline(pipeline_error))
        }
    }
}

/// Polls the payment service until the job's payment confirms or expires,
/// then runs the pipeline and reports the result hash back.
fn spawn_payment_monitor(
    state: AppState,
    job_id: String,
    request: EngineeringRequest,
    blockchain_identifier: String,
) {
    let payment = match state.payment.clone() {
        Some(payment) => payment,
        None => return,
    };

    tokio::spawn(async move {
        for _ in 0..PAYMENT_POLL_ATTEMPTS {
            tokio::time::sleep(PAYMENT_POLL_INTERVAL).await;

            match payment.check_payment_status(&blockchain_identifier).await {
                Ok(PaymentStatus::Confirmed) => {
                    info!(%job_id, "payment confirmed, executing job");
                    state
                        .jobs
                        .update(&job_id, |job| {
                            job.status = JobStatus::Running;
                            job.payment_status = Some("completed".to_string());
                        })
                        .await;

                    match state.engine.run(&request).await {
                        Ok(outcome) => {
                            if let Err(error) = payment
                                .complete_payment(&blockchain_identifier, &outcome.run_id)
                                .await
                            {
                                warn!(%job_id, %error, "payment completion failed");
                            }
                            state
                                .jobs
                                .update(&job_id, |job| {
                                    job.status = JobStatus::Completed;
                                    job.result = Some(outcome);
                                })
                                .await;
                        }
                        Err(pipeline_error) => {
                            error!(%job_id, %pipeline_error, "paid job failed");
                            state
                                .jobs
                                .update(&job_id, |job| {
                                    job.status = JobStatus::Failed;
                                    job.error = Some(pipeline_error.to_string());
                                })
                                .await;
                        }
                    }
                    return;
                }
                Ok(PaymentStatus::Expired) => {
                    warn!(%job_id, "payment expired");
                    state
                        .jobs
                        .update(&job_id, |job| {
                            job.status = JobStatus::Failed;
                            job.payment_status = Some("expired".to_string());
                            job.error = Some("Payment expired before confirmation".to_string());
                        })
                        .await;
                    return;
                }
                Ok(PaymentStatus::Pending) => {}
                Err(error) => {
                    warn!(%job_id, %error, "payment status check failed");
                }
            }
        }

        warn!(%job_id, "payment monitoring window elapsed");
        state
            .jobs
            .update(&job_id, |job| {
                if job.status == JobStatus::AwaitingPayment {
                    job.status = JobStatus::Failed;
                    job.error = Some("Payment not received in time".to_string());
                }
            })
            .await;
    });
}

pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Value>, AppError> {
    let job = state
        .jobs
        .get(&query.job_id)
        .await
        .ok_or_else(|| AppError::JobNotFound(query.job_id.clone()))?;

    Ok(Json(json!({
        "job_id": job.job_id,
        "status": job.status,
        "payment_status": job.payment_status,
        "result": job.result.as_ref().map(|outcome| &outcome.document),
    })))
}

pub async fn provide_input(
    State(state): State<AppState>,
    Json(payload): Json<ProvideInputRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let updated = state
        .jobs
        .update(&payload.job_id, |job| {
            job.input_data.extend(payload.input_data.clone());
        })
        .await;

    if !updated {
        return Err(AppError::JobNotFound(payload.job_id));
    }
    Ok(Json(ApiResponse::success(
        json!({ "message": "Input updated" }),
    )))
}
