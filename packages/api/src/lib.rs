// ABOUTME: MIP-003 HTTP layer for PromptForge
// ABOUTME: Wires the pipeline engine, job store and payment client into an axum router

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use promptforge_governor::{RateGovernor, ResponseCache};
use promptforge_pipeline::PipelineEngine;

pub mod handlers;
pub mod jobs;
pub mod payment;
pub mod response;

pub use jobs::{Job, JobStatus, JobStore};
pub use payment::{HttpPaymentClient, PaymentClient, PaymentConfig, PaymentError};
pub use response::{ApiResponse, AppError, ErrorBody};

/// Shared state behind every handler. Cloning is cheap; everything inside
/// is an Arc or an Arc-backed store.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PipelineEngine>,
    pub governor: Arc<RateGovernor>,
    pub cache: Arc<ResponseCache>,
    pub jobs: JobStore,
    /// None when the deployment runs unpaid.
    pub payment: Option<Arc<dyn PaymentClient>>,
    pub agent_identifier: String,
}

impl AppState {
    pub fn new(
        engine: Arc<PipelineEngine>,
        governor: Arc<RateGovernor>,
        cache: Arc<ResponseCache>,
        payment: Option<Arc<dyn PaymentClient>>,
        agent_identifier: String,
    ) -> Self {
        Self {
            engine,
            governor,
            cache,
            jobs: JobStore::new(),
            payment,
            agent_identifier,
        }
    }
}

/// Creates the MIP-003 router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/availability", get(handlers::availability))
        .route("/input_schema", get(handlers::input_schema))
        .route("/start_job", post(handlers::start_job))
        .route("/status", get(handlers::status))
        .route("/provide_input", post(handlers::provide_input))
        .route("/health", get(handlers::health))
        .with_state(state)
}
