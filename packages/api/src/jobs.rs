// ABOUTME: In-memory job store behind the MIP-003 surface
// ABOUTME: Jobs move awaiting_payment to running to completed or failed, never backwards

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use promptforge_pipeline::PipelineOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    AwaitingPayment,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockchain_identifier: Option<String>,
    pub input_data: HashMap<String, String>,
    pub identifier_from_purchaser: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PipelineOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    pub fn new(
        job_id: String,
        status: JobStatus,
        input_data: HashMap<String, String>,
        identifier_from_purchaser: String,
    ) -> Self {
        Self {
            job_id,
            status,
            payment_status: None,
            blockchain_identifier: None,
            input_data,
            identifier_from_purchaser,
            created_at: Utc::now(),
            result: None,
            error: None,
        }
    }
}

/// Shared job table. Mutation goes through [`JobStore::update`] so status
/// transitions stay in one place.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<String, Job>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: Job) {
        self.jobs.write().await.insert(job.job_id.clone(), job);
    }

    pub async fn get(&self, job_id: &str) -> Option<Job> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Applies `mutate` to the job if it exists. Returns false for unknown
    /// ids.
    pub async fn update<F>(&self, job_id: &str, mutate: F) -> bool
    where
        F: FnOnce(&mut Job),
    {
        match self.jobs.write().await.get_mut(job_id) {
            Some(job) => {
                mutate(job);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_transitions_status() {
        let store = JobStore::new();
        store
            .insert(Job::new(
                "j1".to_string(),
                JobStatus::AwaitingPayment,
                HashMap::new(),
                "user_1".to_string(),
            ))
            .await;

        assert!(
            store
                .update("j1", |job| {
                    job.status = JobStatus::Running;
                    job.payment_status = Some("completed".to_string());
                })
                .await
        );
        let job = store.get("j1").await.unwrap();
        assert_eq!(job.status, JobStatus::Running);
    }

    #[tokio::test]
    async fn unknown_job_is_not_updated() {
        let store = JobStore::new();
        assert!(!store.update("missing", |_| {}).await);
        assert!(store.get("missing").await.is_none());
    }
}
