// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Backend job submission.
//!
//! Inference and report generation run as batch jobs. The dashboard only
//! kicks them off; progress shows up later as pipeline artifacts.

use super::{keys, require_ids};
use crate::config::AppConfig;
use crate::error::ServiceError;
use crate::models::project::{JobAction, ProjectRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Directory under the storage root where [`LocalJobQueue`] spools jobs.
pub const SPOOL_DIR: &str = "_jobs";

/// A job ready to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub queue: String,
    pub definition: String,
    pub job_name: String,
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSubmission {
    pub job_id: String,
    pub job_name: String,
}

/// Batch job collaborator.
pub trait JobQueue: Send + Sync {
    fn submit(&self, request: &JobRequest) -> Result<JobSubmission, ServiceError>;
}

/// Spooled job, as written by [`LocalJobQueue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub job_id: String,
    pub job_name: String,
    pub job_queue: String,
    pub job_definition: String,
    pub environment: BTreeMap<String, String>,
    pub submitted_at: DateTime<Utc>,
}

/// Writes each submission as `<job id>.json` for a local worker to pick up.
#[derive(Debug, Clone)]
pub struct LocalJobQueue {
    spool: PathBuf,
}

impl LocalJobQueue {
    pub fn new(spool: impl Into<PathBuf>) -> Self {
        Self { spool: spool.into() }
    }
}

impl JobQueue for LocalJobQueue {
    fn submit(&self, request: &JobRequest) -> Result<JobSubmission, ServiceError> {
        let record = JobRecord {
            job_id: uuid::Uuid::new_v4().to_string(),
            job_name: request.job_name.clone(),
            job_queue: request.queue.clone(),
            job_definition: request.definition.clone(),
            environment: request.environment.clone(),
            submitted_at: Utc::now(),
        };
        let body =
            serde_json::to_vec_pretty(&record).map_err(|e| ServiceError::Jobs(e.to_string()))?;
        std::fs::create_dir_all(&self.spool)
            .and_then(|_| std::fs::write(self.spool.join(format!("{}.json", record.job_id)), body))
            .map_err(|e| ServiceError::Jobs(format!("{}: {}", self.spool.display(), e)))?;
        Ok(JobSubmission {
            job_id: record.job_id,
            job_name: record.job_name,
        })
    }
}

fn require(value: &str, what: &str) -> Result<String, ServiceError> {
    if value.is_empty() {
        return Err(ServiceError::Configuration(what.to_string()));
    }
    Ok(value.to_string())
}

fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Inference job for a project.
pub fn inference_request(
    config: &AppConfig,
    project: &ProjectRef,
    now_millis: i64,
) -> Result<JobRequest, ServiceError> {
    let env = config.environments.get(project.environment);
    let queue = require(&env.job_queue, "Batch configuration missing")?;
    let definition = require(&env.inference_job_definition, "Batch configuration missing")?;
    let orthophoto_key = project.key(keys::ORTHOPHOTO);
    Ok(JobRequest {
        queue,
        definition,
        job_name: format!("inference-{}-{}", project.project_id, now_millis),
        environment: vars(&[
            ("ORG_ID", project.org_id.as_str()),
            ("PROJECT_ID", project.project_id.as_str()),
            ("SOLAR_PROJECT_ID", project.project_id.as_str()),
            ("SOLAR_ORTHOPHOTO_KEY", orthophoto_key.as_str()),
            ("SOLAR_ORTHOS_BUCKET", env.orthos_bucket.as_str()),
            ("SOLAR_REPORTS_BUCKET", env.reports_bucket.as_str()),
            ("SOLAR_MODEL_S3_URI", config.model_uri.as_str()),
            ("ENVIRONMENT", project.environment.as_str()),
        ]),
    })
}

/// Report generation job for a project.
pub fn report_request(
    config: &AppConfig,
    project: &ProjectRef,
    now_millis: i64,
) -> Result<JobRequest, ServiceError> {
    let env = config.environments.get(project.environment);
    let queue = require(&env.job_queue, "Report job configuration missing")?;
    let definition = require(&env.report_job_definition, "Report job configuration missing")?;
    Ok(JobRequest {
        queue,
        definition,
        job_name: format!("report-{}-{}", project.project_id, now_millis),
        environment: vars(&[
            ("ORG_ID", project.org_id.as_str()),
            ("PROJECT_ID", project.project_id.as_str()),
            ("ENVIRONMENT", project.environment.as_str()),
        ]),
    })
}

/// Run a pipeline action by id (`run-inference`, `generate-report`, `release`).
pub fn trigger_action(
    jobs: &dyn JobQueue,
    config: &AppConfig,
    project: &ProjectRef,
    action_id: &str,
) -> Result<JobSubmission, ServiceError> {
    require_ids(project)?;
    let action = JobAction::from_id(action_id)
        .ok_or_else(|| ServiceError::UnknownAction(action_id.to_string()))?;
    let now = Utc::now().timestamp_millis();
    let request = match action {
        JobAction::RunInference => inference_request(config, project, now)?,
        JobAction::GenerateReport => report_request(config, project, now)?,
        JobAction::Release => return Err(ServiceError::NotImplemented("Release".to_string())),
    };
    let submission = jobs.submit(&request)?;
    log::info!(
        "Submitted {} as {} ({})",
        action_id,
        submission.job_name,
        submission.job_id
    );
    Ok(submission)
}
