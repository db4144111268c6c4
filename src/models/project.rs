// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project references and pipeline status.
//!
//! A project lives in object storage under `{org}/projects/{project}` in
//! one of two environments. Its progress through the inspection pipeline
//! is read purely from which artifacts exist.

use serde::{Deserialize, Serialize};

/// Deployment environment whose buckets hold a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Prod,
    Dev,
}

impl Environment {
    /// Listing order used by the dashboard.
    pub const ALL: [Environment; 2] = [Environment::Prod, Environment::Dev];

    /// Anything other than `prod` (case-insensitive) is `dev`.
    pub fn normalize(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("prod") {
            Environment::Prod
        } else {
            Environment::Dev
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Prod => "prod",
            Environment::Dev => "dev",
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Dev
    }
}

impl<'de> Deserialize<'de> for Environment {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Environment::normalize(&value))
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub org_id: String,
    pub project_id: String,
    pub environment: Environment,
}

impl ProjectRef {
    pub fn new(
        org_id: impl Into<String>,
        project_id: impl Into<String>,
        environment: Environment,
    ) -> Self {
        Self {
            org_id: org_id.into(),
            project_id: project_id.into(),
            environment,
        }
    }

    /// Key prefix shared by every artifact of the project.
    pub fn prefix(&self) -> String {
        format!("{}/projects/{}", self.org_id, self.project_id)
    }

    /// Object key of an artifact relative to the project prefix.
    pub fn key(&self, relative: &str) -> String {
        format!("{}/{}", self.prefix(), relative)
    }
}

/// Artifact presence flags, one per pipeline checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatus {
    pub has_orthophoto: bool,
    pub has_crop_annotation: bool,
    pub has_inference_results: bool,
    pub has_human_review: bool,
    pub has_report: bool,
}

/// Something a pipeline stage lets the operator do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageAction {
    /// Open the crop-and-rotate editor.
    EditCrop,
    /// Open the defect review editor.
    ReviewDetections,
    /// Submit a backend job.
    Job(JobAction),
}

/// Backend job kinds the dashboard can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    RunInference,
    GenerateReport,
    Release,
}

impl JobAction {
    pub fn id(&self) -> &'static str {
        match self {
            JobAction::RunInference => "run-inference",
            JobAction::GenerateReport => "generate-report",
            JobAction::Release => "release",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "run-inference" => Some(JobAction::RunInference),
            "generate-report" => Some(JobAction::GenerateReport),
            "release" => Some(JobAction::Release),
            _ => None,
        }
    }
}

/// One row of the pipeline view.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStage {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub complete: bool,
    pub action: Option<(&'static str, StageAction)>,
}

/// Build the ordered pipeline from a status snapshot.
pub fn pipeline_stages(status: &ProjectStatus) -> Vec<PipelineStage> {
    vec![
        PipelineStage {
            id: "upload",
            label: "Upload",
            description: "Drone images uploaded",
            complete: true,
            action: None,
        },
        PipelineStage {
            id: "odm",
            label: "ODM Processing",
            description: "Orthophoto generated",
            complete: status.has_orthophoto,
            action: None,
        },
        PipelineStage {
            id: "crop",
            label: "Human Crop & Rotate",
            description: "Define region of interest",
            complete: status.has_crop_annotation,
            action: Some(("Edit Crop", StageAction::EditCrop)),
        },
        PipelineStage {
            id: "inference",
            label: "AI Inference",
            description: "Panel and defect detection",
            complete: status.has_inference_results,
            action: Some(("Run Inference", StageAction::Job(JobAction::RunInference))),
        },
        PipelineStage {
            id: "review",
            label: "Human Review",
            description: "Verify and correct detections",
            complete: status.has_human_review,
            action: Some(("Review Detections", StageAction::ReviewDetections)),
        },
        PipelineStage {
            id: "report",
            label: "Generate Report",
            description: "Create PDF report",
            complete: status.has_report,
            action: Some(("Generate", StageAction::Job(JobAction::GenerateReport))),
        },
        PipelineStage {
            id: "release",
            label: "Release to Client",
            description: "Make available to end user",
            complete: false,
            action: Some(("Release", StageAction::Job(JobAction::Release))),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_normalize() {
        assert_eq!(Environment::normalize("prod"), Environment::Prod);
        assert_eq!(Environment::normalize("PROD"), Environment::Prod);
        assert_eq!(Environment::normalize("staging"), Environment::Dev);
        assert_eq!(Environment::normalize(""), Environment::Dev);
    }

    #[test]
    fn test_environment_deserializes_normalized() {
        let envs: Vec<Environment> = serde_json::from_str(r#"["Prod", "staging", "dev"]"#).unwrap();
        assert_eq!(envs, vec![Environment::Prod, Environment::Dev, Environment::Dev]);
        assert_eq!(serde_json::to_string(&Environment::Prod).unwrap(), r#""prod""#);
    }

    #[test]
    fn test_project_keys() {
        let project = ProjectRef::new("acme-solar", "site-7", Environment::Dev);
        assert_eq!(
            project.key("groundtruth/crop_annotation.json"),
            "acme-solar/projects/site-7/groundtruth/crop_annotation.json"
        );
    }

    #[test]
    fn test_pipeline_stages_follow_status() {
        let status = ProjectStatus {
            has_orthophoto: true,
            has_crop_annotation: true,
            ..Default::default()
        };
        let stages = pipeline_stages(&status);
        assert_eq!(stages.len(), 7);
        assert!(stages[0].complete);
        assert!(stages[1].complete);
        assert!(stages[2].complete);
        assert!(!stages[3].complete);
        assert!(!stages[6].complete);
        assert_eq!(
            stages[3].action.map(|(_, a)| a),
            Some(StageAction::Job(JobAction::RunInference))
        );
    }

    #[test]
    fn test_job_action_ids() {
        for action in [JobAction::RunInference, JobAction::GenerateReport, JobAction::Release] {
            assert_eq!(JobAction::from_id(action.id()), Some(action));
        }
        assert_eq!(JobAction::from_id("explode"), None);
    }
}
