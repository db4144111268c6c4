// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Dashboard services.
//!
//! Thin glue between the UI and the collaborators: object storage, the
//! batch job queue and the identity provider. Every operation takes the
//! collaborators as trait objects so tests can run against local ones.

pub mod annotations;
pub mod auth;
pub mod jobs;
pub mod projects;
pub mod status;

use crate::config::{AppConfig, EnvironmentConfig};
use crate::error::ServiceError;
use crate::io::storage::{LocalObjectStore, ObjectStore};
use crate::models::project::ProjectRef;
use anyhow::Result;
use auth::{IdentityProvider, LocalIdentityProvider};
use jobs::{JobQueue, LocalJobQueue};
use std::path::Path;
use std::sync::Arc;

/// Object keys relative to a project prefix.
pub mod keys {
    /// Orthophoto produced by ODM, in the orthos bucket.
    pub const ORTHOPHOTO: &str = "odm_orthophoto.tif";
    /// Browser-friendly images for the crop editor, first match wins.
    pub const CROP_IMAGE_CANDIDATES: [&str; 3] = [
        "odm_orthophoto.jpg",
        "odm_orthophoto_preview.png",
        "odm_orthophoto/odm_orthophoto_preview.jpg",
    ];
    pub const DEFECT_IMAGE: &str = "odm_orthophoto/odm_orthophoto_1.6cm.jpg";
    /// Groundtruth bucket.
    pub const CROP_ANNOTATION: &str = "groundtruth/crop_annotation.json";
    /// Reports bucket; written by the inference job.
    pub const INFERENCE_RESULTS: &str = "defect_labels.json";
    /// Groundtruth bucket; written by the review editor.
    pub const HUMAN_REVIEW: &str = "groundtruth/defect_labels.json";
    /// Reports bucket.
    pub const REPORT: &str = "thermographic-report/report-lowres.pdf";
}

/// Collaborators shared by every screen. Cheap to clone into worker threads.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn ObjectStore>,
    pub jobs: Arc<dyn JobQueue>,
    pub identity: Arc<dyn IdentityProvider>,
    pub config: Arc<AppConfig>,
}

impl Services {
    /// Local collaborators rooted at the configured storage directory.
    /// Relative paths resolve against `base` (the config file's directory).
    pub fn local(config: AppConfig, base: Option<&Path>) -> Result<Self> {
        let storage_root = config.resolve(base, &config.storage_root);
        let users_file = config.resolve(base, &config.identity.users_file);
        log::info!("Object store rooted at {}", storage_root.display());

        let identity = LocalIdentityProvider::from_file(&users_file)?;
        Ok(Self {
            store: Arc::new(LocalObjectStore::new(&storage_root)),
            jobs: Arc::new(LocalJobQueue::new(storage_root.join(jobs::SPOOL_DIR))),
            identity: Arc::new(identity),
            config: Arc::new(config),
        })
    }

    pub fn environment(&self, project: &ProjectRef) -> &EnvironmentConfig {
        self.config.environments.get(project.environment)
    }
}

/// Both identifiers must be present before any storage access.
pub(crate) fn require_ids(project: &ProjectRef) -> Result<(), ServiceError> {
    if project.org_id.trim().is_empty() {
        return Err(ServiceError::MissingIdentifier("orgId"));
    }
    if project.project_id.trim().is_empty() {
        return Err(ServiceError::MissingIdentifier("projectId"));
    }
    Ok(())
}

/// A configured bucket name, or a configuration error naming it.
pub(crate) fn bucket<'a>(
    name: &'a str,
    what: &str,
    project: &ProjectRef,
) -> Result<&'a str, ServiceError> {
    if name.is_empty() {
        return Err(ServiceError::Configuration(format!(
            "{} bucket for {}",
            what, project.environment
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::Environment;

    #[test]
    fn test_require_ids() {
        assert!(require_ids(&ProjectRef::new("acme-solar", "p1", Environment::Dev)).is_ok());
        assert!(matches!(
            require_ids(&ProjectRef::new("", "p1", Environment::Dev)),
            Err(ServiceError::MissingIdentifier("orgId"))
        ));
        assert!(matches!(
            require_ids(&ProjectRef::new("acme-solar", " ", Environment::Dev)),
            Err(ServiceError::MissingIdentifier("projectId"))
        ));
    }

    #[test]
    fn test_local_services_resolve_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let services = Services::local(AppConfig::default(), Some(dir.path())).unwrap();
        services.store.put("gt", "a/b.json", b"{}").unwrap();
        assert!(dir.path().join("data/gt/a/b.json").exists());
    }
}
