// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pipeline status from artifact presence.

use super::{bucket, keys, require_ids};
use crate::config::EnvironmentConfig;
use crate::error::ServiceError;
use crate::io::storage::{object_exists, ObjectStore};
use crate::models::project::{ProjectRef, ProjectStatus};

/// Check which pipeline artifacts exist. Missing or unreadable objects
/// count as "not reached yet".
pub fn project_status(
    store: &dyn ObjectStore,
    env: &EnvironmentConfig,
    project: &ProjectRef,
) -> Result<ProjectStatus, ServiceError> {
    require_ids(project)?;
    let orthos = bucket(&env.orthos_bucket, "orthos", project)?;
    let groundtruth = bucket(&env.groundtruth_bucket, "groundtruth", project)?;
    let reports = bucket(&env.reports_bucket, "reports", project)?;

    let status = ProjectStatus {
        has_orthophoto: object_exists(store, orthos, &project.key(keys::ORTHOPHOTO))?,
        has_crop_annotation: object_exists(
            store,
            groundtruth,
            &project.key(keys::CROP_ANNOTATION),
        )?,
        has_inference_results: object_exists(
            store,
            reports,
            &project.key(keys::INFERENCE_RESULTS),
        )?,
        has_human_review: object_exists(store, groundtruth, &project.key(keys::HUMAN_REVIEW))?,
        has_report: object_exists(store, reports, &project.key(keys::REPORT))?,
    };
    log::debug!("Status of {}: {:?}", project.prefix(), status);
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environments;
    use crate::io::storage::LocalObjectStore;
    use crate::models::project::Environment;

    #[test]
    fn test_status_tracks_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let envs = Environments::default();
        let env = envs.get(Environment::Dev);
        let project = ProjectRef::new("acme-solar", "site-7", Environment::Dev);

        assert_eq!(project_status(&store, env, &project).unwrap(), ProjectStatus::default());

        store
            .put(&env.orthos_bucket, &project.key(keys::ORTHOPHOTO), b"tif")
            .unwrap();
        store
            .put(&env.reports_bucket, &project.key(keys::INFERENCE_RESULTS), b"[]")
            .unwrap();
        let status = project_status(&store, env, &project).unwrap();
        assert_eq!(
            status,
            ProjectStatus {
                has_orthophoto: true,
                has_inference_results: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_status_needs_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let env = EnvironmentConfig::default();
        let project = ProjectRef::new("acme-solar", "site-7", Environment::Dev);
        assert!(matches!(
            project_status(&store, &env, &project),
            Err(ServiceError::Configuration(_))
        ));
    }
}
