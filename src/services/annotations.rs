// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation load and save for the two editors.

use super::{bucket, keys, require_ids};
use crate::config::EnvironmentConfig;
use crate::error::ServiceError;
use crate::io::serialization::{
    box_file_from_request, BoxAnnotationFile, CropSessionPayload, DefectSessionPayload,
    SaveBoxesRequest,
};
use crate::io::storage::{object_exists, read_json, write_json, ObjectStore};
use crate::models::annotation::CropAnnotations;
use crate::models::project::ProjectRef;

/// Image URL plus the best available boxes: human-reviewed labels if they
/// exist, else the inference output, else nothing.
pub fn load_defect_session(
    store: &dyn ObjectStore,
    env: &EnvironmentConfig,
    project: &ProjectRef,
    ttl_secs: u64,
) -> Result<DefectSessionPayload, ServiceError> {
    require_ids(project)?;
    let orthos = bucket(&env.orthos_bucket, "orthos", project)?;
    let groundtruth = bucket(&env.groundtruth_bucket, "groundtruth", project)?;
    let reports = bucket(&env.reports_bucket, "reports", project)?;

    let image_url = store.signed_read_url(orthos, &project.key(keys::DEFECT_IMAGE), ttl_secs)?;

    let reviewed: Option<BoxAnnotationFile> =
        read_json(store, groundtruth, &project.key(keys::HUMAN_REVIEW))?;
    let annotations = match reviewed {
        Some(file) => {
            log::info!("Loaded reviewed labels for {}", project.prefix());
            vec![file]
        }
        None => {
            let inferred: Option<serde_json::Value> =
                read_json(store, reports, &project.key(keys::INFERENCE_RESULTS))?;
            inferred
                .map(|value| inference_files(value, project))
                .unwrap_or_default()
        }
    };

    Ok(DefectSessionPayload { image_url, annotations })
}

/// Inference output is only used when it is a non-empty list of box files.
fn inference_files(value: serde_json::Value, project: &ProjectRef) -> Vec<BoxAnnotationFile> {
    if !value.as_array().is_some_and(|items| !items.is_empty()) {
        log::warn!(
            "Ignoring inference results for {}: not a non-empty list",
            project.prefix()
        );
        return Vec::new();
    }
    match serde_json::from_value::<Vec<BoxAnnotationFile>>(value) {
        Ok(files) => {
            log::info!("Loaded inference results for {}", project.prefix());
            files
        }
        Err(e) => {
            log::warn!(
                "Ignoring malformed inference results for {}: {}",
                project.prefix(),
                e
            );
            Vec::new()
        }
    }
}

/// Persist reviewed boxes. `body` must carry a `boundingBoxes` list.
pub fn save_defect_annotations(
    store: &dyn ObjectStore,
    env: &EnvironmentConfig,
    project: &ProjectRef,
    body: serde_json::Value,
) -> Result<String, ServiceError> {
    require_ids(project)?;
    if !body.get("boundingBoxes").is_some_and(|v| v.is_array()) {
        return Err(ServiceError::InvalidPayload("boundingBoxes must be a list".to_string()));
    }
    let request: SaveBoxesRequest =
        serde_json::from_value(body).map_err(|e| ServiceError::InvalidPayload(e.to_string()))?;
    let groundtruth = bucket(&env.groundtruth_bucket, "groundtruth", project)?;

    let count = request.bounding_boxes.len();
    write_json(
        store,
        groundtruth,
        &project.key(keys::HUMAN_REVIEW),
        &box_file_from_request(request),
    )?;
    log::info!("Saved {} annotations for {}", count, project.prefix());
    Ok(format!("Saved {} annotations", count))
}

/// Preview image URL plus the stored crop annotation, or defaults.
pub fn load_crop_session(
    store: &dyn ObjectStore,
    env: &EnvironmentConfig,
    project: &ProjectRef,
    ttl_secs: u64,
) -> Result<CropSessionPayload, ServiceError> {
    require_ids(project)?;
    let orthos = bucket(&env.orthos_bucket, "orthos", project)?;
    let groundtruth = bucket(&env.groundtruth_bucket, "groundtruth", project)?;

    let mut image_key = None;
    for candidate in keys::CROP_IMAGE_CANDIDATES {
        let key = project.key(candidate);
        if object_exists(store, orthos, &key)? {
            image_key = Some(key);
            break;
        }
    }
    let image_key = image_key.ok_or(ServiceError::PreviewImageMissing)?;
    let image_url = store.signed_read_url(orthos, &image_key, ttl_secs)?;

    let crop_key = project.key(keys::CROP_ANNOTATION);
    let annotations = match read_json::<CropAnnotations>(store, groundtruth, &crop_key) {
        Ok(stored) => stored.unwrap_or_default(),
        Err(e) => {
            log::warn!(
                "Unreadable crop annotation for {}, using defaults: {}",
                project.prefix(),
                e
            );
            CropAnnotations::default()
        }
    };

    Ok(CropSessionPayload {
        image_url,
        image_metadata: None,
        annotations,
    })
}

/// Overwrite the crop annotation. `body` must carry a `polygon` list.
pub fn save_crop_annotations(
    store: &dyn ObjectStore,
    env: &EnvironmentConfig,
    project: &ProjectRef,
    body: serde_json::Value,
) -> Result<String, ServiceError> {
    require_ids(project)?;
    if !body.get("polygon").is_some_and(|v| v.is_array()) {
        return Err(ServiceError::InvalidPayload("polygon must be a list".to_string()));
    }
    let crop: CropAnnotations =
        serde_json::from_value(body).map_err(|e| ServiceError::InvalidPayload(e.to_string()))?;
    let groundtruth = bucket(&env.groundtruth_bucket, "groundtruth", project)?;

    write_json(store, groundtruth, &project.key(keys::CROP_ANNOTATION), &crop)?;
    log::info!(
        "Saved crop annotation for {} ({} points)",
        project.prefix(),
        crop.polygon.len()
    );
    Ok("Crop annotations saved".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environments;
    use crate::io::serialization::boxes_from_annotations;
    use crate::io::storage::LocalObjectStore;
    use crate::models::annotation::{DefectLabel, Point};
    use crate::models::project::Environment;
    use serde_json::json;

    struct Fixture {
        _dir: tempfile::TempDir,
        store: LocalObjectStore,
        env: EnvironmentConfig,
        project: ProjectRef,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        Fixture {
            _dir: dir,
            store,
            env: Environments::default().dev,
            project: ProjectRef::new("acme-solar", "site-7", Environment::Dev),
        }
    }

    #[test]
    fn test_unusable_inference_results_load_empty() {
        let f = fixture();
        let key = f.project.key(keys::INFERENCE_RESULTS);
        for stored in [
            json!({"status": "running"}),
            json!([]),
            json!([42, "not a box file"]),
        ] {
            write_json(&f.store, &f.env.reports_bucket, &key, &stored).unwrap();
            let payload = load_defect_session(&f.store, &f.env, &f.project, 60).unwrap();
            assert!(payload.annotations.is_empty(), "{}", stored);
        }
    }

    #[test]
    fn test_defect_load_falls_back_to_inference() {
        let f = fixture();
        let empty = load_defect_session(&f.store, &f.env, &f.project, 60).unwrap();
        assert!(empty.annotations.is_empty());
        assert!(empty.image_url.contains("odm_orthophoto_1.6cm.jpg"));

        let inferred = json!([{"boundingBox": {"boundingBoxes": [
            {"left": 1, "top": 2, "width": 30, "height": 40, "label": "solarpanels"}
        ]}}]);
        write_json(
            &f.store,
            &f.env.reports_bucket,
            &f.project.key(keys::INFERENCE_RESULTS),
            &inferred,
        )
        .unwrap();
        let payload = load_defect_session(&f.store, &f.env, &f.project, 60).unwrap();
        let boxes = boxes_from_annotations(&payload.annotations);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].label, DefectLabel::DefaultPanel);

        // Reviewed labels win once they exist
        let message = save_defect_annotations(
            &f.store,
            &f.env,
            &f.project,
            json!({"boundingBoxes": [
                {"left": 10, "top": 20, "width": 100, "height": 50, "label": "hotspots"},
                {"left": 50, "top": 60, "width": 10, "height": 10, "label": "offlinepanels"}
            ]}),
        )
        .unwrap();
        assert_eq!(message, "Saved 2 annotations");
        let payload = load_defect_session(&f.store, &f.env, &f.project, 60).unwrap();
        let boxes = boxes_from_annotations(&payload.annotations);
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].label, DefectLabel::Hotspots);
    }

    #[test]
    fn test_defect_save_writes_wrapped_file() {
        let f = fixture();
        save_defect_annotations(&f.store, &f.env, &f.project, json!({"boundingBoxes": []}))
            .unwrap();
        let review_key = f.project.key(keys::HUMAN_REVIEW);
        let stored: Option<serde_json::Value> =
            read_json(&f.store, &f.env.groundtruth_bucket, &review_key).unwrap();
        assert_eq!(stored, Some(json!({"boundingBox": {"boundingBoxes": []}})));
    }

    #[test]
    fn test_defect_save_rejects_bad_payloads() {
        let f = fixture();
        for body in [json!({}), json!({"boundingBoxes": "nope"}), json!([1, 2])] {
            assert!(matches!(
                save_defect_annotations(&f.store, &f.env, &f.project, body),
                Err(ServiceError::InvalidPayload(_))
            ));
        }
        let nameless = ProjectRef::new("acme-solar", "", Environment::Dev);
        assert!(matches!(
            save_defect_annotations(&f.store, &f.env, &nameless, json!({"boundingBoxes": []})),
            Err(ServiceError::MissingIdentifier("projectId"))
        ));
    }

    #[test]
    fn test_crop_load_needs_preview() {
        let f = fixture();
        assert!(matches!(
            load_crop_session(&f.store, &f.env, &f.project, 60),
            Err(ServiceError::PreviewImageMissing)
        ));

        f.store
            .put(&f.env.orthos_bucket, &f.project.key(keys::CROP_IMAGE_CANDIDATES[1]), b"png")
            .unwrap();
        f.store
            .put(&f.env.orthos_bucket, &f.project.key(keys::CROP_IMAGE_CANDIDATES[2]), b"jpg")
            .unwrap();
        let payload = load_crop_session(&f.store, &f.env, &f.project, 60).unwrap();
        assert!(payload.image_url.contains("odm_orthophoto_preview.png"));
        assert_eq!(payload.annotations, CropAnnotations::default());
        assert!(payload.image_metadata.is_none());
    }

    #[test]
    fn test_crop_save_and_reload() {
        let f = fixture();
        f.store
            .put(&f.env.orthos_bucket, &f.project.key(keys::CROP_IMAGE_CANDIDATES[0]), b"jpg")
            .unwrap();
        let body = json!({
            "polygon": [{"x": 1, "y": 2}, {"x": 30, "y": 2}, {"x": 30, "y": 40}],
            "rotationLine": {"start": {"x": 0, "y": 0}, "end": {"x": 10, "y": 10}},
            "isDouble": false,
            "isVertical": true,
            "is2H": false
        });
        save_crop_annotations(&f.store, &f.env, &f.project, body).unwrap();
        let payload = load_crop_session(&f.store, &f.env, &f.project, 60).unwrap();
        assert_eq!(payload.annotations.polygon[2], Point::new(30.0, 40.0));
        assert!(payload.annotations.is_vertical);
        assert!(payload.annotations.rotation_line.is_some());

        assert!(matches!(
            save_crop_annotations(&f.store, &f.env, &f.project, json!({"isDouble": true})),
            Err(ServiceError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_corrupt_crop_annotation_reads_as_default() {
        let f = fixture();
        f.store
            .put(&f.env.orthos_bucket, &f.project.key(keys::CROP_IMAGE_CANDIDATES[0]), b"jpg")
            .unwrap();
        f.store
            .put(&f.env.groundtruth_bucket, &f.project.key(keys::CROP_ANNOTATION), b"{broken")
            .unwrap();
        let payload = load_crop_session(&f.store, &f.env, &f.project, 60).unwrap();
        assert_eq!(payload.annotations, CropAnnotations::default());
    }
}
