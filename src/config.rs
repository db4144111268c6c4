// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Settings are read from a YAML file. Every field has a default so a
//! partial (or missing) file still yields a usable configuration.

use crate::models::project::Environment;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "solar-admin.yaml";

/// Environment variable that overrides the configuration path.
pub const CONFIG_ENV_VAR: &str = "SOLAR_ADMIN_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root directory of the local object store; one subdirectory per bucket.
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,
    #[serde(default)]
    pub default_environment: Environment,
    #[serde(default)]
    pub environments: Environments,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_secs: u64,
    /// Model weights handed to the inference job.
    #[serde(default = "default_model_uri")]
    pub model_uri: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environments {
    #[serde(default = "EnvironmentConfig::dev")]
    pub dev: EnvironmentConfig,
    #[serde(default = "EnvironmentConfig::prod")]
    pub prod: EnvironmentConfig,
}

/// Buckets and batch resources of one environment. Empty means unset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub groundtruth_bucket: String,
    #[serde(default)]
    pub orthos_bucket: String,
    #[serde(default)]
    pub reports_bucket: String,
    #[serde(default)]
    pub job_queue: String,
    #[serde(default)]
    pub inference_job_definition: String,
    #[serde(default)]
    pub report_job_definition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_users_file")]
    pub users_file: PathBuf,
    #[serde(default = "default_admin_group")]
    pub admin_group: String,
}

/// Tunables shared by both annotation editors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Boxes narrower or shorter than this (image pixels) are discarded.
    #[serde(default = "default_min_box_size")]
    pub min_box_size: f64,
    /// Fraction of the viewport the image fills after a reset.
    #[serde(default = "default_fit_margin")]
    pub fit_margin: f64,
    /// Zoom bounds, relative to the fit scale.
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,
    /// Wheel zoom factor is `wheel_zoom_base ^ delta_y`.
    #[serde(default = "default_wheel_zoom_base")]
    pub wheel_zoom_base: f64,
    #[serde(default = "default_button_zoom_step")]
    pub button_zoom_step: f64,
    /// Grab radius of vertex and corner handles, in display pixels.
    #[serde(default = "default_handle_radius")]
    pub handle_radius: f64,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_signed_url_ttl() -> u64 {
    3600
}

fn default_model_uri() -> String {
    "s3://solar-ai-training/models/model_final.pth".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_users_file() -> PathBuf {
    PathBuf::from("users.yaml")
}

fn default_admin_group() -> String {
    "admin".to_string()
}

fn default_min_box_size() -> f64 {
    10.0
}

fn default_fit_margin() -> f64 {
    0.9
}

fn default_min_zoom() -> f64 {
    0.1
}

fn default_max_zoom() -> f64 {
    20.0
}

fn default_wheel_zoom_base() -> f64 {
    0.999
}

fn default_button_zoom_step() -> f64 {
    1.2
}

fn default_handle_radius() -> f64 {
    8.0
}

impl EnvironmentConfig {
    fn named(env: Environment) -> Self {
        let suffix = env.as_str();
        Self {
            groundtruth_bucket: format!("solar-groundtruth-{}", suffix),
            orthos_bucket: format!("solar-orthos-{}", suffix),
            reports_bucket: format!("solar-reports-{}", suffix),
            job_queue: format!("solar-jobs-{}", suffix),
            inference_job_definition: format!("solar-inference-{}", suffix),
            report_job_definition: format!("solar-report-{}", suffix),
        }
    }

    fn dev() -> Self {
        Self::named(Environment::Dev)
    }

    fn prod() -> Self {
        Self::named(Environment::Prod)
    }
}

impl Default for Environments {
    fn default() -> Self {
        Self {
            dev: EnvironmentConfig::dev(),
            prod: EnvironmentConfig::prod(),
        }
    }
}

impl Environments {
    pub fn get(&self, env: Environment) -> &EnvironmentConfig {
        match env {
            Environment::Dev => &self.dev,
            Environment::Prod => &self.prod,
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            users_file: default_users_file(),
            admin_group: default_admin_group(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_box_size: default_min_box_size(),
            fit_margin: default_fit_margin(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            wheel_zoom_base: default_wheel_zoom_base(),
            button_zoom_step: default_button_zoom_step(),
            handle_radius: default_handle_radius(),
        }
    }
}

/// Value if `valid`, otherwise the default with a warning.
fn checked(name: &str, value: f64, default: f64, valid: bool) -> f64 {
    if valid {
        value
    } else {
        log::warn!("editor.{} = {} is out of range, using {}", name, value, default);
        default
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl EditorConfig {
    /// Replace settings the viewport cannot work with by their defaults.
    pub fn validated(self) -> Self {
        let defaults = Self::default();
        let zoom_ok =
            positive(self.min_zoom) && positive(self.max_zoom) && self.min_zoom <= self.max_zoom;
        Self {
            min_box_size: checked(
                "min_box_size",
                self.min_box_size,
                defaults.min_box_size,
                non_negative(self.min_box_size),
            ),
            fit_margin: checked(
                "fit_margin",
                self.fit_margin,
                defaults.fit_margin,
                positive(self.fit_margin),
            ),
            min_zoom: checked("min_zoom", self.min_zoom, defaults.min_zoom, zoom_ok),
            max_zoom: checked("max_zoom", self.max_zoom, defaults.max_zoom, zoom_ok),
            wheel_zoom_base: checked(
                "wheel_zoom_base",
                self.wheel_zoom_base,
                defaults.wheel_zoom_base,
                positive(self.wheel_zoom_base),
            ),
            button_zoom_step: checked(
                "button_zoom_step",
                self.button_zoom_step,
                defaults.button_zoom_step,
                positive(self.button_zoom_step),
            ),
            handle_radius: checked(
                "handle_radius",
                self.handle_radius,
                defaults.handle_radius,
                non_negative(self.handle_radius),
            ),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_root: default_storage_root(),
            default_environment: Environment::default(),
            environments: Environments::default(),
            identity: IdentityConfig::default(),
            editor: EditorConfig::default(),
            signed_url_ttl_secs: default_signed_url_ttl(),
            model_uri: default_model_uri(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: AppConfig = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.editor = config.editor.validated();
        Ok(config)
    }

    /// Configuration path: `explicit`, then `SOLAR_ADMIN_CONFIG`, then
    /// [`DEFAULT_CONFIG_FILE`].
    pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load the configuration file if it exists.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Resolve a path from the config relative to the config file's directory.
    pub fn resolve(&self, base: Option<&Path>, path: &Path) -> PathBuf {
        match base {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let yaml = "storage_root: /srv/solar\neditor:\n  min_box_size: 1.0\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.storage_root, PathBuf::from("/srv/solar"));
        assert_eq!(config.editor.min_box_size, 1.0);
        assert_eq!(config.editor.fit_margin, 0.9);
        assert_eq!(config.environments.prod.orthos_bucket, "solar-orthos-prod");
        assert_eq!(config.identity.admin_group, "admin");
        assert_eq!(config.default_environment, Environment::Dev);
    }

    #[test]
    fn test_written_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solar-admin.yaml");
        let mut config = AppConfig::default();
        config.default_environment = Environment::Prod;
        config.environments.dev.job_queue.clear();
        std::fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_out_of_range_editor_settings_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solar-admin.yaml");
        let yaml = "editor:\n  min_zoom: 5.0\n  max_zoom: 2.0\n  fit_margin: 0.0\n  \
                    wheel_zoom_base: -1.0\n  button_zoom_step: 1.5\n  min_box_size: 4.0\n";
        std::fs::write(&path, yaml).unwrap();

        let editor = AppConfig::load(&path).unwrap().editor;
        let defaults = EditorConfig::default();
        assert_eq!(editor.min_zoom, defaults.min_zoom);
        assert_eq!(editor.max_zoom, defaults.max_zoom);
        assert_eq!(editor.fit_margin, defaults.fit_margin);
        assert_eq!(editor.wheel_zoom_base, defaults.wheel_zoom_base);
        assert_eq!(editor.button_zoom_step, 1.5);
        assert_eq!(editor.min_box_size, 4.0);
    }

    #[test]
    fn test_validated_keeps_good_settings() {
        let editor = EditorConfig {
            min_zoom: 0.5,
            max_zoom: 0.5,
            min_box_size: 0.0,
            ..EditorConfig::default()
        };
        assert_eq!(editor.validated(), editor);
        let broken = EditorConfig {
            fit_margin: f64::NAN,
            ..EditorConfig::default()
        };
        assert_eq!(broken.validated(), EditorConfig::default());
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_optional(&dir.path().join("absent.yaml")).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "editor: [not, a, map]").unwrap();
        assert!(AppConfig::load_optional(&path).is_err());
    }

    #[test]
    fn test_resolve_relative_paths() {
        let config = AppConfig::default();
        let base = Path::new("/etc/solar");
        assert_eq!(
            config.resolve(Some(base), Path::new("users.yaml")),
            PathBuf::from("/etc/solar/users.yaml")
        );
        assert_eq!(
            config.resolve(Some(base), Path::new("/abs/users.yaml")),
            PathBuf::from("/abs/users.yaml")
        );
    }
}
