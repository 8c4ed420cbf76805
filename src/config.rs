//! Configuration types for the segmentation pipeline

use crate::error::{Result, SegmentationError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default annotate endpoint for label and object detection
pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Default background removal endpoint
pub const DEFAULT_MATTING_ENDPOINT: &str = "https://api.remove.bg/v1.0/removebg";

/// Environment variable holding the vision credential
pub const VISION_KEY_ENV: &str = "WARDROBE_VISION_API_KEY";

/// Environment variable holding the matting credential
pub const MATTING_KEY_ENV: &str = "WARDROBE_REMOVE_BG_API_KEY";

/// Environment variable overriding the artifact directory
pub const ARTIFACT_DIR_ENV: &str = "WARDROBE_ARTIFACT_DIR";

const PLACEHOLDER_MARKERS: &[&str] = &["your_", "your-", "placeholder", "changeme", "<api"];

/// Whether a credential value is a template placeholder rather than a key
#[must_use]
pub fn is_placeholder_credential(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    lower.is_empty() || PLACEHOLDER_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Credential and endpoint of one remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    pub endpoint: String,
}

impl ServiceConfig {
    #[must_use]
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        Self {
            api_key: None,
            endpoint: endpoint.into(),
        }
    }

    /// Usable credential, if any. Empty and placeholder keys count as absent.
    #[must_use]
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !is_placeholder_credential(key))
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.credential().is_some()
    }
}

/// Configuration for recognition, segmentation and background removal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Label and object localization service
    pub vision: ServiceConfig,

    /// Background removal (matting) service
    pub matting: ServiceConfig,

    /// Directory receiving crops and background-removed artifacts
    pub artifact_dir: PathBuf,

    /// Minimum detection score kept by the orchestrator (inclusive)
    pub confidence_threshold: f32,

    /// Maximum localized objects requested per call
    pub max_localized_objects: u32,

    /// Maximum whole-image labels requested per call
    pub max_labels: u32,

    /// Client-side timeout for the recognition call
    pub recognition_timeout_secs: u64,

    /// Client-side timeout for each background removal call
    pub matting_timeout_secs: u64,

    /// Simulated latency of the mock segmentation result
    pub mock_latency_ms: u64,

    /// Simulated latency of the passthrough background remover
    pub mock_removal_latency_ms: u64,

    /// Run per-item background removal concurrently
    pub parallel_background_removal: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            vision: ServiceConfig::new(DEFAULT_VISION_ENDPOINT),
            matting: ServiceConfig::new(DEFAULT_MATTING_ENDPOINT),
            artifact_dir: default_artifact_dir(),
            confidence_threshold: 0.3,
            max_localized_objects: 15,
            max_labels: 20,
            recognition_timeout_secs: 45,
            matting_timeout_secs: 30,
            mock_latency_ms: 2000,
            mock_removal_latency_ms: 1000,
            parallel_background_removal: false,
        }
    }
}

/// Artifact directory from the environment, else the user cache directory
fn default_artifact_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(ARTIFACT_DIR_ENV) {
        return PathBuf::from(dir);
    }

    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("wardrobe-segment")
        .join("artifacts")
}

impl PipelineConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    ///
    /// ```rust
    /// use wardrobe_segment::PipelineConfig;
    ///
    /// let config = PipelineConfig::builder()
    ///     .confidence_threshold(0.4)
    ///     .mock_latency_ms(0)
    ///     .build()
    ///     .unwrap();
    /// assert!(!config.vision.is_configured());
    /// ```
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Default configuration with credentials taken from the environment
    ///
    /// # Errors
    /// - Resulting configuration fails validation
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.vision.api_key = std::env::var(VISION_KEY_ENV).ok();
        config.matting.api_key = std::env::var(MATTING_KEY_ENV).ok();
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file; missing fields take defaults
    ///
    /// # Errors
    /// - File cannot be read
    /// - File is not valid JSON for this type
    /// - Resulting configuration fails validation
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SegmentationError::file_io_error("read config file", path, &e))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn recognition_timeout(&self) -> Duration {
        Duration::from_secs(self.recognition_timeout_secs)
    }

    #[must_use]
    pub fn matting_timeout(&self) -> Duration {
        Duration::from_secs(self.matting_timeout_secs)
    }

    #[must_use]
    pub fn mock_latency(&self) -> Duration {
        Duration::from_millis(self.mock_latency_ms)
    }

    #[must_use]
    pub fn mock_removal_latency(&self) -> Duration {
        Duration::from_millis(self.mock_removal_latency_ms)
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - Confidence threshold outside 0.0-1.0
    /// - Zero result limits
    /// - Zero timeouts
    /// - Empty service endpoints
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(SegmentationError::config_value_error(
                "confidence threshold",
                self.confidence_threshold,
                "0.0-1.0",
                Some(0.3),
            ));
        }

        if self.max_localized_objects == 0 {
            return Err(SegmentationError::config_value_error(
                "max localized objects",
                self.max_localized_objects,
                "1 or more",
                Some(15),
            ));
        }

        if self.max_labels == 0 {
            return Err(SegmentationError::config_value_error(
                "max labels",
                self.max_labels,
                "1 or more",
                Some(20),
            ));
        }

        if self.recognition_timeout_secs == 0 {
            return Err(SegmentationError::config_value_error(
                "recognition timeout",
                self.recognition_timeout_secs,
                "1 or more seconds",
                Some(45),
            ));
        }

        if self.matting_timeout_secs == 0 {
            return Err(SegmentationError::config_value_error(
                "matting timeout",
                self.matting_timeout_secs,
                "1 or more seconds",
                Some(30),
            ));
        }

        for (name, service) in [("vision", &self.vision), ("matting", &self.matting)] {
            if service.endpoint.trim().is_empty() {
                return Err(SegmentationError::invalid_config(format!(
                    "{} endpoint must not be empty",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// Builder for `PipelineConfig`
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    #[must_use]
    pub fn vision_api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.config.vision.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn vision_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.config.vision.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn matting_api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.config.matting.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn matting_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.config.matting.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn artifact_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.artifact_dir = dir.into();
        self
    }

    #[must_use]
    pub fn confidence_threshold(mut self, threshold: f32) -> Self {
        self.config.confidence_threshold = threshold;
        self
    }

    #[must_use]
    pub fn max_localized_objects(mut self, max: u32) -> Self {
        self.config.max_localized_objects = max;
        self
    }

    #[must_use]
    pub fn max_labels(mut self, max: u32) -> Self {
        self.config.max_labels = max;
        self
    }

    #[must_use]
    pub fn recognition_timeout_secs(mut self, secs: u64) -> Self {
        self.config.recognition_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn matting_timeout_secs(mut self, secs: u64) -> Self {
        self.config.matting_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn mock_latency_ms(mut self, ms: u64) -> Self {
        self.config.mock_latency_ms = ms;
        self
    }

    #[must_use]
    pub fn mock_removal_latency_ms(mut self, ms: u64) -> Self {
        self.config.mock_removal_latency_ms = ms;
        self
    }

    #[must_use]
    pub fn parallel_background_removal(mut self, parallel: bool) -> Self {
        self.config.parallel_background_removal = parallel;
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// - Any rule of [`PipelineConfig::validate`] fails
    pub fn build(self) -> Result<PipelineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert!((config.confidence_threshold - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.max_localized_objects, 15);
        assert_eq!(config.max_labels, 20);
        assert_eq!(config.matting_timeout(), Duration::from_secs(30));
        assert_eq!(config.vision.endpoint, DEFAULT_VISION_ENDPOINT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_placeholder_credentials_are_absent() {
        for key in ["", "   ", "YOUR_GOOGLE_VISION_API_KEY", "your-api-key-here", "PLACEHOLDER", "changeme"] {
            let mut service = ServiceConfig::new(DEFAULT_VISION_ENDPOINT);
            service.api_key = Some(key.to_string());
            assert!(!service.is_configured(), "{key:?} should not count as configured");
        }

        let mut service = ServiceConfig::new(DEFAULT_VISION_ENDPOINT);
        service.api_key = Some(" AIzaSyExampleKey123 ".to_string());
        assert_eq!(service.credential(), Some("AIzaSyExampleKey123"));
    }

    #[test]
    fn test_builder_validation() {
        assert!(PipelineConfig::builder().confidence_threshold(1.5).build().is_err());
        assert!(PipelineConfig::builder().confidence_threshold(-0.1).build().is_err());
        assert!(PipelineConfig::builder().max_labels(0).build().is_err());
        assert!(PipelineConfig::builder().matting_timeout_secs(0).build().is_err());
        assert!(PipelineConfig::builder().vision_endpoint("  ").build().is_err());

        let config = PipelineConfig::builder()
            .confidence_threshold(0.0)
            .vision_api_key("real-key")
            .build()
            .unwrap();
        assert!(config.vision.is_configured());
        assert!(!config.matting.is_configured());
    }

    #[test]
    fn test_json_with_missing_fields_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(
            &path,
            r#"{ "confidence_threshold": 0.5, "vision": { "api_key": "k", "endpoint": "http://localhost:9000" } }"#,
        )
        .unwrap();

        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert!((config.confidence_threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.vision.credential(), Some("k"));
        assert_eq!(config.matting.endpoint, DEFAULT_MATTING_ENDPOINT);
        assert_eq!(config.max_localized_objects, 15);
    }

    #[test]
    fn test_json_with_invalid_threshold_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{ "confidence_threshold": 2.0 }"#).unwrap();

        let err = PipelineConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, SegmentationError::InvalidConfig(_)));
    }
}
