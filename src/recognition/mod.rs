//! Clothing recognition: remote label/object annotation with a deterministic mock
//!
//! Two seams live here:
//! - [`AnnotationService`] is the raw remote call (one HTTP round-trip per image).
//!   The orchestrator uses it for object localization.
//! - [`Recognizer`] answers "what is in this photo" as category suggestions
//!   and tags. [`create_recognizer`] picks [`ClothingRecognizer`] when a
//!   credential is configured and [`MockRecognizer`] otherwise.

pub mod mock;
pub mod vision;

pub use mock::MockRecognizer;
pub use vision::VisionClient;

use crate::category::{is_excluded_label, map_label_to_category};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::services::{with_deadline, ImageIOService};
use crate::types::{CategorySuggestion, DetectionCandidate, ImageRef};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Maximum number of tags derived from real label annotations
const MAX_SUGGESTED_TAGS: usize = 5;

/// Annotation feature kinds understood by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureKind {
    ObjectLocalization,
    LabelDetection,
}

/// One requested feature with its result cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    pub max_results: u32,
}

impl Feature {
    #[must_use]
    pub const fn object_localization(max_results: u32) -> Self {
        Self {
            kind: FeatureKind::ObjectLocalization,
            max_results,
        }
    }

    #[must_use]
    pub const fn label_detection(max_results: u32) -> Self {
        Self {
            kind: FeatureKind::LabelDetection,
            max_results,
        }
    }
}

/// Whole-image label
#[derive(Debug, Clone, PartialEq)]
pub struct LabelAnnotation {
    pub description: String,
    pub score: f32,
}

/// Parsed result of one annotate call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageAnnotations {
    pub labels: Vec<LabelAnnotation>,
    pub objects: Vec<DetectionCandidate>,
}

/// Remote label and object annotation
#[async_trait]
pub trait AnnotationService: Send + Sync {
    /// Annotate encoded image bytes with the requested features
    ///
    /// # Errors
    /// - Network or timeout failures
    /// - Non-success response from the service
    /// - Malformed response payload
    async fn annotate(&self, image: &[u8], features: &[Feature]) -> Result<ImageAnnotations>;
}

/// Category and tag suggestions for a whole photo
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Category guesses ordered by descending confidence
    async fn recognize(&self, image: &ImageRef) -> Result<Vec<CategorySuggestion>>;

    /// Short descriptive tags for the photo
    async fn suggest_tags(&self, image: &ImageRef) -> Result<Vec<String>>;
}

/// Create the annotation service for the configured credential
///
/// # Errors
/// - [`crate::error::SegmentationError::Configuration`] when the credential is missing or a placeholder
/// - HTTP client construction failures
pub fn create_annotation_service(config: &PipelineConfig) -> Result<Arc<dyn AnnotationService>> {
    Ok(Arc::new(VisionClient::new(config)?))
}

/// Create the recognizer variant matching the configuration
#[must_use]
pub fn create_recognizer(config: &PipelineConfig) -> Box<dyn Recognizer> {
    match create_annotation_service(config) {
        Ok(service) => Box::new(ClothingRecognizer::new(service, config)),
        Err(e) => {
            tracing::info!("Using mock recognizer: {}", e);
            Box::new(MockRecognizer)
        },
    }
}

/// Recognizer backed by a remote annotation service.
///
/// Any failure of the remote call is logged and answered by the mock.
pub struct ClothingRecognizer {
    service: Arc<dyn AnnotationService>,
    max_labels: u32,
    max_objects: u32,
    timeout: Duration,
}

impl ClothingRecognizer {
    #[must_use]
    pub fn new(service: Arc<dyn AnnotationService>, config: &PipelineConfig) -> Self {
        Self {
            service,
            max_labels: config.max_labels,
            max_objects: config.max_localized_objects,
            timeout: config.recognition_timeout(),
        }
    }

    async fn fetch(&self, image: &ImageRef) -> Result<ImageAnnotations> {
        let bytes = ImageIOService::read_bytes(image.as_path()).await?;
        let features = [
            Feature::label_detection(self.max_labels),
            Feature::object_localization(self.max_objects),
        ];

        with_deadline("recognition", self.timeout, self.service.annotate(&bytes, &features)).await
    }
}

#[async_trait]
impl Recognizer for ClothingRecognizer {
    #[tracing::instrument(skip(self), fields(image = %image))]
    async fn recognize(&self, image: &ImageRef) -> Result<Vec<CategorySuggestion>> {
        match self.fetch(image).await {
            Ok(annotations) => Ok(suggestions_from_annotations(&annotations)),
            Err(e) => {
                tracing::warn!("Recognition failed, using mock suggestions: {}", e);
                Ok(mock::mock_suggestions(image))
            },
        }
    }

    #[tracing::instrument(skip(self), fields(image = %image))]
    async fn suggest_tags(&self, image: &ImageRef) -> Result<Vec<String>> {
        match self.fetch(image).await {
            Ok(annotations) => {
                let tags = tags_from_labels(&annotations.labels);
                if tags.is_empty() {
                    Ok(mock::mock_tags(image))
                } else {
                    Ok(tags)
                }
            },
            Err(e) => {
                tracing::warn!("Tag suggestion failed, using mock tags: {}", e);
                Ok(mock::mock_tags(image))
            },
        }
    }
}

/// Fold labels and object names into one suggestion per category,
/// keeping the best score and ordering by descending confidence.
#[must_use]
pub fn suggestions_from_annotations(annotations: &ImageAnnotations) -> Vec<CategorySuggestion> {
    let scored = annotations
        .labels
        .iter()
        .map(|label| (label.description.as_str(), label.score))
        .chain(
            annotations
                .objects
                .iter()
                .map(|object| (object.label.as_str(), object.score)),
        );

    let mut suggestions: Vec<CategorySuggestion> = Vec::new();
    for (label, score) in scored {
        let Some(category) = map_label_to_category(label) else {
            continue;
        };
        match suggestions.iter_mut().find(|s| s.category == category) {
            Some(existing) => existing.confidence = existing.confidence.max(score),
            None => suggestions.push(CategorySuggestion {
                category,
                confidence: score,
            }),
        }
    }

    suggestions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    suggestions
}

/// Lower-cased label descriptions usable as tags
#[must_use]
pub fn tags_from_labels(labels: &[LabelAnnotation]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for label in labels {
        if is_excluded_label(&label.description) {
            continue;
        }
        let tag = label.description.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
        if tags.len() == MAX_SUGGESTED_TAGS {
            break;
        }
    }
    tags
}
