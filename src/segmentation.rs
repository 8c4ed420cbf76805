//! Outfit segmentation orchestrator
//!
//! Turns one full-outfit photo into a list of categorized garment crops:
//!
//! 1. ask the usage collaborator whether segmentation is allowed
//! 2. localize objects with the annotation service
//! 3. sort by score, drop low scores, non-clothing labels and degenerate boxes
//! 4. crop each survivor, then try to remove its background
//!
//! Every stage returns a `Result`; [`SegmentationOrchestrator::segment`]
//! decides which failures are masked by the mock result. Recoverable
//! service failures are; "nothing recognized", usage denial and
//! cancellation are not.

use crate::background::{create_background_remover, BackgroundRemover};
use crate::category::map_label_to_category;
use crate::config::PipelineConfig;
use crate::error::{Result, SegmentationError};
use crate::geometry::to_pixel_rect;
use crate::recognition::{create_annotation_service, AnnotationService, Feature};
use crate::services::{cancellable, with_deadline, ImageIOService, RegionExtractor};
use crate::tracing_config::spans;
use crate::types::{
    ClothingCategory, DetectionCandidate, ImageRef, PixelRect, SegmentedClothingItem,
};
use crate::usage::{UnlimitedUsage, UsageLimiter};
use futures::future::join_all;
use instant::Instant;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn, Instrument};

/// A detection that passed score, label and geometry filtering
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedCandidate {
    pub label: String,
    pub category: ClothingCategory,
    pub rect: PixelRect,
    pub confidence: f32,
}

/// Sort detections by descending score and keep the usable ones.
///
/// A candidate is kept when its score is at least `threshold`, its label
/// maps to a clothing category and its box covers at least one pixel.
#[must_use]
pub fn select_candidates(
    mut candidates: Vec<DetectionCandidate>,
    image_width: u32,
    image_height: u32,
    threshold: f32,
) -> Vec<AcceptedCandidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    candidates
        .into_iter()
        .filter_map(|candidate| {
            if candidate.score < threshold {
                debug!(label = %candidate.label, score = candidate.score, "below confidence threshold");
                return None;
            }

            let Some(category) = map_label_to_category(&candidate.label) else {
                debug!(label = %candidate.label, "not a clothing label");
                return None;
            };

            match to_pixel_rect(&candidate.normalized_box, image_width, image_height) {
                Ok(rect) => Some(AcceptedCandidate {
                    label: candidate.label,
                    category,
                    rect,
                    confidence: candidate.score,
                }),
                Err(e) => {
                    debug!(label = %candidate.label, "dropping candidate: {}", e);
                    None
                },
            }
        })
        .collect()
}

/// Placeholder result used when the service path is unavailable.
///
/// Both entries point at the uncropped source photo.
#[must_use]
pub fn mock_items(image: &ImageRef) -> Vec<SegmentedClothingItem> {
    vec![
        SegmentedClothingItem {
            category: ClothingCategory::Top,
            crop_uri: image.clone(),
            transparent_image_uri: None,
            bounding_box: PixelRect::new(50, 50, 300, 350),
            confidence: 0.95,
        },
        SegmentedClothingItem {
            category: ClothingCategory::Bottom,
            crop_uri: image.clone(),
            transparent_image_uri: None,
            bounding_box: PixelRect::new(50, 400, 300, 450),
            confidence: 0.92,
        },
    ]
}

/// Sequences annotation, filtering, cropping and background removal
pub struct SegmentationOrchestrator {
    annotator: Option<Arc<dyn AnnotationService>>,
    remover: Arc<dyn BackgroundRemover>,
    extractor: RegionExtractor,
    usage: Arc<dyn UsageLimiter>,
    confidence_threshold: f32,
    max_objects: u32,
    max_labels: u32,
    recognition_timeout: Duration,
    mock_latency: Duration,
    parallel_background_removal: bool,
}

impl SegmentationOrchestrator {
    /// Start a builder; unset collaborators are created from `config`
    #[must_use]
    pub fn builder(config: PipelineConfig) -> SegmentationOrchestratorBuilder {
        SegmentationOrchestratorBuilder {
            config,
            annotator: None,
            remover: None,
            usage: None,
        }
    }

    /// Wire every collaborator from the configuration
    ///
    /// # Errors
    /// - Configuration fails validation
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::builder(config.clone()).build()
    }

    /// Whether the remote annotation path is available
    #[must_use]
    pub fn has_annotation_service(&self) -> bool {
        self.annotator.is_some()
    }

    /// Segment a full-outfit photo into garment crops.
    ///
    /// # Errors
    /// - [`SegmentationError::NoClothingDetected`] when the service answered
    ///   but nothing usable was found
    /// - [`SegmentationError::UsageDenied`] when the usage collaborator refuses
    pub async fn segment(&self, image: &ImageRef) -> Result<Vec<SegmentedClothingItem>> {
        self.segment_with_cancellation(image, &CancellationToken::new())
            .await
    }

    /// [`segment`](Self::segment) that stops at the next suspension point
    /// once `token` is cancelled. No artifact is written after cancellation.
    ///
    /// # Errors
    /// - Everything [`segment`](Self::segment) returns
    /// - [`SegmentationError::Cancelled`]
    #[instrument(skip(self, token), fields(image = %image))]
    pub async fn segment_with_cancellation(
        &self,
        image: &ImageRef,
        token: &CancellationToken,
    ) -> Result<Vec<SegmentedClothingItem>> {
        let started = Instant::now();

        let decision = self.usage.can_use_segmentation().await;
        if !decision.allowed {
            let reason = decision
                .reason
                .unwrap_or_else(|| "segmentation limit reached".to_string());
            info!("Segmentation denied: {}", reason);
            return Err(SegmentationError::UsageDenied(reason));
        }

        let outcome = match &self.annotator {
            Some(annotator) => self.segment_with_service(annotator.as_ref(), image, token).await,
            None => Err(SegmentationError::configuration(
                "vision API key is missing or a placeholder",
            )),
        };

        let items = match outcome {
            Ok(items) => items,
            Err(e) if e.is_recoverable() => {
                warn!("Segmentation service unavailable, using mock result: {}", e);
                self.mock_segmentation(image, token).await?
            },
            Err(e) => return Err(e),
        };

        self.usage.increment_segmentation_count().await;
        info!(
            items = items.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Segmentation finished"
        );
        Ok(items)
    }

    async fn mock_segmentation(
        &self,
        image: &ImageRef,
        token: &CancellationToken,
    ) -> Result<Vec<SegmentedClothingItem>> {
        cancellable(token, async {
            tokio::time::sleep(self.mock_latency).await;
            Ok(mock_items(image))
        })
        .await
    }

    async fn segment_with_service(
        &self,
        annotator: &dyn AnnotationService,
        image: &ImageRef,
        token: &CancellationToken,
    ) -> Result<Vec<SegmentedClothingItem>> {
        let source_path = image.as_path().to_path_buf();
        let source = tokio::task::spawn_blocking(move || ImageIOService::load_image(source_path))
            .await
            .map_err(|e| {
                SegmentationError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("image load task failed: {}", e),
                ))
            })??;
        let source = Arc::new(source);
        let (width, height) = (source.width(), source.height());
        debug!(width, height, "loaded source image");

        let bytes = ImageIOService::read_bytes(image.as_path()).await?;
        let features = [
            Feature::object_localization(self.max_objects),
            Feature::label_detection(self.max_labels),
        ];
        let annotations = cancellable(
            token,
            with_deadline(
                "recognition",
                self.recognition_timeout,
                annotator
                    .annotate(&bytes, &features)
                    .instrument(spans::annotation((width, height), bytes.len())),
            ),
        )
        .await?;

        let detected = annotations.objects.len();
        let accepted = select_candidates(annotations.objects, width, height, self.confidence_threshold);
        info!(detected, accepted = accepted.len(), "filtered detections");

        if accepted.is_empty() {
            return Err(SegmentationError::NoClothingDetected);
        }

        let mut crops = Vec::with_capacity(accepted.len());
        let mut last_crop_error = None;
        for candidate in accepted {
            if token.is_cancelled() {
                return Err(SegmentationError::Cancelled);
            }
            match self.extractor.crop(Arc::clone(&source), candidate.rect).await {
                Ok(crop) => crops.push((candidate, crop)),
                Err(e) => {
                    warn!(label = %candidate.label, "dropping candidate, crop failed: {}", e);
                    last_crop_error = Some(e);
                },
            }
        }

        // Garments were recognized, so an empty result here is a local failure
        if crops.is_empty() {
            return Err(last_crop_error
                .unwrap_or_else(|| SegmentationError::crop("no candidate could be cropped")));
        }

        let items: Vec<SegmentedClothingItem> = if self.parallel_background_removal {
            join_all(
                crops
                    .into_iter()
                    .map(|(candidate, crop)| self.finish_item(candidate, crop, token)),
            )
            .await
            .into_iter()
            .collect::<Result<_>>()?
        } else {
            let mut items = Vec::new();
            for (candidate, crop) in crops {
                items.push(self.finish_item(candidate, crop, token).await?);
            }
            items
        };

        Ok(items)
    }

    /// Try background removal for one crop, keeping the plain crop on failure
    async fn finish_item(
        &self,
        candidate: AcceptedCandidate,
        crop: ImageRef,
        token: &CancellationToken,
    ) -> Result<SegmentedClothingItem> {
        let outcome = self
            .remover
            .remove_background_with_cancellation(&crop, token)
            .instrument(spans::background_removal(&candidate.label))
            .await;
        let transparent_image_uri = match outcome {
            Ok(processed) if self.remover.removes_background() => Some(processed),
            Ok(_) => None,
            Err(SegmentationError::Cancelled) => return Err(SegmentationError::Cancelled),
            Err(e) => {
                warn!(label = %candidate.label, "background removal failed, keeping plain crop: {}", e);
                None
            },
        };

        Ok(SegmentedClothingItem {
            category: candidate.category,
            crop_uri: crop,
            transparent_image_uri,
            bounding_box: candidate.rect,
            confidence: candidate.confidence,
        })
    }
}

/// Builder for [`SegmentationOrchestrator`]
pub struct SegmentationOrchestratorBuilder {
    config: PipelineConfig,
    annotator: Option<Option<Arc<dyn AnnotationService>>>,
    remover: Option<Arc<dyn BackgroundRemover>>,
    usage: Option<Arc<dyn UsageLimiter>>,
}

impl SegmentationOrchestratorBuilder {
    /// Use this annotation service instead of the configured one
    #[must_use]
    pub fn annotation_service(mut self, service: Arc<dyn AnnotationService>) -> Self {
        self.annotator = Some(Some(service));
        self
    }

    /// Never contact an annotation service; always use the mock result
    #[must_use]
    pub fn without_annotation_service(mut self) -> Self {
        self.annotator = Some(None);
        self
    }

    #[must_use]
    pub fn background_remover(mut self, remover: Arc<dyn BackgroundRemover>) -> Self {
        self.remover = Some(remover);
        self
    }

    #[must_use]
    pub fn usage_limiter(mut self, usage: Arc<dyn UsageLimiter>) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Build the orchestrator
    ///
    /// # Errors
    /// - Configuration fails validation
    pub fn build(self) -> Result<SegmentationOrchestrator> {
        let config = self.config;
        config.validate()?;

        let annotator = match self.annotator {
            Some(annotator) => annotator,
            None => match create_annotation_service(&config) {
                Ok(service) => Some(service),
                Err(e) => {
                    info!("Segmentation will use mock results: {}", e);
                    None
                },
            },
        };
        let remover = self
            .remover
            .unwrap_or_else(|| create_background_remover(&config));
        let usage = self.usage.unwrap_or_else(|| Arc::new(UnlimitedUsage));

        Ok(SegmentationOrchestrator {
            annotator,
            remover,
            extractor: RegionExtractor::new(config.artifact_dir.clone()),
            usage,
            confidence_threshold: config.confidence_threshold,
            max_objects: config.max_localized_objects,
            max_labels: config.max_labels,
            recognition_timeout: config.recognition_timeout(),
            mock_latency: config.mock_latency(),
            parallel_background_removal: config.parallel_background_removal,
        })
    }
}
