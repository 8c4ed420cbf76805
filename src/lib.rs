#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # Wardrobe Segmentation
//!
//! Splits a full-outfit photograph into per-garment images and suggests
//! clothing categories and style tags for single-garment photos.
//!
//! The pipeline talks to two remote services:
//!
//! - an image-annotation service (object localization and labels)
//! - a background-removal (matting) service
//!
//! Either one may be unconfigured or failing. In that case the affected
//! stage degrades to a deterministic mock or passthrough so a caller always
//! gets a usable answer. Only "no clothing found", usage denial and
//! cancellation are reported as failures.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wardrobe_segment::{ImageRef, PipelineConfig, SegmentationOrchestrator};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = PipelineConfig::from_env()?;
//! let orchestrator = SegmentationOrchestrator::from_config(&config)?;
//!
//! let items = orchestrator.segment(&ImageRef::from("outfit.jpg")).await?;
//! for item in &items {
//!     println!("{} {:.2} -> {}", item.category, item.confidence, item.image_uri());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Recognition of a single garment
//!
//! ```rust,no_run
//! use wardrobe_segment::{create_recognizer, ImageRef, PipelineConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let recognizer = create_recognizer(&PipelineConfig::from_env()?);
//! let photo = ImageRef::from("shirt.jpg");
//! let suggestions = recognizer.recognize(&photo).await?;
//! let tags = recognizer.suggest_tags(&photo).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `tracing-init`: subscriber setup in [`tracing_config`] for applications

pub mod background;
pub mod category;
pub mod config;
pub mod error;
pub mod geometry;
pub mod recognition;
pub mod segmentation;
pub mod services;
pub mod storage;
pub mod tracing_config;
pub mod types;
pub mod usage;

pub use background::{
    create_background_remover, BackgroundRemover, PassthroughRemover, RemoteMattingRemover,
};
pub use category::{is_excluded_label, map_label_to_category};
pub use config::{PipelineConfig, PipelineConfigBuilder, ServiceConfig};
pub use error::{Result, SegmentationError};
pub use geometry::{clamp_to_bounds, to_pixel_rect};
pub use recognition::{
    create_annotation_service, create_recognizer, AnnotationService, ClothingRecognizer, Feature,
    ImageAnnotations, LabelAnnotation, MockRecognizer, Recognizer, VisionClient,
};
pub use segmentation::{
    select_candidates, AcceptedCandidate, SegmentationOrchestrator, SegmentationOrchestratorBuilder,
};
pub use services::{ImageIOService, RegionExtractor};
pub use storage::{save_segmented_items, ClothingStore, JsonFileStore};
#[cfg(feature = "tracing-init")]
pub use tracing_config::init_tracing;
pub use tracing_config::{TracingConfig, TracingFormat};
pub use types::{
    CategorySuggestion, ClothingCategory, ClothingItem, DetectionCandidate, ImageRef,
    NormalizedPoint, NormalizedQuad, PixelRect, SegmentedClothingItem,
};
pub use usage::{SlidingWindowLimiter, UnlimitedUsage, UsageDecision, UsageLimiter};

/// Segment an outfit photo with collaborators created from `config`.
///
/// Convenience for one-off calls; long-lived callers should keep a
/// [`SegmentationOrchestrator`] around instead.
pub async fn segment_outfit(
    image: &ImageRef,
    config: &PipelineConfig,
) -> Result<Vec<SegmentedClothingItem>> {
    SegmentationOrchestrator::from_config(config)?
        .segment(image)
        .await
}
