//! Region extraction for detected garments

use crate::error::{Result, SegmentationError};
use crate::geometry::clamp_to_bounds;
use crate::services::io::ImageIOService;
use crate::types::{ImageRef, PixelRect};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Writes cropped sub-images of a source photo as new PNG artifacts.
///
/// The source is never modified.
#[derive(Debug, Clone)]
pub struct RegionExtractor {
    output_dir: PathBuf,
}

impl RegionExtractor {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Crop an already decoded image.
    ///
    /// The rectangle is clamped to the image first; an origin outside the
    /// image fails with [`SegmentationError::Crop`].
    pub fn crop_image(&self, source: &DynamicImage, rect: PixelRect) -> Result<ImageRef> {
        let clamped = clamp_to_bounds(rect, source.width(), source.height())?;
        let cropped = source.crop_imm(clamped.x, clamped.y, clamped.width, clamped.height);

        let path = ImageIOService::artifact_path(&self.output_dir, "crop");
        ImageIOService::save_png(&cropped, &path)?;
        ImageIOService::verify_artifact(&path)?;

        tracing::debug!(rect = %clamped, path = %path.display(), "wrote crop artifact");
        Ok(ImageRef::new(path))
    }

    /// Crop a shared decoded image on the blocking pool
    pub async fn crop(&self, source: Arc<DynamicImage>, rect: PixelRect) -> Result<ImageRef> {
        let extractor = self.clone();
        tokio::task::spawn_blocking(move || extractor.crop_image(&source, rect))
            .await
            .map_err(|e| SegmentationError::crop(format!("crop task failed: {}", e)))?
    }

    /// Load `image` from disk and crop it
    pub async fn crop_file(&self, image: &ImageRef, rect: PixelRect) -> Result<ImageRef> {
        let path = image.as_path().to_path_buf();
        let source = tokio::task::spawn_blocking(move || ImageIOService::load_image(path))
            .await
            .map_err(|e| SegmentationError::crop(format!("load task failed: {}", e)))??;
        self.crop(Arc::new(source), rect).await
    }
}
