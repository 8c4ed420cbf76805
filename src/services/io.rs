//! Image I/O operations service
//!
//! File access for source photos and written artifacts is kept here, apart
//! from the pipeline logic, so integrity rules live in one place.

use crate::error::{Result, SegmentationError};
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// Service for reading source images and writing pipeline artifacts
pub struct ImageIOService;

impl ImageIOService {
    /// Load an image from a file path
    ///
    /// Extension-based detection is tried first, then content sniffing.
    ///
    /// # Examples
    /// ```rust,no_run
    /// use wardrobe_segment::services::ImageIOService;
    ///
    /// let image = ImageIOService::load_image("outfit.jpg")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(SegmentationError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                tracing::debug!(
                    "Extension-based loading failed for {}: {}. Attempting content-based detection.",
                    path_ref.display(),
                    e
                );

                let data = std::fs::read(path_ref).map_err(|io_err| {
                    SegmentationError::file_io_error("read image data", path_ref, &io_err)
                })?;

                Self::load_from_bytes(&data)
            },
        }
    }

    /// Decode an image from raw bytes
    pub fn load_from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes).map_err(|e| {
            SegmentationError::malformed(format!("Failed to decode image from bytes: {}", e))
        })
    }

    /// Pixel dimensions of an image file, read from the header when possible
    pub fn dimensions<P: AsRef<Path>>(path: P) -> Result<(u32, u32)> {
        let path_ref = path.as_ref();
        match image::image_dimensions(path_ref) {
            Ok(dims) => Ok(dims),
            Err(e) => {
                tracing::debug!(
                    "Header probe failed for {}: {}. Decoding full image.",
                    path_ref.display(),
                    e
                );
                let img = Self::load_image(path_ref)?;
                Ok((img.width(), img.height()))
            },
        }
    }

    /// Read the raw bytes of an image for upload
    pub async fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        let path_ref = path.as_ref();
        tokio::fs::read(path_ref)
            .await
            .map_err(|e| SegmentationError::file_io_error("read image for upload", path_ref, &e))
    }

    /// Fresh, unique artifact path inside `dir`
    #[must_use]
    pub fn artifact_path(dir: &Path, prefix: &str) -> PathBuf {
        dir.join(format!("{}-{}.png", prefix, uuid::Uuid::new_v4()))
    }

    /// Encode an image as PNG, creating the parent directory when needed
    pub fn save_png<P: AsRef<Path>>(image: &DynamicImage, path: P) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SegmentationError::file_io_error("create artifact directory", parent, &e)
            })?;
        }

        image
            .save_with_format(path_ref, image::ImageFormat::Png)
            .map_err(SegmentationError::from)
    }

    /// Confirm an artifact exists and is non-empty, returning its size
    pub fn verify_artifact<P: AsRef<Path>>(path: P) -> Result<u64> {
        let path_ref = path.as_ref();
        let metadata = std::fs::metadata(path_ref).map_err(|e| {
            SegmentationError::ArtifactIntegrity(format!(
                "'{}' was not written: {}",
                path_ref.display(),
                e
            ))
        })?;

        if metadata.len() == 0 {
            return Err(SegmentationError::ArtifactIntegrity(format!(
                "'{}' is empty",
                path_ref.display()
            )));
        }

        Ok(metadata.len())
    }
}
