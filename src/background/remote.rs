//! Remote matting service client

use super::BackgroundRemover;
use crate::config::PipelineConfig;
use crate::error::{Result, SegmentationError};
use crate::services::{cancellable, with_deadline, ImageIOService};
use crate::types::ImageRef;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SERVICE_NAME: &str = "remove.bg";
const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Deserialize)]
struct MattingErrorBody {
    #[serde(default)]
    errors: Vec<MattingError>,
}

#[derive(Debug, Deserialize)]
struct MattingError {
    #[serde(default)]
    title: String,
}

/// First error title of a matting error response, when present
#[must_use]
pub fn parse_error_title(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<MattingErrorBody>(body)
        .ok()?
        .errors
        .into_iter()
        .map(|e| e.title)
        .find(|title| !title.is_empty())
}

/// Check a 200 response body and write it as a new PNG artifact.
///
/// The body must decode fully as an image. Nothing is written once `token`
/// is cancelled, and an artifact that finished writing after cancellation
/// is removed again. The artifact is verified on disk before its path is
/// returned.
pub async fn persist_result(
    body: &[u8],
    output_dir: &std::path::Path,
    token: &CancellationToken,
) -> Result<ImageRef> {
    if body.is_empty() {
        return Err(SegmentationError::malformed("matting service returned an empty body"));
    }
    let decoded = ImageIOService::load_from_bytes(body)?;
    tracing::trace!(width = decoded.width(), height = decoded.height(), "decoded matting result");

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| SegmentationError::file_io_error("create artifact directory", output_dir, &e))?;

    if token.is_cancelled() {
        return Err(SegmentationError::Cancelled);
    }
    let path = ImageIOService::artifact_path(output_dir, "nobg");
    tokio::fs::write(&path, body)
        .await
        .map_err(|e| SegmentationError::file_io_error("write background-removed image", &path, &e))?;

    if token.is_cancelled() {
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), "could not remove cancelled artifact: {}", e);
        }
        return Err(SegmentationError::Cancelled);
    }
    ImageIOService::verify_artifact(&path)?;

    Ok(ImageRef::new(path))
}

/// Uploads images to a matting service and stores the transparent result
#[derive(Debug, Clone)]
pub struct RemoteMattingRemover {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
    output_dir: PathBuf,
}

impl RemoteMattingRemover {
    /// Create a remover from the pipeline configuration
    ///
    /// # Errors
    /// - [`SegmentationError::Configuration`] when the credential is missing or a placeholder
    /// - Failed to create HTTP client
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let api_key = config.matting.credential().ok_or_else(|| {
            SegmentationError::configuration("matting API key is missing or a placeholder")
        })?;

        let client = Client::builder()
            .build()
            .map_err(|e| SegmentationError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.matting.endpoint.clone(),
            api_key: api_key.to_string(),
            timeout: config.matting_timeout(),
            output_dir: config.artifact_dir.clone(),
        })
    }

    async fn upload(&self, image: &ImageRef) -> Result<Vec<u8>> {
        let bytes = ImageIOService::read_bytes(image.as_path()).await?;
        let file_name = image
            .as_path()
            .file_name()
            .map_or_else(|| "image.png".to_string(), |n| n.to_string_lossy().into_owned());

        let form = Form::new()
            .part("image_file", Part::bytes(bytes).file_name(file_name))
            .text("size", "auto")
            .text("format", "png");

        let timeout_secs = self.timeout.as_secs();
        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SegmentationError::network_error("background removal", &e, timeout_secs))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SegmentationError::network_error("background removal", &e, timeout_secs))?;

        if status != StatusCode::OK {
            let message = parse_error_title(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
            return Err(SegmentationError::rejected(SERVICE_NAME, status.as_u16(), message));
        }

        Ok(body.to_vec())
    }
}

#[async_trait]
impl BackgroundRemover for RemoteMattingRemover {
    async fn remove_background(&self, image: &ImageRef) -> Result<ImageRef> {
        self.remove_background_with_cancellation(image, &CancellationToken::new())
            .await
    }

    #[tracing::instrument(skip(self, token), fields(image = %image))]
    async fn remove_background_with_cancellation(
        &self,
        image: &ImageRef,
        token: &CancellationToken,
    ) -> Result<ImageRef> {
        let upload = with_deadline("background removal", self.timeout, self.upload(image));
        let body = cancellable(token, upload).await?;
        let result = persist_result(&body, &self.output_dir, token).await?;
        tracing::debug!(result = %result, bytes = body.len(), "background removed");
        Ok(result)
    }

    fn removes_background(&self) -> bool {
        true
    }
}
