//! Background removal strategies
//!
//! - [`RemoteMattingRemover`] uploads the image to a matting service
//! - [`PassthroughRemover`] is used without a credential; it returns the
//!   input unchanged, so callers must not assume transparency

pub mod passthrough;
pub mod remote;

pub use passthrough::PassthroughRemover;
pub use remote::RemoteMattingRemover;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::services::cancellable;
use crate::types::ImageRef;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Produces a transparent-background version of an image
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Return a reference to the processed image
    ///
    /// # Errors
    /// - Timeout or network failures
    /// - Service rejection (message taken from the service when available)
    /// - Result artifact missing or empty
    async fn remove_background(&self, image: &ImageRef) -> Result<ImageRef>;

    /// [`remove_background`](Self::remove_background) that gives up once
    /// `token` is cancelled. Implementations that write artifacts must not
    /// leave one behind after cancellation.
    ///
    /// # Errors
    /// - Everything `remove_background` returns
    /// - [`SegmentationError::Cancelled`](crate::SegmentationError::Cancelled)
    async fn remove_background_with_cancellation(
        &self,
        image: &ImageRef,
        token: &CancellationToken,
    ) -> Result<ImageRef> {
        cancellable(token, self.remove_background(image)).await
    }

    /// Whether results actually have their background removed
    fn removes_background(&self) -> bool;
}

/// Create the remover variant matching the configuration
#[must_use]
pub fn create_background_remover(config: &PipelineConfig) -> Arc<dyn BackgroundRemover> {
    match RemoteMattingRemover::new(config) {
        Ok(remover) => Arc::new(remover),
        Err(e) => {
            tracing::info!("Using passthrough background remover: {}", e);
            Arc::new(PassthroughRemover::new(config.mock_removal_latency()))
        },
    }
}
