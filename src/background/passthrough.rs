//! Identity background remover with simulated latency

use super::BackgroundRemover;
use crate::error::Result;
use crate::types::ImageRef;
use async_trait::async_trait;
use std::time::Duration;

/// Returns its input after a delay; no pixels are changed
#[derive(Debug, Clone)]
pub struct PassthroughRemover {
    latency: Duration,
}

impl PassthroughRemover {
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl BackgroundRemover for PassthroughRemover {
    async fn remove_background(&self, image: &ImageRef) -> Result<ImageRef> {
        tracing::debug!(image = %image, "background removal not configured, returning input");
        tokio::time::sleep(self.latency).await;
        Ok(image.clone())
    }

    fn removes_background(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_returns_input_after_latency() {
        let remover = PassthroughRemover::new(Duration::from_millis(1500));
        let image = ImageRef::from("/tmp/crop.png");

        let started = tokio::time::Instant::now();
        let result = remover.remove_background(&image).await.unwrap();

        assert_eq!(result, image);
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }
}
