//! Client-side time limits for remote calls

use crate::error::{Result, SegmentationError};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Race `future` against `limit`.
///
/// Expiry yields [`SegmentationError::Timeout`] naming `operation`, which
/// callers can tell apart from a service rejection.
pub async fn with_deadline<F, T>(operation: &str, limit: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, seconds = limit.as_secs(), "client-side timeout expired");
            Err(SegmentationError::timeout(operation, limit.as_secs()))
        },
    }
}

/// Race `future` against `token`, preferring cancellation when both are ready
pub async fn cancellable<T, F>(token: &CancellationToken, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        () = token.cancelled() => Err(SegmentationError::Cancelled),
        result = future => result,
    }
}
