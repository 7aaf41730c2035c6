//! Per-call deadline for external services.

use docqa_core::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;

/// Await `call`, failing with `on_timeout(message)` once `limit` elapses.
pub(crate) async fn with_deadline<T, F>(
    limit: Duration,
    what: &str,
    on_timeout: fn(String) -> AppError,
    call: F,
) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("{} timed out after {:?}", what, limit);
            Err(on_timeout(format!("{} timed out after {:?}", what, limit)))
        }
    }
}
