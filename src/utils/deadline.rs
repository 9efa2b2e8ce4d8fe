//! Time bounds for storage calls.

use crate::error::AppError;
use serde_json::json;
use std::future::Future;
use std::time::Duration;

/// Awaits `fut`, failing with [`AppError::Unavailable`] once `limit` elapses.
pub async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "Storage call timed out");
            Err(AppError::unavailable(
                "Storage call timed out",
                json!({ "timeout_ms": limit.as_millis() as u64 }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passes_through_result() {
        let ok = bounded(Duration::from_secs(1), async { Ok::<_, AppError>(5) }).await;
        assert_eq!(ok.unwrap(), 5);

        let err = bounded(Duration::from_secs(1), async {
            Err::<i32, _>(AppError::link_not_found())
        })
        .await;
        assert!(matches!(err, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_times_out() {
        let result = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, AppError>(())
        })
        .await;

        assert!(matches!(result, Err(AppError::Unavailable { .. })));
    }
}
