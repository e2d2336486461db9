use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Run a store or remote operation against a time budget. On timeout or
/// error the operation is abandoned (not cancelled at the source) and the
/// caller substitutes a default, so a slow backend degrades to "no data
/// yet" instead of a hang.
pub async fn soft_timeout<T, E, F>(future: F, budget: Duration, label: &str) -> Option<T>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(budget, future).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            warn!("{label} failed: {err}");
            None
        }
        Err(_) => {
            warn!("{label} timed out after {budget:?}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_value_within_budget() {
        let result: Option<i32> =
            soft_timeout(async { Ok::<_, String>(7) }, Duration::from_secs(1), "fast").await;
        assert_eq!(result, Some(7));
    }

    #[tokio::test]
    async fn times_out_to_none() {
        let result: Option<i32> = soft_timeout(
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, String>(7)
            },
            Duration::from_millis(5),
            "slow",
        )
        .await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn errors_degrade_to_none() {
        let result: Option<i32> = soft_timeout(
            async { Err::<i32, _>("boom".to_string()) },
            Duration::from_secs(1),
            "failing",
        )
        .await;
        assert_eq!(result, None);
    }
}
