use crate::error::{ConnectionError, Result};
use retry::delay::{jitter, Exponential};
use std::future::Future;
use std::time::Duration;

/// Run `op`, waiting on a jittered exponential backoff between
/// attempts, stopping early once an error's [`ConnectionError::should_retry`]
/// is false. Built over the `retry` crate's delay iterators, expressed
/// as an async function over this crate's error type.
pub async fn with_retry<T, F, Fut>(attempts: usize, base_delay: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delays = Exponential::from_millis(base_delay.as_millis() as u64)
        .map(jitter)
        .take(attempts.max(1) - 1);

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.should_retry() => match delays.next() {
                Some(delay) => tokio::time::sleep(delay).await,
                None => return Err(err),
            },
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(3, Duration::from_millis(1), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(ConnectionError::Timeout)
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_immediately_on_non_retryable_error() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(5, Duration::from_millis(1), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ConnectionError::EmptyResponse)
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
