use std::time::Duration;

/// Retries an async operation with exponential backoff and a small random
/// jitter. Returns the last error once attempts are exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(
    max_attempts: usize,
    base_backoff: Duration,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let max_attempts = max_attempts.max(1);
    let mut backoff = base_backoff;

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt == max_attempts => return Err(e),
            Err(_) => {
                let jitter_ms = rand::random::<u64>() % (backoff.as_millis() as u64 / 2 + 1);
                tokio::time::sleep(backoff + Duration::from_millis(jitter_ms)).await;
                backoff = std::cmp::min(backoff * 2, Duration::from_secs(30));
            }
        }
    }

    unreachable!("loop always returns on the last attempt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let counter = AtomicUsize::new(0);

        let result: Result<usize, &'static str> =
            retry_with_backoff(3, Duration::from_millis(1), || async {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err("transient")
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(assert_ok!(result), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let counter = AtomicUsize::new(0);

        let result: Result<(), &'static str> =
            retry_with_backoff(2, Duration::from_millis(1), || async {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("always fails")
            })
            .await;

        assert_err!(result);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
