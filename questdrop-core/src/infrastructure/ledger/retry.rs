use crate::foundation::{QuestDropError, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry an async operation with jittered delay. Only transient errors are
/// retried; everything else (retryable-unknown, validation, fatal) propagates
/// immediately so callers never blindly resubmit a mutation.
pub async fn retry<F, Fut, T>(mut attempts: usize, delay: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;
    while attempts > 0 {
        match op().await {
            Ok(v) => return Ok(v),
            Err(err) if err.is_transient() => {
                last_err = Some(err);
                attempts -= 1;
                if attempts > 0 {
                    let jitter_ms = rand::thread_rng().gen_range(0..=(delay.as_millis() as u64 / 2));
                    sleep(delay + Duration::from_millis(jitter_ms)).await;
                }
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_err.unwrap_or_else(|| QuestDropError::Message("retry exhausted".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn retries_transient_until_success() {
        let calls = AtomicUsize::new(0);
        let result = retry(3, Duration::from_millis(1), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(QuestDropError::LedgerUnavailable { operation: "q".into(), details: "down".into() })
            } else {
                Ok(7u32)
            }
        })
        .await;
        assert_eq!(result.expect("eventually succeeds"), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_unknown_outcomes() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry(3, Duration::from_millis(1), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(QuestDropError::SealDeadlineExpired { tx_id: "ab".into(), waited_ms: 1 })
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
