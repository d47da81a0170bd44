//! Retrying file reader
//!
//! The renderer writes the receipt while the dispatcher may already be
//! trying to read it; the two stages coordinate only through this
//! retry/backoff convention (no lock - the writer's file-system side
//! cannot participate in one). A "file busy" class error sleeps and
//! retries with doubled delay; anything else, or exhaustion, surfaces
//! the underlying error. Callers treat failure as "no attachment
//! available", not as a pipeline abort.

use std::io;
use std::path::Path;
use std::time::Duration;

/// Retry policy for contended reads
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts before the last error is surfaced
    pub max_attempts: u32,
    /// Delay after the first busy error
    pub initial_delay: Duration,
    /// Delay multiplier per subsequent attempt
    pub backoff_multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            backoff_multiplier: 2,
        }
    }
}

/// Classify errors worth retrying ("file is in use" class)
fn is_busy(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }
    match err.raw_os_error() {
        // EAGAIN / EBUSY / ETXTBSY
        #[cfg(unix)]
        Some(code) => matches!(code, 11 | 16 | 26),
        // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
        #[cfg(windows)]
        Some(code) => matches!(code, 32 | 33),
        #[cfg(not(any(unix, windows)))]
        Some(_) => false,
        None => false,
    }
}

/// Retry core, generic over the read attempt
///
/// Separated from the filesystem so contention behavior is testable with
/// injected failures.
pub async fn read_with_retry<F, Fut>(mut attempt: F, policy: RetryPolicy) -> io::Result<Vec<u8>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<Vec<u8>>>,
{
    let mut delay = policy.initial_delay;

    for remaining in (0..policy.max_attempts).rev() {
        match attempt().await {
            Ok(bytes) => return Ok(bytes),
            Err(err) if is_busy(&err) && remaining > 0 => {
                tracing::debug!(
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    remaining,
                    "File busy, backing off before retry"
                );
                tokio::time::sleep(delay).await;
                delay *= policy.backoff_multiplier;
            }
            Err(err) => return Err(err),
        }
    }

    // max_attempts == 0; treat as an immediate failure
    Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        "retry policy allows no attempts",
    ))
}

/// Read a whole file with the default retry policy
///
/// The file is opened read-only without any exclusivity request, so a
/// writer still flushing the same path is tolerated.
pub async fn read_all(path: impl AsRef<Path>) -> io::Result<Vec<u8>> {
    read_all_with(path, RetryPolicy::default()).await
}

/// Read a whole file with an explicit retry policy
pub async fn read_all_with(path: impl AsRef<Path>, policy: RetryPolicy) -> io::Result<Vec<u8>> {
    let path = path.as_ref();
    read_with_retry(|| tokio::fs::read(path), policy).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn busy_error() -> io::Error {
        io::Error::new(io::ErrorKind::WouldBlock, "file is in use")
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_busy_errors() {
        let attempts = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = read_with_retry(
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(busy_error())
                    } else {
                        Ok(b"receipt bytes".to_vec())
                    }
                }
            },
            RetryPolicy::default(),
        )
        .await;

        assert_eq!(result.unwrap(), b"receipt bytes");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // Backoff applied: 100ms after the first failure, 200ms after the second
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_attempts_and_surfaces_error() {
        let attempts = AtomicU32::new(0);

        let result = read_with_retry(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(busy_error()) }
            },
            RetryPolicy::default(),
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_busy_error_fails_immediately() {
        let attempts = AtomicU32::new(0);

        let result = read_with_retry(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(io::Error::new(io::ErrorKind::NotFound, "gone")) }
            },
            RetryPolicy::default(),
        )
        .await;

        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reads_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.pdf");
        tokio::fs::write(&path, b"%PDF-1.4").await.unwrap();

        let bytes = read_all(&path).await.unwrap();
        assert_eq!(bytes, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_all(dir.path().join("missing.pdf")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
