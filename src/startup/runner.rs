//! Runs one probe against its deadline.

use std::any::Any;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, error, info};

use super::probe::{Probe, ProbeContext, ProbeError};
use super::report::{ProbeResult, ProbeStatus, RETURNED_FALSE_MESSAGE};

/// Timeout applied to probes that do not set their own
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn join_error_message(err: JoinError) -> String {
    if err.is_panic() {
        let payload = err.into_panic();
        format!("Health check panicked: {}", panic_message(payload.as_ref()))
    } else {
        "Health check task was cancelled".to_string()
    }
}

/// Aborts the wrapped task when dropped, so a cancelled `run` takes its
/// check down with it instead of detaching it.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Executes a single probe and normalizes every outcome into a [`ProbeResult`].
#[derive(Debug, Clone, Copy)]
pub struct ProbeRunner {
    default_timeout: Duration,
}

impl ProbeRunner {
    pub fn new(default_timeout: Duration) -> Result<Self, ProbeError> {
        if default_timeout.is_zero() {
            return Err(ProbeError::InvalidDefaultTimeout);
        }
        Ok(Self { default_timeout })
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Run `probe` to completion or timeout. Never fails.
    ///
    /// The check runs as its own task. If the deadline fires first the task
    /// is aborted and whatever it would have produced is discarded.
    pub async fn run(&self, probe: Probe) -> ProbeResult {
        let (name, critical, timeout, check) = probe.into_parts();
        let timeout = timeout.unwrap_or(self.default_timeout);
        let started = Instant::now();
        let ctx = ProbeContext::new(name.clone(), started, timeout);

        debug!(
            probe = %name,
            critical,
            timeout_ms = timeout.as_millis() as u64,
            "checking dependency"
        );

        let mut task = AbortOnDrop(tokio::spawn(async move { check.check(ctx).await }));

        let result = match tokio::time::timeout(timeout, &mut task.0).await {
            Ok(Ok(Ok(true))) => ProbeResult::healthy(&name, critical, started.elapsed()),
            Ok(Ok(Ok(false))) => {
                ProbeResult::unhealthy(&name, critical, started.elapsed(), RETURNED_FALSE_MESSAGE)
            }
            Ok(Ok(Err(e))) => {
                ProbeResult::unhealthy(&name, critical, started.elapsed(), format!("{:#}", e))
            }
            Ok(Err(join_err)) => ProbeResult::unhealthy(
                &name,
                critical,
                started.elapsed(),
                join_error_message(join_err),
            ),
            Err(_) => {
                task.0.abort();
                ProbeResult::timeout(&name, critical, started.elapsed())
            }
        };

        let duration_ms = result.duration.as_millis() as u64;
        match result.error.as_deref() {
            None => info!(probe = %name, critical, duration_ms, "dependency healthy"),
            Some(reason) if result.status == ProbeStatus::Timeout => error!(
                probe = %name,
                critical,
                duration_ms,
                error = reason,
                "dependency check timed out"
            ),
            Some(reason) => error!(
                probe = %name,
                critical,
                duration_ms,
                error = reason,
                "dependency unhealthy"
            ),
        }

        result
    }
}

impl Default for ProbeRunner {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::startup::report::TIMEOUT_MESSAGE;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn runner() -> ProbeRunner {
        ProbeRunner::new(Duration::from_millis(100)).unwrap()
    }

    #[test]
    fn test_zero_default_timeout_rejected() {
        assert_eq!(
            ProbeRunner::new(Duration::ZERO).unwrap_err(),
            ProbeError::InvalidDefaultTimeout
        );
        assert_eq!(ProbeRunner::default().default_timeout(), DEFAULT_PROBE_TIMEOUT);
    }

    #[tokio::test]
    async fn test_healthy_probe() {
        let probe = Probe::from_fn("environment", |_ctx| async { Ok(true) }).unwrap();
        let result = runner().run(probe).await;

        assert_eq!(result.status, ProbeStatus::Healthy);
        assert_eq!(result.error, None);
        assert!(result.critical);
    }

    #[tokio::test]
    async fn test_false_is_unhealthy() {
        let probe = Probe::from_fn("database", |_ctx| async { Ok(false) })
            .unwrap()
            .critical(false);
        let result = runner().run(probe).await;

        assert_eq!(result.status, ProbeStatus::Unhealthy);
        assert_eq!(result.error.as_deref(), Some("Health check returned false"));
        assert!(!result.critical);
    }

    #[tokio::test]
    async fn test_error_message_is_captured() {
        let probe = Probe::from_fn("storage", |_ctx| async {
            Err(anyhow::anyhow!("bucket 'uploads' does not exist"))
        })
        .unwrap();
        let result = runner().run(probe).await;

        assert_eq!(result.status, ProbeStatus::Unhealthy);
        assert_eq!(
            result.error.as_deref(),
            Some("bucket 'uploads' does not exist")
        );
    }

    #[tokio::test]
    async fn test_error_context_chain_is_kept() {
        let probe = Probe::from_fn("database", |_ctx| async {
            Err(anyhow::anyhow!("connection refused").context("Failed to connect to database"))
        })
        .unwrap();
        let result = runner().run(probe).await;

        assert_eq!(
            result.error.as_deref(),
            Some("Failed to connect to database: connection refused")
        );
    }

    #[tokio::test]
    async fn test_panic_is_captured() {
        let probe = Probe::from_fn("broken", |_ctx| async {
            if true {
                panic!("client exploded");
            }
            Ok(true)
        })
        .unwrap();
        let result = runner().run(probe).await;

        assert_eq!(result.status, ProbeStatus::Unhealthy);
        assert_eq!(
            result.error.as_deref(),
            Some("Health check panicked: client exploded")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_abandons_check() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let probe = Probe::from_fn("llm-provider", move |_ctx| {
            let flag = flag.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(true)
            }
        })
        .unwrap()
        .with_timeout(Duration::from_millis(50))
        .unwrap();

        let result = runner().run(probe).await;

        assert_eq!(result.status, ProbeStatus::Timeout);
        assert_eq!(result.error.as_deref(), Some(TIMEOUT_MESSAGE));
        assert!(result.duration >= Duration::from_millis(50));
        assert!(result.duration < Duration::from_millis(60));

        // The aborted check never gets to run to completion.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_run_aborts_check() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let probe = Probe::from_fn("database", move |_ctx| {
            let flag = flag.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(true)
            }
        })
        .unwrap()
        .with_timeout(Duration::from_secs(30))
        .unwrap();

        // The caller gives up long before the check's own deadline.
        let outer = tokio::time::timeout(Duration::from_millis(10), runner().run(probe)).await;
        assert!(outer.is_err());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_timeout_applies() {
        let probe = Probe::from_fn("slow", |_ctx| async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(true)
        })
        .unwrap();

        let result = runner().run(probe).await;
        assert_eq!(result.status, ProbeStatus::Timeout);
        assert!(result.duration >= Duration::from_millis(100));
        assert!(result.duration < Duration::from_millis(110));
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_carries_deadline() {
        let probe = Probe::from_fn("deadline", |ctx: ProbeContext| async move {
            Ok(ctx.timeout() == Duration::from_millis(30) && ctx.remaining() <= ctx.timeout())
        })
        .unwrap()
        .with_timeout(Duration::from_millis(30))
        .unwrap();

        let result = runner().run(probe).await;
        assert_eq!(result.status, ProbeStatus::Healthy);
    }
}
