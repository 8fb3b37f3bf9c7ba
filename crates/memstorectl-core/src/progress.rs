//! Readiness polling for asynchronous cluster operations
//!
//! Create and delete calls return as soon as the API accepts them, with the
//! cluster still in a transitional state. [`wait_until_ready`] polls a fetch
//! function until the value is terminal, the deadline passes, or the caller
//! cancels. For deletions, a not-found fetch is the expected end state and
//! can be reported as success with [`NotFoundPolicy::Success`].

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};

/// Default upper bound for a wait
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Default delay between two fetches
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(15);

/// Something whose status can be shown while polling
pub trait StatusReport {
    fn status_label(&self) -> String;
}

/// What a not-found fetch means for the wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotFoundPolicy {
    /// Propagate the not-found error
    #[default]
    Error,
    /// The resource is gone, which is the state we were waiting for
    Success,
}

/// Timing and not-found handling for one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub interval: Duration,
    pub not_found: NotFoundPolicy,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_RETRY_INTERVAL)
    }
}

impl WaitPolicy {
    #[must_use]
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            not_found: NotFoundPolicy::Error,
        }
    }

    /// Policy for deletions: not-found ends the wait successfully
    #[must_use]
    pub fn not_found_as_success(mut self) -> Self {
        self.not_found = NotFoundPolicy::Success;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(CoreError::Validation(
                "retry interval must be greater than zero".to_string(),
            ));
        }
        if self.timeout < self.interval {
            return Err(CoreError::Validation(format!(
                "timeout ({:?}) must be at least the retry interval ({:?})",
                self.timeout, self.interval
            )));
        }
        Ok(())
    }
}

/// How a successful wait ended
#[derive(Debug, Clone, PartialEq)]
pub enum Readiness<T> {
    /// The resource reached a terminal state
    Settled(T),
    /// The resource no longer exists; `last_seen` is the last value fetched
    /// before it disappeared, if any fetch succeeded
    Gone { last_seen: Option<T> },
}

impl<T> Readiness<T> {
    pub fn is_gone(&self) -> bool {
        matches!(self, Readiness::Gone { .. })
    }

    /// The most recent value observed, settled or not
    pub fn last_seen(&self) -> Option<&T> {
        match self {
            Readiness::Settled(value) => Some(value),
            Readiness::Gone { last_seen } => last_seen.as_ref(),
        }
    }

    pub fn into_settled(self) -> Option<T> {
        match self {
            Readiness::Settled(value) => Some(value),
            Readiness::Gone { .. } => None,
        }
    }
}

/// Progress events emitted during a wait
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Polling is about to start
    Started { resource_id: String },
    /// A fetch returned a value
    Polling {
        resource_id: String,
        status: String,
        attempt: u32,
        elapsed: Duration,
    },
    /// The resource reached a terminal state
    Settled { resource_id: String, status: String },
    /// The resource no longer exists
    Gone { resource_id: String },
    /// The wait ended with an error
    Failed { resource_id: String, error: String },
}

/// Callback type for progress updates
///
/// The CLI uses this to drive its spinner.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Poll `fetch` until `is_terminal` holds for the returned value
///
/// Fetches are strictly sequential with `policy.interval` between them. The
/// wait gives up with [`CoreError::WaitTimeout`] once the next scheduled
/// fetch falls after `policy.timeout`, so a resource that never settles is
/// fetched `timeout / interval + 1` times (integer division). Slow fetches
/// can end the wait earlier, or let it overrun the timeout by up to one
/// interval plus one fetch.
///
/// `cancel` is raced against every fetch and every sleep; when it resolves
/// the wait stops with [`CoreError::Cancelled`].
///
/// Fetch errors are never retried. A not-found error ends the wait with
/// [`Readiness::Gone`] under [`NotFoundPolicy::Success`] and is returned
/// as-is otherwise.
///
/// # Example
///
/// ```rust,ignore
/// use memstorectl_core::progress::{wait_until_ready, WaitPolicy};
///
/// let readiness = wait_until_ready(
///     &cluster_id,
///     || api.get_cluster(&zone, &cluster_id),
///     |cluster| cluster.status.is_terminal(),
///     &WaitPolicy::default(),
///     async { let _ = tokio::signal::ctrl_c().await; },
///     None,
/// )
/// .await?;
/// ```
pub async fn wait_until_ready<T, F, Fut, P, C>(
    resource_id: &str,
    mut fetch: F,
    is_terminal: P,
    policy: &WaitPolicy,
    cancel: C,
    on_progress: Option<ProgressCallback>,
) -> Result<Readiness<T>>
where
    T: StatusReport,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&T) -> bool,
    C: Future<Output = ()>,
{
    policy.validate()?;

    let start = Instant::now();
    let mut last_seen: Option<T> = None;
    let mut attempt = 0u32;
    tokio::pin!(cancel);

    emit(
        &on_progress,
        ProgressEvent::Started {
            resource_id: resource_id.to_string(),
        },
    );

    loop {
        attempt += 1;

        let fetched = tokio::select! {
            biased;
            _ = &mut cancel => {
                return Err(cancelled(resource_id, &last_seen, &on_progress));
            }
            result = fetch() => result,
        };

        match fetched {
            Err(err) if err.is_not_found() && policy.not_found == NotFoundPolicy::Success => {
                info!(
                    "{} no longer exists after {} fetch(es), treating as done",
                    resource_id, attempt
                );
                emit(
                    &on_progress,
                    ProgressEvent::Gone {
                        resource_id: resource_id.to_string(),
                    },
                );
                return Ok(Readiness::Gone { last_seen });
            }
            Err(err) => {
                debug!("Fetching {} failed: {}", resource_id, err);
                emit(
                    &on_progress,
                    ProgressEvent::Failed {
                        resource_id: resource_id.to_string(),
                        error: err.to_string(),
                    },
                );
                return Err(err);
            }
            Ok(value) => {
                let status = value.status_label();
                let elapsed = start.elapsed();
                debug!(
                    "{} is {} (attempt {}, {:?} elapsed)",
                    resource_id, status, attempt, elapsed
                );
                emit(
                    &on_progress,
                    ProgressEvent::Polling {
                        resource_id: resource_id.to_string(),
                        status: status.clone(),
                        attempt,
                        elapsed,
                    },
                );

                if is_terminal(&value) {
                    info!("{} settled in state {}", resource_id, status);
                    emit(
                        &on_progress,
                        ProgressEvent::Settled {
                            resource_id: resource_id.to_string(),
                            status,
                        },
                    );
                    return Ok(Readiness::Settled(value));
                }

                last_seen = Some(value);

                // Next fetch is due at attempt * interval on the nominal schedule
                let next_fetch_at = policy.interval.saturating_mul(attempt);
                if next_fetch_at > policy.timeout || elapsed >= policy.timeout {
                    warn!(
                        "Gave up waiting for {} after {:?} (last status: {})",
                        resource_id, policy.timeout, status
                    );
                    let err = CoreError::WaitTimeout {
                        timeout: policy.timeout,
                        last_status: Some(status),
                    };
                    emit(
                        &on_progress,
                        ProgressEvent::Failed {
                            resource_id: resource_id.to_string(),
                            error: err.to_string(),
                        },
                    );
                    return Err(err);
                }
            }
        }

        tokio::select! {
            biased;
            _ = &mut cancel => {
                return Err(cancelled(resource_id, &last_seen, &on_progress));
            }
            _ = tokio::time::sleep(policy.interval) => {}
        }
    }
}

fn cancelled<T: StatusReport>(
    resource_id: &str,
    last_seen: &Option<T>,
    on_progress: &Option<ProgressCallback>,
) -> CoreError {
    warn!("Wait for {} cancelled", resource_id);
    let err = CoreError::Cancelled {
        last_status: last_seen.as_ref().map(StatusReport::status_label),
    };
    emit(
        on_progress,
        ProgressEvent::Failed {
            resource_id: resource_id.to_string(),
            error: err.to_string(),
        },
    );
    err
}

/// Helper to emit progress events
fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
