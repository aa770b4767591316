//! Long-running operation polling.
//!
//! The loop probes the operation until it reaches a terminal state, sleeping
//! between probes with exponential backoff and jitter. The whole loop is
//! bounded by the lifecycle timeout; non-terminal states keep polling and
//! any error is returned unchanged.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{FleetsClient, LongRunningOperation, OperationState};
use crate::error::{Error, Result};

/// Backoff between status probes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    /// Delay before the second probe
    #[serde(with = "humantime_serde")]
    pub initial_interval: Duration,
    /// Upper bound for any single delay
    #[serde(with = "humantime_serde")]
    pub max_interval: Duration,
    /// Growth factor per probe
    pub backoff_multiplier: f64,
    /// Fraction of the delay randomised in either direction (0.0 to 1.0)
    pub jitter: f64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(60),
            backoff_multiplier: 1.5,
            jitter: 0.1,
        }
    }
}

impl PollPolicy {
    /// A policy that never sleeps longer than `interval`.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial_interval: interval,
            max_interval: interval,
            backoff_multiplier: 1.0,
            jitter: 0.0,
        }
    }

    /// Delay before probe `attempt + 1` (0-indexed), before jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let millis = self.initial_interval.as_millis() as f64
            * self.backoff_multiplier.max(1.0).powi(attempt.min(64) as i32);
        let capped = millis.min(self.max_interval.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Delay with bounded jitter applied, never above `max_interval`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        let jitter = if self.jitter.is_finite() {
            self.jitter.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if jitter == 0.0 || base.is_zero() {
            return base;
        }
        let factor = 1.0 + rand::thread_rng().gen_range(-jitter..=jitter);
        let millis = (base.as_millis() as f64 * factor).max(0.0);
        Duration::from_millis(millis as u64).min(self.max_interval)
    }
}

/// Polls `operation` to completion within `timeout`.
pub async fn poll_until_done(
    client: &dyn FleetsClient,
    operation: &LongRunningOperation,
    policy: &PollPolicy,
    timeout: Duration,
) -> Result<()> {
    if *operation == LongRunningOperation::Done {
        return Ok(());
    }

    match tokio::time::timeout(timeout, poll_loop(client, operation, policy)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            timeout_secs: timeout.as_secs(),
        }),
    }
}

async fn poll_loop(
    client: &dyn FleetsClient,
    operation: &LongRunningOperation,
    policy: &PollPolicy,
) -> Result<()> {
    let mut attempt = 0u32;
    loop {
        match client.operation_status(operation).await? {
            OperationState::Succeeded => {
                debug!("operation completed after {} probes", attempt + 1);
                return Ok(());
            }
            OperationState::Failed { status, message } => {
                return Err(Error::OperationFailed { status, message });
            }
            OperationState::InProgress => {
                let delay = operation
                    .retry_after()
                    .map(|d| d.min(policy.max_interval))
                    .unwrap_or_else(|| policy.delay(attempt));
                debug!("operation still in progress, next probe in {:?}", delay);
                tokio::time::sleep(delay).await;
                attempt = attempt.saturating_add(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Fleet, FleetId};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedClient {
        states: Mutex<Vec<OperationState>>,
        probes: Mutex<u32>,
    }

    impl ScriptedClient {
        fn new(mut states: Vec<OperationState>) -> Self {
            states.reverse();
            Self {
                states: Mutex::new(states),
                probes: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl FleetsClient for ScriptedClient {
        async fn get(&self, id: &FleetId) -> Result<Fleet> {
            Err(Error::NotFound(id.to_string()))
        }

        async fn begin_create_or_update(
            &self,
            _id: &FleetId,
            _fleet: &Fleet,
        ) -> Result<LongRunningOperation> {
            Ok(LongRunningOperation::Done)
        }

        async fn begin_delete(&self, _id: &FleetId) -> Result<LongRunningOperation> {
            Ok(LongRunningOperation::Done)
        }

        async fn operation_status(&self, _op: &LongRunningOperation) -> Result<OperationState> {
            *self.probes.lock().unwrap() += 1;
            Ok(self
                .states
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(OperationState::InProgress))
        }
    }

    fn async_op() -> LongRunningOperation {
        LongRunningOperation::AsyncOperation {
            url: "https://arm/operations/1".to_string(),
            retry_after: None,
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = PollPolicy {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: 0.0,
        };
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(10), Duration::from_secs(10));
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let policy = PollPolicy {
            initial_interval: Duration::from_millis(1000),
            max_interval: Duration::from_secs(60),
            backoff_multiplier: 1.0,
            jitter: 0.2,
        };
        for _ in 0..100 {
            let delay = policy.delay(0).as_millis();
            assert!((800..=1200).contains(&delay), "delay {} out of bounds", delay);
        }
    }

    #[test]
    fn test_non_finite_factors_fall_back_to_base_delay() {
        let policy = PollPolicy {
            initial_interval: Duration::from_millis(1000),
            max_interval: Duration::from_secs(60),
            backoff_multiplier: f64::NAN,
            jitter: f64::NAN,
        };
        assert_eq!(policy.delay(3), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_polls_until_succeeded() {
        let client = ScriptedClient::new(vec![
            OperationState::InProgress,
            OperationState::InProgress,
            OperationState::Succeeded,
        ]);
        poll_until_done(
            &client,
            &async_op(),
            &PollPolicy::fixed(Duration::from_millis(1)),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(*client.probes.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_failed_state_is_fatal() {
        let client = ScriptedClient::new(vec![OperationState::Failed {
            status: "Failed".to_string(),
            message: "QuotaExceeded".to_string(),
        }]);
        let err = poll_until_done(
            &client,
            &async_op(),
            &PollPolicy::fixed(Duration::from_millis(1)),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("QuotaExceeded"));
    }

    #[tokio::test]
    async fn test_times_out() {
        let client = ScriptedClient::new(vec![]);
        let err = poll_until_done(
            &client,
            &async_op(),
            &PollPolicy::fixed(Duration::from_millis(10)),
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_done_does_not_probe() {
        let client = ScriptedClient::new(vec![]);
        poll_until_done(
            &client,
            &LongRunningOperation::Done,
            &PollPolicy::default(),
            Duration::from_secs(1),
        )
        .await
        .unwrap();
        assert_eq!(*client.probes.lock().unwrap(), 0);
    }
}
