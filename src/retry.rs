//! Bounded exponential-backoff retry for outbound requests.
//!
//! Attempt `n` (1-indexed) that fails transiently is followed by a sleep of
//! `min(2^n, 8)` units before attempt `n + 1`. Status 200/201 succeeds, 429 and
//! 5xx are transient, any other status is handed back to the caller as-is.
//! Network failures are transient. No sleep follows the final attempt.

use crate::error::{Error, LastFailure, TransportError};
use crate::transport::{ApiRequest, ApiResponse, Transport};
use crate::Result;
use std::time::Duration;
use tracing::{debug, warn};

/// Largest backoff, in units.
const MAX_DELAY_UNITS: u32 = 8;

/// How a status code is treated by the retry loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Transient,
    Permanent,
}

impl StatusClass {
    pub fn of(status: u16) -> Self {
        match status {
            200 | 201 => Self::Success,
            429 | 500..=599 => Self::Transient,
            _ => Self::Permanent,
        }
    }
}

/// What the loop does after one attempt.
#[derive(Debug)]
pub enum Step {
    Return(Result<ApiResponse>),
    Retry { delay: Duration, failure: LastFailure },
}

/// Retry budget and backoff unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    retries: u32,
    unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_RETRIES)
    }
}

impl RetryPolicy {
    /// `retries` extra attempts beyond the first, one-second units.
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            unit: Duration::from_secs(1),
        }
    }

    /// Override the backoff unit (tests use milliseconds).
    pub fn with_unit(mut self, unit: Duration) -> Self {
        self.unit = unit;
        self
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn unit(&self) -> Duration {
        self.unit
    }

    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Sleep after failed attempt `attempt` (1-indexed): 2, 4, 8, 8, ... units.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let units = 1u32
            .checked_shl(attempt)
            .unwrap_or(u32::MAX)
            .min(MAX_DELAY_UNITS);
        self.unit * units
    }

    /// Decide what follows attempt `attempt` given its outcome.
    pub fn next_step(
        &self,
        attempt: u32,
        outcome: std::result::Result<ApiResponse, TransportError>,
    ) -> Step {
        let failure = match outcome {
            Ok(resp) => match StatusClass::of(resp.status) {
                StatusClass::Success | StatusClass::Permanent => return Step::Return(Ok(resp)),
                StatusClass::Transient => LastFailure::Status {
                    status: resp.status,
                    body: resp.body,
                },
            },
            Err(e) if e.is_transient() => LastFailure::Transport(e),
            Err(e) => return Step::Return(Err(Error::Transport(e))),
        };
        if attempt >= self.max_attempts() {
            return Step::Return(Err(Error::RetriesExhausted {
                attempts: attempt,
                last: failure,
            }));
        }
        Step::Retry {
            delay: self.delay_for(attempt),
            failure,
        }
    }
}

/// Run `request` through `transport` under `policy`, sleeping on the tokio timer.
pub(crate) async fn execute_with_retry(
    transport: &dyn Transport,
    policy: &RetryPolicy,
    request: &ApiRequest,
) -> Result<ApiResponse> {
    let mut attempt = 1;
    loop {
        debug!(method = %request.method, url = %request.url, attempt, "sending request");
        let outcome = transport.execute(request).await;
        match policy.next_step(attempt, outcome) {
            Step::Return(result) => return result,
            Step::Retry { delay, failure } => {
                warn!(url = %request.url, attempt, %failure, ?delay, "transient failure; retrying");
                tokio::time::sleep(delay).await;
            }
        }
        attempt += 1;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport that replays scripted outcomes and records requests.
    pub(crate) struct ScriptedTransport {
        script: Mutex<VecDeque<std::result::Result<ApiResponse, TransportError>>>,
        pub(crate) seen: Mutex<Vec<ApiRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(
            script: impl IntoIterator<Item = std::result::Result<ApiResponse, TransportError>>,
        ) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn statuses(statuses: &[u16]) -> Self {
            Self::new(statuses.iter().map(|s| Ok(ApiResponse::new(*s, "{}"))))
        }

        pub(crate) fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(
            &self,
            request: &ApiRequest,
        ) -> std::result::Result<ApiResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ApiResponse::new(200, "{}")))
        }
    }

    fn request() -> ApiRequest {
        ApiRequest::post("https://api.example.com/message/sendText/default", serde_json::json!({}))
    }

    #[test]
    fn delay_sequence_caps_at_eight_units() {
        let policy = RetryPolicy::new(10);
        let secs: Vec<u64> = (1..=6).map(|a| policy.delay_for(a).as_secs()).collect();
        assert_eq!(secs, vec![2, 4, 8, 8, 8, 8]);
        assert_eq!(policy.delay_for(64), Duration::from_secs(8));
    }

    #[test]
    fn status_partition() {
        assert_eq!(StatusClass::of(200), StatusClass::Success);
        assert_eq!(StatusClass::of(201), StatusClass::Success);
        assert_eq!(StatusClass::of(429), StatusClass::Transient);
        assert_eq!(StatusClass::of(500), StatusClass::Transient);
        assert_eq!(StatusClass::of(503), StatusClass::Transient);
        assert_eq!(StatusClass::of(400), StatusClass::Permanent);
        assert_eq!(StatusClass::of(404), StatusClass::Permanent);
        assert_eq!(StatusClass::of(204), StatusClass::Permanent);
        assert_eq!(StatusClass::of(599), StatusClass::Transient);
        assert_eq!(StatusClass::of(600), StatusClass::Permanent);
        assert_eq!(StatusClass::of(999), StatusClass::Permanent);
    }

    #[test]
    fn next_step_returns_permanent_responses() {
        let policy = RetryPolicy::new(3);
        match policy.next_step(1, Ok(ApiResponse::new(404, "nope"))) {
            Step::Return(Ok(resp)) => assert_eq!(resp.status, 404),
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn next_step_does_not_retry_invalid_requests() {
        let policy = RetryPolicy::new(3);
        let step = policy.next_step(1, Err(TransportError::Invalid("bad url".into())));
        assert!(matches!(step, Step::Return(Err(Error::Transport(_)))));
    }

    #[test]
    fn next_step_exhausts_on_last_attempt() {
        let policy = RetryPolicy::new(1);
        assert!(matches!(
            policy.next_step(1, Err(TransportError::Timeout)),
            Step::Retry { .. }
        ));
        match policy.next_step(2, Err(TransportError::Timeout)) {
            Step::Return(Err(Error::RetriesExhausted { attempts, last })) => {
                assert_eq!(attempts, 2);
                assert_eq!(last, LastFailure::Transport(TransportError::Timeout));
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success_with_backoff() {
        let transport = ScriptedTransport::statuses(&[503, 503, 200]);
        let policy = RetryPolicy::new(2);
        let start = tokio::time::Instant::now();
        let resp = execute_with_retry(&transport, &policy, &request())
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(transport.calls(), 3);
        // 2 + 4 units of backoff
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_exhausts_budget() {
        let transport = ScriptedTransport::statuses(&[500, 500, 500, 500]);
        let policy = RetryPolicy::new(2);
        let start = tokio::time::Instant::now();
        let err = execute_with_retry(&transport, &policy, &request())
            .await
            .unwrap_err();
        assert_eq!(transport.calls(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(6));
        match err {
            Error::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(last, LastFailure::Status { status: 500, .. }));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn network_errors_are_retried() {
        let transport = ScriptedTransport::new([
            Err(TransportError::Connect("refused".into())),
            Ok(ApiResponse::new(201, "{}")),
        ]);
        let resp = execute_with_retry(&transport, &RetryPolicy::new(3), &request())
            .await
            .unwrap();
        assert_eq!(resp.status, 201);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn client_errors_are_not_retried() {
        let transport = ScriptedTransport::statuses(&[400, 200]);
        let resp = execute_with_retry(&transport, &RetryPolicy::new(3), &request())
            .await
            .unwrap();
        assert_eq!(resp.status, 400);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_means_single_attempt() {
        let transport = ScriptedTransport::statuses(&[429]);
        let err = execute_with_retry(&transport, &RetryPolicy::new(0), &request())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RetriesExhausted { attempts: 1, .. }));
        assert_eq!(transport.calls(), 1);
    }
}
