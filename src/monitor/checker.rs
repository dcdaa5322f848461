//! HTTP health probes

use std::sync::Arc;
use std::time::Instant;

use crate::clock::{Clock, SystemClock};
use crate::model::{CheckResult, HttpMethod, Target};

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }
}

/// Executes one probe against one target
#[derive(Clone)]
pub struct HealthChecker {
    client: reqwest::Client,
    clock: Arc<dyn Clock>,
}

impl HealthChecker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            client: reqwest::Client::new(),
            clock,
        }
    }

    /// Probe a target. Never fails: transport errors and timeouts become
    /// failed results, and every HTTP status is compared against the
    /// target's expected code.
    pub async fn check(&self, target: &Target) -> CheckResult {
        let url = target.request_url();
        let deadline = target.timeout();
        let checked_at = self.clock.now();

        let request = self
            .client
            .request(target.method.into(), &url)
            .timeout(deadline);

        let started = Instant::now();
        // The outer timeout also bounds body reads and anything reqwest's own deadline misses
        let outcome = tokio::time::timeout(deadline, async {
            let response = request.send().await?;
            let status = response.status();
            response.bytes().await?;
            Ok::<_, reqwest::Error>(status)
        })
        .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(Ok(status)) => CheckResult::responded(
                target.id,
                checked_at,
                status.as_u16(),
                target.expected_status_code,
                elapsed_ms,
            ),
            Ok(Err(e)) => CheckResult::failed(target.id, checked_at, elapsed_ms, describe_error(&e)),
            Err(_) => CheckResult::failed(
                target.id,
                checked_at,
                elapsed_ms,
                format!("timeout of {}ms exceeded", deadline.as_millis()),
            ),
        };

        tracing::debug!(
            target_id = target.id,
            url = %url,
            status = ?result.status_code,
            response_time_ms = result.response_time_ms,
            success = result.is_success,
            "Health check completed"
        );

        result
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else if error.is_builder() {
        format!("invalid request: {}", error)
    } else {
        error.to_string()
    }
}
