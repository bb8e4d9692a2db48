//! Click retries for flaky interactive elements.
//!
//! A click can fail because an overlay intercepts it or because the element
//! is not interactable yet. Those failures are retried after a linear,
//! attempt-increasing delay. Anything else ends the retry at once. The retrier
//! never raises: the outcome comes back as an [`ExtractionResult`] carrying
//! the full attempt history.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::ExtractionResult;
use crate::infrastructure::config::defaults;
use crate::infrastructure::dom::{DomAccessor, NodeHandle};
use crate::infrastructure::parsing_error::{ErrorKind, ExtractionOutcome};

/// Record of one click attempt.
#[derive(Debug, Clone, Serialize)]
pub struct RetryAttempt {
    pub attempt_number: u32,
    pub attempted_at: DateTime<Utc>,
    pub error_kind: Option<ErrorKind>,
    /// Delay slept after this attempt; zero for the last one.
    pub backoff_duration: Duration,
    pub success: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RetryReport {
    pub attempts: Vec<RetryAttempt>,
}

impl RetryReport {
    pub fn attempt_count(&self) -> u32 {
        u32::try_from(self.attempts.len()).unwrap_or(u32::MAX)
    }

    pub fn succeeded(&self) -> bool {
        self.attempts.last().is_some_and(|attempt| attempt.success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickRetrier {
    max_attempts: u32,
    interactable_timeout: Duration,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for ClickRetrier {
    fn default() -> Self {
        Self::new(
            defaults::CLICK_MAX_ATTEMPTS,
            Duration::from_millis(defaults::INTERACTABLE_TIMEOUT_MS),
            Duration::from_millis(defaults::RETRY_BASE_DELAY_MS),
            Duration::from_millis(defaults::RETRY_MAX_DELAY_MS),
        )
    }
}

impl ClickRetrier {
    pub fn new(
        max_attempts: u32,
        interactable_timeout: Duration,
        base_delay: Duration,
        max_delay: Duration,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interactable_timeout,
            base_delay,
            max_delay,
        }
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// `base * attempt`, capped at `max_delay`.
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt).min(self.max_delay)
    }

    async fn attempt_click<A: DomAccessor>(
        &self,
        accessor: &mut A,
        node: &NodeHandle,
    ) -> ExtractionOutcome<()> {
        accessor
            .wait_interactable(node, self.interactable_timeout)
            .await?;
        accessor.click(node).await
    }

    /// Wait for `node` to be interactable and click it, retrying transient failures.
    pub async fn retry_click<A: DomAccessor>(
        &self,
        accessor: &mut A,
        node: &NodeHandle,
    ) -> ExtractionResult<RetryReport> {
        let mut report = RetryReport::default();

        for attempt_number in 1..=self.max_attempts {
            let attempted_at = Utc::now();
            let outcome = self.attempt_click(accessor, node).await;

            let error = match outcome {
                Ok(()) => {
                    report.attempts.push(RetryAttempt {
                        attempt_number,
                        attempted_at,
                        error_kind: None,
                        backoff_duration: Duration::ZERO,
                        success: true,
                    });
                    if attempt_number > 1 {
                        info!("✅ Click succeeded on attempt {}", attempt_number);
                    }
                    return ExtractionResult::success(
                        format!("clicked after {attempt_number} attempt(s)"),
                        report,
                    );
                }
                Err(error) => error,
            };

            let last_attempt = attempt_number == self.max_attempts;
            let retryable = error.is_retryable_click();
            let backoff = if retryable && !last_attempt {
                self.calculate_backoff(attempt_number)
            } else {
                Duration::ZERO
            };
            report.attempts.push(RetryAttempt {
                attempt_number,
                attempted_at,
                error_kind: Some(error.kind()),
                backoff_duration: backoff,
                success: false,
            });

            if !retryable {
                warn!("❌ Click failed with non-retryable error: {}", error);
                return ExtractionResult::from_error(&error, report);
            }
            if last_attempt {
                warn!(
                    "❌ Click failed after {} attempts: {}",
                    self.max_attempts, error
                );
                return ExtractionResult::from_error(&error, report);
            }

            debug!(
                "🔄 Click attempt {}/{} failed ({}), retrying in {:?}",
                attempt_number, self.max_attempts, error, backoff
            );
            tokio::time::sleep(backoff).await;
        }

        ExtractionResult::failure("no click attempts were made", report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::dom::SnapshotBrowser;

    const LIST: &str = r#"<html><body>
        <div class="card"><a href="/s/1">One</a></div>
        <div class="card" disabled><a href="/s/1">Disabled</a></div>
    </body></html>"#;

    fn browser() -> SnapshotBrowser {
        SnapshotBrowser::new("https://program.test/")
            .with_page("https://program.test/", LIST)
            .with_page("https://program.test/s/1", "<html><body>detail</body></html>")
    }

    fn retrier(max_attempts: u32) -> ClickRetrier {
        ClickRetrier::new(
            max_attempts,
            Duration::from_secs(10),
            Duration::from_secs(1),
            Duration::from_secs(30),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_attempt_k_after_k_minus_one_failures() {
        for k in 1..=3 {
            let mut browser = browser();
            let cards = browser.find_all(None, ".card").await.unwrap();
            browser.intercept_next_clicks(k - 1);

            let result = retrier(3).retry_click(&mut browser, &cards[0]).await;
            assert!(result.status, "k = {k}: {}", result.message);
            assert_eq!(result.data.attempt_count(), k);
            assert!(result.data.succeeded());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let mut browser = browser();
        let cards = browser.find_all(None, ".card").await.unwrap();
        browser.intercept_next_clicks(u32::MAX);

        let result = retrier(3).retry_click(&mut browser, &cards[0]).await;
        assert!(!result.status);
        assert_eq!(result.data.attempt_count(), 3);
        assert!(!result.data.succeeded());

        let backoffs: Vec<_> = result
            .data
            .attempts
            .iter()
            .map(|attempt| attempt.backoff_duration)
            .collect();
        assert_eq!(
            backoffs,
            vec![Duration::from_secs(1), Duration::from_secs(2), Duration::ZERO]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn not_interactable_counts_as_retryable_timeout() {
        let mut browser = browser();
        let cards = browser.find_all(None, ".card").await.unwrap();

        let result = retrier(2).retry_click(&mut browser, &cards[1]).await;
        assert!(!result.status);
        assert_eq!(result.data.attempt_count(), 2);
        assert_eq!(result.data.attempts[0].error_kind, Some(ErrorKind::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_handle_is_not_retried() {
        let mut browser = browser();
        let cards = browser.find_all(None, ".card").await.unwrap();
        browser.click(&cards[0]).await.unwrap();

        let result = retrier(3).retry_click(&mut browser, &cards[0]).await;
        assert!(!result.status);
        assert_eq!(result.data.attempt_count(), 1);
        assert_eq!(result.data.attempts[0].error_kind, Some(ErrorKind::Stale));
    }

    #[test]
    fn backoff_grows_linearly_and_is_capped() {
        let retrier = ClickRetrier::new(
            5,
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(5),
        );
        assert_eq!(retrier.calculate_backoff(1), Duration::from_secs(2));
        assert_eq!(retrier.calculate_backoff(2), Duration::from_secs(4));
        assert_eq!(retrier.calculate_backoff(3), Duration::from_secs(5));
    }

    #[test]
    fn at_least_one_attempt() {
        assert_eq!(retrier(0).max_attempts(), 1);
    }
}
