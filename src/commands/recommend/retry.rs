use std::time::Duration;

use tracing::{error, warn};

use super::client::{CompletionClient, CompletionError};

pub const ERROR_PREFIX: &str = "ERROR: ";

/// Cooldowns start at the base for the failure kind and double with every
/// attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrySchedule {
    pub max_attempts: u32,
    pub rate_limit_cooldown: Duration,
    pub api_error_cooldown: Duration,
}

impl RetrySchedule {
    /// Sleep before the next attempt, or `None` when `error` is terminal or the
    /// attempt budget is spent.
    pub fn cooldown(&self, error: &CompletionError, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let base = match error {
            CompletionError::RateLimited(_) => self.rate_limit_cooldown,
            CompletionError::Api(_) => self.api_error_cooldown,
            CompletionError::Rejected(_) => return None,
        };
        let exponent = attempt.saturating_sub(1).min(16);
        Some(base.saturating_mul(1u32 << exponent))
    }
}

/// Asks `client` for a completion, retrying within `schedule`. Failures end as
/// a cell value starting with `ERROR: ` instead of an error.
pub fn complete_with_retry(
    client: &dyn CompletionClient,
    schedule: &RetrySchedule,
    prompt: &str,
    sleep: &mut dyn FnMut(Duration),
) -> String {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match client.complete(prompt) {
            Ok(text) => return text,
            Err(err) => match schedule.cooldown(&err, attempt) {
                Some(delay) => {
                    warn!(error = %err, attempt, ?delay, "completion failed, retrying");
                    sleep(delay);
                }
                None => {
                    error!(error = %err, attempts = attempt, "giving up on completion");
                    return format!("{ERROR_PREFIX}{err}");
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    struct ScriptedClient {
        replies: RefCell<VecDeque<Result<String, CompletionError>>>,
        calls: RefCell<u32>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<String, CompletionError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                calls: RefCell::new(0),
            }
        }
    }

    impl CompletionClient for ScriptedClient {
        fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            *self.calls.borrow_mut() += 1;
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(CompletionError::Api("script exhausted".to_string())))
        }
    }

    fn schedule() -> RetrySchedule {
        RetrySchedule {
            max_attempts: 5,
            rate_limit_cooldown: Duration::from_secs(60),
            api_error_cooldown: Duration::from_secs(30),
        }
    }

    #[test]
    fn rate_limits_back_off_then_succeed() {
        let client = ScriptedClient::new(vec![
            Err(CompletionError::RateLimited("slow".to_string())),
            Err(CompletionError::RateLimited("slow".to_string())),
            Err(CompletionError::Api("502".to_string())),
            Ok("Use drones".to_string()),
        ]);
        let mut slept = Vec::new();

        let text = complete_with_retry(&client, &schedule(), "p", &mut |delay| slept.push(delay));

        assert_eq!(text, "Use drones");
        assert_eq!(
            slept,
            vec![
                Duration::from_secs(60),
                Duration::from_secs(120),
                Duration::from_secs(120),
            ]
        );
        assert_eq!(*client.calls.borrow(), 4);
    }

    #[test]
    fn retry_budget_is_bounded() {
        let client = ScriptedClient::new(vec![]);
        let mut slept = Vec::new();

        let text = complete_with_retry(&client, &schedule(), "p", &mut |delay| slept.push(delay));

        assert_eq!(text, "ERROR: api error: script exhausted");
        assert_eq!(*client.calls.borrow(), 5);
        assert_eq!(slept.len(), 4);
    }

    #[test]
    fn rejected_requests_fail_without_retry() {
        let client = ScriptedClient::new(vec![Err(CompletionError::Rejected(
            "401 Unauthorized: bad key".to_string(),
        ))]);
        let mut slept = Vec::new();

        let text = complete_with_retry(&client, &schedule(), "p", &mut |delay| slept.push(delay));

        assert_eq!(text, "ERROR: 401 Unauthorized: bad key");
        assert!(slept.is_empty());
        assert_eq!(*client.calls.borrow(), 1);
    }
}
