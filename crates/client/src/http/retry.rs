//! Retry gating for the pipeline.

use reqwest::Method;

use crate::config::RetryOptions;
use crate::error::ApiError;
use woosdk_common::resilience::{RetryDecision, RetryPolicy};

/// [`RetryPolicy`] over classified request failures.
///
/// The method allowlist only gates status-based retries: a failure where no
/// response was received at all is retryable for any method, because the
/// operation may never have reached the server. `Request` errors are never
/// retried — re-dispatching an undispatchable request cannot succeed.
pub(crate) struct HttpRetryPolicy<'a> {
    options: &'a RetryOptions,
    method: Method,
}

impl<'a> HttpRetryPolicy<'a> {
    pub(crate) fn new(options: &'a RetryOptions, method: Method) -> Self {
        Self { options, method }
    }
}

impl RetryPolicy<ApiError> for HttpRetryPolicy<'_> {
    fn should_retry(&self, error: &ApiError, attempt: u32) -> RetryDecision {
        if !self.options.enabled {
            return RetryDecision::Stop;
        }
        if let Some(predicate) = &self.options.predicate {
            if !(predicate.as_ref())(error, attempt) {
                return RetryDecision::Stop;
            }
        }
        match error {
            ApiError::Request { .. } => RetryDecision::Stop,
            ApiError::Network { .. } => RetryDecision::Retry,
            ApiError::Server { status, .. } => {
                if !self.options.retryable_methods.contains(&self.method) {
                    RetryDecision::Stop
                } else if self.options.retryable_statuses.contains(status) {
                    RetryDecision::Retry
                } else {
                    RetryDecision::Stop
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::error::ErrorBody;

    fn server_error(status: u16) -> ApiError {
        ApiError::Server {
            status,
            body: ErrorBody::from_status(status),
            headers: BTreeMap::new(),
        }
    }

    fn network_error() -> ApiError {
        ApiError::Network { code: "connect".into(), message: "refused".into() }
    }

    #[test]
    fn disabled_options_never_retry() {
        let options = RetryOptions::default();
        let policy = HttpRetryPolicy::new(&options, Method::GET);
        assert_eq!(policy.should_retry(&server_error(503), 0), RetryDecision::Stop);
    }

    #[test]
    fn retryable_status_on_allowlisted_method_retries() {
        let options = RetryOptions::enabled();
        let policy = HttpRetryPolicy::new(&options, Method::GET);
        assert_eq!(policy.should_retry(&server_error(503), 0), RetryDecision::Retry);
        assert_eq!(policy.should_retry(&server_error(429), 1), RetryDecision::Retry);
    }

    #[test]
    fn non_retryable_status_stops() {
        let options = RetryOptions::enabled();
        let policy = HttpRetryPolicy::new(&options, Method::GET);
        assert_eq!(policy.should_retry(&server_error(404), 0), RetryDecision::Stop);
    }

    #[test]
    fn post_is_not_retried_on_status_failures() {
        let options = RetryOptions::enabled();
        let policy = HttpRetryPolicy::new(&options, Method::POST);
        assert_eq!(policy.should_retry(&server_error(503), 0), RetryDecision::Stop);
    }

    #[test]
    fn network_failures_retry_even_for_post() {
        let options = RetryOptions::enabled();
        let policy = HttpRetryPolicy::new(&options, Method::POST);
        assert_eq!(policy.should_retry(&network_error(), 0), RetryDecision::Retry);
    }

    #[test]
    fn request_errors_never_retry() {
        let options = RetryOptions::enabled();
        let policy = HttpRetryPolicy::new(&options, Method::GET);
        assert_eq!(
            policy.should_retry(&ApiError::request("bad config"), 0),
            RetryDecision::Stop
        );
    }

    #[test]
    fn custom_predicate_gates_everything() {
        let mut options = RetryOptions::enabled();
        options.predicate = Some(Arc::new(|_, attempt| attempt == 0));
        let policy = HttpRetryPolicy::new(&options, Method::GET);
        assert_eq!(policy.should_retry(&server_error(503), 0), RetryDecision::Retry);
        assert_eq!(policy.should_retry(&server_error(503), 1), RetryDecision::Stop);
        assert_eq!(policy.should_retry(&network_error(), 1), RetryDecision::Stop);
    }
}
