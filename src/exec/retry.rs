// src/exec/retry.rs

//! Bounded retry loop around a [`ProcessRunner`].
//!
//! [`RetryState`] is the pure, synchronous decision core: it is fed one
//! finished attempt at a time and answers whether to stop, wait and retry, or
//! give up with a timeout. [`RetryScheduler::run`] is the async shell that
//! spawns attempts and sleeps between them.
//!
//! The timeout bounds cumulative *backoff sleep*, not wall-clock time spent
//! inside the child processes.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::errors::{Result, WrapperError};
use crate::exec::backoff::{BackoffPolicy, Jitter};
use crate::exec::catalog::TransientErrorCatalog;
use crate::exec::runner::ProcessRunner;
use crate::exec::spec::{CommandSpec, ExecutionAttempt};

/// Hard cap on attempts for one invocation.
pub const MAX_ATTEMPTS: u32 = 5;

/// Why the loop stopped with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Success,
    RetryDisabled,
    NonRetriable,
    MaxAttemptsReached,
}

/// What to do after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Finish(Termination),
    RetryAfter(Duration),
    TimedOut,
}

/// Attempt counter and backoff accounting for one invocation.
#[derive(Debug)]
pub struct RetryState {
    attempts: u32,
    waited: Duration,
    max_attempts: u32,
    timeout: Duration,
    retry_enabled: bool,
    jitter: Jitter,
}

impl RetryState {
    pub fn new(retry_enabled: bool, timeout: Duration, max_attempts: u32, jitter: Jitter) -> Self {
        Self {
            attempts: 0,
            waited: Duration::ZERO,
            max_attempts,
            timeout,
            retry_enabled,
            jitter,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Total backoff scheduled so far.
    pub fn waited(&self) -> Duration {
        self.waited
    }

    /// Account for a finished attempt and decide what happens next.
    pub fn record_attempt(
        &mut self,
        attempt: &ExecutionAttempt,
        catalog: &TransientErrorCatalog,
    ) -> RetryDecision {
        self.attempts += 1;

        if attempt.success() {
            return RetryDecision::Finish(Termination::Success);
        }
        if !self.retry_enabled {
            return RetryDecision::Finish(Termination::RetryDisabled);
        }

        let transient = catalog.matching_lines(&attempt.output);
        if transient.is_empty() {
            return RetryDecision::Finish(Termination::NonRetriable);
        }

        warn!(
            attempt = self.attempts,
            exit_code = attempt.exit_code,
            errors = ?transient,
            "found transient errors in command output"
        );

        if self.attempts >= self.max_attempts {
            return RetryDecision::Finish(Termination::MaxAttemptsReached);
        }

        let delay = self.jitter.next_delay();
        if self.waited + delay > self.timeout {
            return RetryDecision::TimedOut;
        }

        self.waited += delay;
        RetryDecision::RetryAfter(delay)
    }
}

/// Runs a command until it succeeds, fails permanently, or exhausts its
/// attempt or wait budget.
#[derive(Debug, Clone)]
pub struct RetryScheduler {
    catalog: Arc<TransientErrorCatalog>,
    backoff: BackoffPolicy,
    seed: Option<u64>,
}

impl Default for RetryScheduler {
    fn default() -> Self {
        Self::new(Arc::new(TransientErrorCatalog::default()))
    }
}

impl RetryScheduler {
    pub fn new(catalog: Arc<TransientErrorCatalog>) -> Self {
        Self {
            catalog,
            backoff: BackoffPolicy::default(),
            seed: None,
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Use a reproducible jitter sequence.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn catalog(&self) -> &TransientErrorCatalog {
        &self.catalog
    }

    pub fn backoff(&self) -> BackoffPolicy {
        self.backoff
    }

    fn new_state(&self, spec: &CommandSpec) -> RetryState {
        let jitter = match self.seed {
            Some(seed) => self.backoff.seeded_jitter(seed),
            None => self.backoff.jitter(),
        };
        RetryState::new(
            spec.retry_enabled,
            Duration::from_secs(spec.timeout_seconds),
            MAX_ATTEMPTS,
            jitter,
        )
    }

    /// Drive attempts through `runner` until a terminal decision.
    ///
    /// Returns the last attempt on any normal termination. Spawn failures and
    /// running out of wait budget are the only errors.
    pub async fn run<R>(&self, runner: &R, spec: &CommandSpec) -> Result<ExecutionAttempt>
    where
        R: ProcessRunner + ?Sized,
    {
        let mut state = self.new_state(spec);
        let command = spec.command.display();

        loop {
            let attempt = runner.run(spec).await?;

            match state.record_attempt(&attempt, &self.catalog) {
                RetryDecision::Finish(termination) => {
                    debug!(
                        command = %command,
                        attempts = state.attempts(),
                        exit_code = attempt.exit_code,
                        ?termination,
                        "command finished"
                    );
                    return Ok(attempt);
                }
                RetryDecision::RetryAfter(delay) => {
                    info!(
                        command = %command,
                        attempt = state.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        waited_ms = state.waited().as_millis() as u64,
                        "retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::TimedOut => {
                    return Err(WrapperError::RetryTimeout {
                        command,
                        attempts: state.attempts(),
                        waited_secs: state.waited().as_secs_f64(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_state(retry: bool, timeout_secs: u64, wait_secs: u64) -> RetryState {
        RetryState::new(
            retry,
            Duration::from_secs(timeout_secs),
            MAX_ATTEMPTS,
            BackoffPolicy::fixed(Duration::from_secs(wait_secs)).jitter(),
        )
    }

    fn attempt(code: i32, lines: &[&str]) -> ExecutionAttempt {
        ExecutionAttempt::new(code, lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn success_finishes_immediately() {
        let catalog = TransientErrorCatalog::default();
        let mut state = fixed_state(true, 900, 1);
        let decision = state.record_attempt(&attempt(0, &["Throttling"]), &catalog);
        assert_eq!(decision, RetryDecision::Finish(Termination::Success));
        assert_eq!(state.attempts(), 1);
    }

    #[test]
    fn disabled_retry_never_retries() {
        let catalog = TransientErrorCatalog::default();
        let mut state = fixed_state(false, 900, 1);
        let decision = state.record_attempt(&attempt(1, &["Throttling"]), &catalog);
        assert_eq!(decision, RetryDecision::Finish(Termination::RetryDisabled));
    }

    #[test]
    fn permanent_failure_is_not_retried() {
        let catalog = TransientErrorCatalog::default();
        let mut state = fixed_state(true, 900, 1);
        let failed = attempt(1, &["Error: Invalid resource type"]);
        let decision = state.record_attempt(&failed, &catalog);
        assert_eq!(decision, RetryDecision::Finish(Termination::NonRetriable));
        assert_eq!(state.waited(), Duration::ZERO);
    }

    #[test]
    fn transient_failures_retry_until_max_attempts() {
        let catalog = TransientErrorCatalog::default();
        let mut state = fixed_state(true, 900, 2);
        let failed = attempt(255, &["Error: unexpected EOF"]);

        for _ in 1..MAX_ATTEMPTS {
            assert_eq!(
                state.record_attempt(&failed, &catalog),
                RetryDecision::RetryAfter(Duration::from_secs(2))
            );
        }
        assert_eq!(
            state.record_attempt(&failed, &catalog),
            RetryDecision::Finish(Termination::MaxAttemptsReached)
        );
        assert_eq!(state.attempts(), MAX_ATTEMPTS);
        assert_eq!(state.waited(), Duration::from_secs(8));
    }

    #[test]
    fn wait_budget_is_never_exceeded() {
        let catalog = TransientErrorCatalog::default();
        let mut state = fixed_state(true, 5, 2);
        let failed = attempt(1, &["Throttling"]);

        assert!(matches!(state.record_attempt(&failed, &catalog), RetryDecision::RetryAfter(_)));
        assert!(matches!(state.record_attempt(&failed, &catalog), RetryDecision::RetryAfter(_)));
        assert_eq!(state.record_attempt(&failed, &catalog), RetryDecision::TimedOut);
        assert_eq!(state.waited(), Duration::from_secs(4));
    }

    #[test]
    fn zero_timeout_times_out_on_first_transient_failure() {
        let catalog = TransientErrorCatalog::default();
        let mut state = fixed_state(true, 0, 1);
        assert_eq!(
            state.record_attempt(&attempt(1, &["Throttling"]), &catalog),
            RetryDecision::TimedOut
        );
    }
}
