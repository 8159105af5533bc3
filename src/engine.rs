// src/engine.rs

//! Top-level execution engine.
//!
//! Ties the three pieces of one invocation together:
//! retry scheduler → process runner (one or more attempts) → audit reporter.

use std::fmt;

use tracing::debug;

use crate::audit::AuditReporter;
use crate::errors::Result;
use crate::exec::{CommandSpec, ExecutionAttempt, ProcessRunner, RetryScheduler};

pub struct Engine<R: ProcessRunner> {
    runner: R,
    scheduler: RetryScheduler,
    reporter: AuditReporter,
}

impl<R: ProcessRunner> fmt::Debug for Engine<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("scheduler", &self.scheduler)
            .field("reporter", &self.reporter)
            .finish_non_exhaustive()
    }
}

impl<R: ProcessRunner> Engine<R> {
    pub fn new(runner: R, scheduler: RetryScheduler, reporter: AuditReporter) -> Self {
        Self {
            runner,
            scheduler,
            reporter,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run `spec` to a final attempt and report it.
    ///
    /// Errors only on spawn failure or when the retry wait budget runs out;
    /// in both cases nothing is reported. A non-zero exit code is returned
    /// as data.
    pub async fn execute(&self, spec: &CommandSpec) -> Result<ExecutionAttempt> {
        let attempt = self.scheduler.run(&self.runner, spec).await?;

        match (&spec.audit_url, &spec.working_dir) {
            (Some(url), Some(dir)) => self.reporter.report(url, dir, &attempt).await,
            (Some(_), None) => {
                debug!("audit URL set but no working directory; skipping audit report")
            }
            _ => {}
        }

        Ok(attempt)
    }
}
