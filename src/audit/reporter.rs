// src/audit/reporter.rs

//! Best-effort reporting of a run's final outcome.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info};

use crate::audit::git::{Git2RootLocator, GitRootLocator};
use crate::audit::record::{current_user, directory_label, AuditRecord};
use crate::errors::{Result, WrapperError};
use crate::exec::ExecutionAttempt;

const POST_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts [`AuditRecord`]s. Never fails the invocation it reports on.
#[derive(Debug, Clone)]
pub struct AuditReporter {
    client: reqwest::Client,
    locator: Arc<dyn GitRootLocator>,
    run_by: String,
}

impl AuditReporter {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(POST_TIMEOUT)
            .build()
            .map_err(|e| WrapperError::Other(anyhow::Error::from(e)))?;

        Ok(Self {
            client,
            locator: Arc::new(Git2RootLocator),
            run_by: current_user(),
        })
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots, timeouts).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_locator(mut self, locator: Arc<dyn GitRootLocator>) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_run_by(mut self, run_by: impl Into<String>) -> Self {
        self.run_by = run_by.into();
        self
    }

    pub fn run_by(&self) -> &str {
        &self.run_by
    }

    /// Post the outcome of `attempt` run in `working_dir` to `url`.
    ///
    /// Every failure is logged and swallowed.
    pub async fn report(&self, url: &str, working_dir: &Path, attempt: &ExecutionAttempt) {
        match self.try_report(url, working_dir, attempt).await {
            Ok(()) => info!(url, "posted run outcome to audit API"),
            Err(err) => {
                let err = format!("{err:#}");
                error!(url, error = %err, "unable to post run outcome to audit API");
            }
        }
    }

    async fn try_report(
        &self,
        url: &str,
        working_dir: &Path,
        attempt: &ExecutionAttempt,
    ) -> anyhow::Result<()> {
        let root = self.locator.find_root(working_dir)?;
        let record = AuditRecord::new(directory_label(&root, working_dir), attempt, &self.run_by);

        info!(
            directory = %record.directory,
            run_by = %record.run_by,
            status = %record.status,
            "sending run outcome to audit API"
        );

        self.client
            .post(url)
            .json(&record)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?
            .error_for_status()
            .with_context(|| format!("audit API at {url} rejected the report"))?;

        Ok(())
    }
}
