pub mod builders;
pub mod capture_server;
pub mod scripted_runner;

use std::sync::Once;
use std::time::Duration;

use tfwrap::audit::AuditReporter;
use tfwrap::logging::LOG_ENV_VAR;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Logs go through `with_test_writer()`, so the harness only shows them for
/// failing tests (or with `-- --nocapture`). The filter is read from
/// `TFWRAP_LOG`, like the binary, and defaults to `warn,tfwrap=debug`, e.g.
/// `TFWRAP_LOG=tfwrap::audit=trace,reqwest=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new("warn,tfwrap=debug"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Run a future with a 10-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}

/// Audit reporter for tests: fixed user, short timeout, and no proxy so that
/// requests to the local capture server never leave the machine.
pub fn local_audit_reporter(run_by: &str) -> AuditReporter {
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("build reqwest client");

    AuditReporter::new()
        .expect("build audit reporter")
        .with_client(client)
        .with_run_by(run_by)
}
