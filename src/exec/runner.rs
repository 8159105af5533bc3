// src/exec/runner.rs

//! Single-attempt process runner.
//!
//! Stdout (and stderr, when captured) is redirected into one temporary file.
//! A second, independent handle on that file is drained while the child runs,
//! echoing to our own stdout as bytes arrive. Once the child has exited the
//! file is drained one final time, then rewound and split into lines.

use std::future::Future;
use std::io::{SeekFrom, Write};
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info};

use crate::errors::{Result, WrapperError};
use crate::exec::capture::{split_lines, LossyDecoder};
use crate::exec::spec::{CommandSpec, ExecutionAttempt};

const READ_CHUNK: usize = 4096;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Trait abstracting how one attempt of a command is executed.
///
/// Production code uses [`RealProcessRunner`]; tests can provide their own
/// implementation that replays scripted results instead of spawning processes.
pub trait ProcessRunner: Send + Sync {
    /// Spawn exactly one process for `spec` and wait for it to finish.
    fn run<'a>(
        &'a self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionAttempt>> + Send + 'a>>;
}

/// Runner backed by real OS processes.
#[derive(Debug, Clone)]
pub struct RealProcessRunner {
    poll_interval: Duration,
}

impl Default for RealProcessRunner {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl RealProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long to sleep when the capture file has no new data and the child
    /// is still running.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    async fn run_once(&self, spec: &CommandSpec) -> Result<ExecutionAttempt> {
        let shown = spec.command.display();

        if spec.print_command {
            echo(&format!("Executing: {shown}\n"))?;
        }

        // Deleted when dropped at the end of the attempt.
        let capture = NamedTempFile::new()?;
        let stdout_handle = capture.reopen()?;
        let stderr = if spec.capture_stderr {
            Stdio::from(stdout_handle.try_clone()?)
        } else {
            Stdio::null()
        };

        let mut cmd = spec.to_command()?;
        cmd.stdout(Stdio::from(stdout_handle)).stderr(stderr);

        debug!(
            command = %shown,
            cwd = ?spec.working_dir,
            capture_stderr = spec.capture_stderr,
            "spawning process"
        );

        let mut child = cmd.spawn().map_err(|source| WrapperError::Spawn {
            command: shown.clone(),
            source,
        })?;
        // Release our copies of the write handles.
        drop(cmd);

        let mut reader = tokio::fs::File::from_std(capture.reopen()?);
        let mut decoder = LossyDecoder::new();
        let mut buf = vec![0u8; READ_CHUNK];
        let mut exited: Option<ExitStatus> = None;

        // Poll, then drain: after seeing the child exit we keep reading until
        // the file is exhausted, so output written right before exit is kept.
        let status = loop {
            let n = reader.read(&mut buf).await?;
            if n > 0 {
                if spec.print_output {
                    echo(&decoder.push(&buf[..n]))?;
                }
                continue;
            }

            if let Some(status) = exited {
                break status;
            }

            match child.try_wait()? {
                Some(status) => exited = Some(status),
                None => tokio::time::sleep(self.poll_interval).await,
            }
        };

        if spec.print_output {
            echo(&decoder.finish())?;
        }

        reader.seek(SeekFrom::Start(0)).await?;
        let mut captured = Vec::new();
        reader.read_to_end(&mut captured).await?;

        let exit_code = exit_code_of(status);
        let output = split_lines(&captured);

        info!(
            command = %shown,
            exit_code,
            lines = output.len(),
            "process exited"
        );

        Ok(ExecutionAttempt::new(exit_code, output))
    }
}

impl ProcessRunner for RealProcessRunner {
    fn run<'a>(
        &'a self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionAttempt>> + Send + 'a>> {
        Box::pin(self.run_once(spec))
    }
}

/// Exit code of a finished process. Signal deaths report the negated signal
/// number on Unix and `-1` elsewhere.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    -1
}

fn echo(text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    let mut out = std::io::stdout().lock();
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}
