// src/audit/record.rs

//! The JSON body posted to the audit endpoint.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::exec::ExecutionAttempt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Success,
    Failed,
}

impl AuditStatus {
    pub fn from_exit_code(exit_code: i32) -> Self {
        if exit_code == 0 {
            AuditStatus::Success
        } else {
            AuditStatus::Failed
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditStatus::Success => f.write_str("SUCCESS"),
            AuditStatus::Failed => f.write_str("FAILED"),
        }
    }
}

/// Outcome of one top-level invocation, as seen by the audit service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    pub directory: String,
    pub status: AuditStatus,
    pub run_by: String,
    pub output: Vec<String>,
}

impl AuditRecord {
    pub fn new(directory: String, attempt: &ExecutionAttempt, run_by: impl Into<String>) -> Self {
        Self {
            directory,
            status: AuditStatus::from_exit_code(attempt.exit_code),
            run_by: run_by.into(),
            output: attempt.output.clone(),
        }
    }
}

/// `dir` relative to `root`, rendered with a leading `/`.
///
/// Returns an empty string when `dir` is the root itself, and the full path
/// when `dir` is not under `root` at all.
pub fn directory_label(root: &Path, dir: &Path) -> String {
    let relative = dir
        .strip_prefix(root)
        .ok()
        .map(Path::to_path_buf)
        .or_else(|| {
            // git reports canonical paths; the working dir may contain symlinks.
            let root = root.canonicalize().ok()?;
            let dir = dir.canonicalize().ok()?;
            dir.strip_prefix(&root).ok().map(Path::to_path_buf)
        });

    match relative {
        Some(rel) => rel
            .components()
            .map(|c| format!("/{}", c.as_os_str().to_string_lossy()))
            .collect(),
        None => dir.to_string_lossy().into_owned(),
    }
}

/// Login name of the local user.
///
/// Checked in order: `LOGNAME`, `USER`, `LNAME`, `USERNAME`, then the passwd
/// entry of the current uid. `"unknown"` if all of them come up empty.
pub fn current_user() -> String {
    resolve_user(|var| std::env::var(var).ok())
}

fn resolve_user(lookup: impl Fn(&str) -> Option<String>) -> String {
    ["LOGNAME", "USER", "LNAME", "USERNAME"]
        .into_iter()
        .find_map(|var| lookup(var).filter(|v| !v.is_empty()))
        .or_else(login_from_passwd)
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(unix)]
fn login_from_passwd() -> Option<String> {
    use nix::unistd::{Uid, User};

    match User::from_uid(Uid::current()) {
        Ok(user) => user.map(|u| u.name).filter(|name| !name.is_empty()),
        Err(err) => {
            tracing::debug!(error = %err, "passwd lookup for current uid failed");
            None
        }
    }
}

#[cfg(not(unix))]
fn login_from_passwd() -> Option<String> {
    None
}
