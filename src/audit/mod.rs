// src/audit/mod.rs

//! Audit reporting.
//!
//! After the retry loop has produced its final attempt, the outcome can be
//! posted to an external audit service. Posting is strictly best-effort:
//! nothing here can change the exit code or output handed back to the caller.

pub mod git;
pub mod record;
pub mod reporter;

pub use git::{Git2RootLocator, GitRootLocator};
pub use record::{current_user, directory_label, AuditRecord, AuditStatus};
pub use reporter::AuditReporter;
