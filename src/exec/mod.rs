// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`spec`] defines what to run ([`CommandSpec`]) and what one run produced
//!   ([`ExecutionAttempt`]).
//! - [`runner`] provides the [`ProcessRunner`] trait and the
//!   [`RealProcessRunner`] that spawns OS processes and streams their output.
//! - [`capture`] decodes captured bytes into text.
//! - [`catalog`] holds the transient-error phrase list.
//! - [`backoff`] computes jittered waits between attempts.
//! - [`retry`] wraps a runner in the bounded retry loop.

pub mod backoff;
pub mod capture;
pub mod catalog;
pub mod retry;
pub mod runner;
pub mod spec;

pub use backoff::{BackoffPolicy, Jitter};
pub use catalog::{TransientErrorCatalog, DEFAULT_RETRIABLE_ERRORS};
pub use retry::{RetryDecision, RetryScheduler, RetryState, Termination, MAX_ATTEMPTS};
pub use runner::{ProcessRunner, RealProcessRunner};
pub use spec::{CommandLine, CommandSpec, ExecutionAttempt, DEFAULT_TIMEOUT_SECS};
