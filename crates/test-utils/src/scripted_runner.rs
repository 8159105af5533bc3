use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use tfwrap::errors::{Result, WrapperError};
use tfwrap::exec::{CommandSpec, ExecutionAttempt, ProcessRunner};

/// One scripted spawn.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Exit(ExecutionAttempt),
    SpawnError,
}

/// A fake runner that:
/// - replays scripted attempts in order (the last step repeats forever)
/// - records every spec it was asked to run, including failed spawns
pub struct ScriptedRunner {
    steps: Mutex<VecDeque<ScriptStep>>,
    last: Mutex<Option<ScriptStep>>,
    spawned: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            last: Mutex::new(None),
            spawned: Mutex::new(Vec::new()),
        }
    }

    pub fn from_attempts(attempts: impl IntoIterator<Item = ExecutionAttempt>) -> Self {
        Self::new(attempts.into_iter().map(ScriptStep::Exit))
    }

    /// Always returns the same attempt.
    pub fn always(attempt: ExecutionAttempt) -> Self {
        Self::from_attempts([attempt])
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.lock().unwrap().len()
    }

    pub fn spawned_specs(&self) -> Vec<CommandSpec> {
        self.spawned.lock().unwrap().clone()
    }

    fn next_step(&self) -> ScriptStep {
        let mut steps = self.steps.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        match steps.pop_front() {
            Some(step) => {
                *last = Some(step.clone());
                step
            }
            None => last
                .clone()
                .expect("ScriptedRunner needs at least one scripted step"),
        }
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run<'a>(
        &'a self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionAttempt>> + Send + 'a>> {
        Box::pin(async move {
            let step = self.next_step();
            self.spawned.lock().unwrap().push(spec.clone());
            match step {
                ScriptStep::Exit(attempt) => Ok(attempt),
                ScriptStep::SpawnError => Err(WrapperError::Spawn {
                    command: spec.command.display(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "scripted spawn failure",
                    ),
                }),
            }
        })
    }
}
