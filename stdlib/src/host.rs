use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use anyhow::anyhow;
use nwscript_core::{ExecutionContext, HaltKind, OBJECT_INVALID, RunOutcome, VirtualMachine, VmConfig};
use tracing::{info, warn};

/// Upper bound on drain rounds; deferred actions may keep scheduling more.
const MAX_DEFERRED_ROUNDS: usize = 64;

/// An action queued by AssignCommand or DelayCommand.
#[derive(Debug, Clone)]
pub struct DeferredCommand {
    pub subject: u32,
    pub delay: f32,
    pub action: Arc<ExecutionContext>,
}

#[derive(Debug, Clone)]
pub struct DeferredRun {
    pub subject: u32,
    pub delay: f32,
    pub outcome: RunOutcome,
}

#[derive(Debug, Clone)]
struct HostObject {
    id: u32,
    tag: String,
}

/// Minimal stand-in for the game world the routines talk to: a set of tagged
/// objects, a console and a queue of deferred commands.
#[derive(Debug, Default)]
pub struct Host {
    config: VmConfig,
    objects: Mutex<Vec<HostObject>>,
    console: Mutex<Vec<String>>,
    commands: Mutex<Vec<DeferredCommand>>,
}

/// Weak handle on a host, held by routine closures. Queued commands keep the
/// routine table alive, so the table never keeps its host alive.
#[derive(Debug, Clone)]
pub(crate) struct HostRef(Weak<Host>);

impl HostRef {
    pub(crate) fn new(host: &Arc<Host>) -> Self {
        Self(Arc::downgrade(host))
    }

    pub(crate) fn get(&self) -> anyhow::Result<Arc<Host>> {
        self.0.upgrade().ok_or_else(|| anyhow!("host is no longer available"))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config applied to every deferred run.
    pub fn with_config(mut self, config: VmConfig) -> Self {
        self.config = config;
        self
    }

    /// Make `id` a valid object tagged `tag`. Re-spawning an id replaces its tag.
    pub fn spawn(&self, id: u32, tag: &str) {
        let mut objects = lock(&self.objects);
        match objects.iter_mut().find(|o| o.id == id) {
            Some(object) => object.tag = tag.to_string(),
            None => objects.push(HostObject {
                id,
                tag: tag.to_string(),
            }),
        }
    }

    pub fn is_valid(&self, id: u32) -> bool {
        id != OBJECT_INVALID && lock(&self.objects).iter().any(|o| o.id == id)
    }

    pub fn tag_of(&self, id: u32) -> Option<String> {
        lock(&self.objects).iter().find(|o| o.id == id).map(|o| o.tag.clone())
    }

    /// The `nth` object in spawn order whose tag matches, ignoring case.
    pub fn find_by_tag(&self, tag: &str, nth: usize) -> Option<u32> {
        lock(&self.objects)
            .iter()
            .filter(|o| o.tag.eq_ignore_ascii_case(tag))
            .nth(nth)
            .map(|o| o.id)
    }

    pub fn print(&self, line: String) {
        info!(target: "nwscript::stdlib", "{}", line);
        lock(&self.console).push(line);
    }

    /// Lines printed so far.
    pub fn console(&self) -> Vec<String> {
        lock(&self.console).clone()
    }

    pub fn schedule(&self, subject: u32, delay: f32, action: Arc<ExecutionContext>) {
        lock(&self.commands).push(DeferredCommand { subject, delay, action });
    }

    pub fn pending(&self) -> Vec<DeferredCommand> {
        lock(&self.commands).clone()
    }

    /// Run queued commands by ascending delay until the queue is empty.
    ///
    /// Each command resumes its action's continuation with the subject as the
    /// caller. Commands queued while draining run in a later round.
    pub fn run_deferred(&self) -> Vec<DeferredRun> {
        let mut runs = Vec::new();
        for _ in 0..MAX_DEFERRED_ROUNDS {
            let mut batch = std::mem::take(&mut *lock(&self.commands));
            if batch.is_empty() {
                return runs;
            }
            batch.sort_by(|a, b| a.delay.total_cmp(&b.delay));
            for command in batch {
                let outcome = self.resume(&command);
                runs.push(DeferredRun {
                    subject: command.subject,
                    delay: command.delay,
                    outcome,
                });
            }
        }
        let dropped = lock(&self.commands).len();
        if dropped > 0 {
            warn!(target: "nwscript::stdlib", dropped, "deferred commands left after drain limit");
        }
        runs
    }

    fn resume(&self, command: &DeferredCommand) -> RunOutcome {
        let ctx = ExecutionContext {
            caller_id: command.subject,
            ..(*command.action).clone()
        };
        let outcome = match VirtualMachine::from_continuation(&ctx) {
            Ok(vm) => vm.with_config(self.config).execute(),
            Err(err) => RunOutcome {
                result: -1,
                halt: HaltKind::Fault,
                fault: Some(err),
            },
        };
        info!(
            target: "nwscript::stdlib",
            subject = command.subject,
            delay = command.delay,
            result = outcome.result,
            "deferred command"
        );
        outcome
    }
}
