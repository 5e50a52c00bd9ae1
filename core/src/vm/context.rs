use std::fmt;
use std::sync::Arc;

use crate::val::Variable;

use super::program::Program;
use super::routine::Routines;

/// Object id that CONSTO rewrites to the context's caller.
pub const OBJECT_SELF: u32 = 0;
/// Object id meaning "no object".
pub const OBJECT_INVALID: u32 = 1;

/// Snapshot captured by STORE_STATE; resuming it starts a fresh run at `ins_offset`
/// with `globals` then `locals` on the stack.
#[derive(Debug, Clone)]
pub struct ExecutionState {
    pub globals: Vec<Variable>,
    pub locals: Vec<Variable>,
    pub program: Arc<Program>,
    pub ins_offset: u32,
}

/// Environment handed to a run and to every routine it calls.
#[derive(Clone)]
pub struct ExecutionContext {
    pub routines: Option<Arc<dyn Routines>>,
    pub saved_state: Option<Arc<ExecutionState>>,
    pub caller_id: u32,
    pub triggerer_id: u32,
    pub user_defined_event_number: i32,
    pub script_var: i32,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            routines: None,
            saved_state: None,
            caller_id: OBJECT_INVALID,
            triggerer_id: OBJECT_INVALID,
            user_defined_event_number: -1,
            script_var: -1,
        }
    }
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_routines(mut self, routines: Arc<dyn Routines>) -> Self {
        self.routines = Some(routines);
        self
    }

    pub fn with_caller(mut self, caller_id: u32) -> Self {
        self.caller_id = caller_id;
        self
    }

    pub fn with_triggerer(mut self, triggerer_id: u32) -> Self {
        self.triggerer_id = triggerer_id;
        self
    }

    pub fn with_user_defined_event(mut self, number: i32) -> Self {
        self.user_defined_event_number = number;
        self
    }

    pub fn with_script_var(mut self, value: i32) -> Self {
        self.script_var = value;
        self
    }

    pub fn with_saved_state(mut self, state: Arc<ExecutionState>) -> Self {
        self.saved_state = Some(state);
        self
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("routines", &self.routines.as_ref().map(|_| "<routines>"))
            .field("saved_state", &self.saved_state.as_ref().map(|s| s.ins_offset))
            .field("caller_id", &self.caller_id)
            .field("triggerer_id", &self.triggerer_id)
            .field("user_defined_event_number", &self.user_defined_event_number)
            .field("script_var", &self.script_var)
            .finish()
    }
}
