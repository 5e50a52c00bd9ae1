mod call;
mod exec;
mod math;

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::val::Variable;

use super::bytecode::START_OFFSET;
use super::config::VmConfig;
use super::context::{ExecutionContext, ExecutionState};
use super::describe::describe_instruction;
use super::error::VmError;
use super::program::Program;
use super::stack::OperandStack;

/// Lifecycle of a machine. A machine runs at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Ready,
    Running,
    HaltedNormal,
    HaltedFault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltKind {
    Normal,
    Fault,
}

/// What a run produced. `result` is the script-visible integer; the halt kind
/// tells a fault apart from a script that simply returned nothing.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub result: i32,
    pub halt: HaltKind,
    pub fault: Option<VmError>,
}

/// Stack machine executing one program against one execution context.
pub struct VirtualMachine {
    program: Arc<Program>,
    context: ExecutionContext,
    config: VmConfig,
    stack: OperandStack,
    return_offsets: Vec<u32>,
    // Frame boundary used by the *BP opcodes.
    global_count: usize,
    next_offset: u32,
    saved_state: Option<Arc<ExecutionState>>,
    state: VmState,
    outcome: Option<RunOutcome>,
}

impl VirtualMachine {
    pub fn new(program: Arc<Program>, context: ExecutionContext) -> Self {
        Self {
            program,
            context,
            config: VmConfig::default(),
            stack: OperandStack::new(),
            return_offsets: Vec::new(),
            global_count: 0,
            next_offset: 0,
            saved_state: None,
            state: VmState::Ready,
            outcome: None,
        }
    }

    /// Machine resuming the continuation carried by an Action's context.
    pub fn from_continuation(context: &ExecutionContext) -> Result<Self, VmError> {
        let state = context.saved_state.as_ref().ok_or(VmError::MissingSavedState)?;
        Ok(Self::new(Arc::clone(&state.program), context.clone()))
    }

    pub fn with_config(mut self, config: VmConfig) -> Self {
        self.config = config;
        self
    }

    /// Run to completion and return the top Int of the final stack, or -1.
    ///
    /// Faults also yield -1; use [`execute`](Self::execute) to tell them apart.
    pub fn run(&mut self) -> i32 {
        self.execute().result
    }

    pub fn execute(&mut self) -> RunOutcome {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        self.state = VmState::Running;
        let start = self.prepare();
        debug!(
            target: "nwscript::vm",
            program = self.program.name(),
            offset = format_args!("{:04x}", start),
            caller = self.context.caller_id,
            triggerer = self.context.triggerer_id,
            "run"
        );

        let outcome = match self.run_from(start) {
            Ok(()) => {
                self.state = VmState::HaltedNormal;
                let result = match self.stack.top() {
                    Some(Variable::Int(value)) => *value,
                    _ => -1,
                };
                debug!(target: "nwscript::vm", program = self.program.name(), result, "halt");
                RunOutcome {
                    result,
                    halt: HaltKind::Normal,
                    fault: None,
                }
            }
            Err(err) => {
                self.state = VmState::HaltedFault;
                warn!(
                    target: "nwscript::vm",
                    program = self.program.name(),
                    error = %err,
                    "halt on fault"
                );
                RunOutcome {
                    result: -1,
                    halt: HaltKind::Fault,
                    fault: Some(err),
                }
            }
        };
        self.outcome = Some(outcome.clone());
        outcome
    }

    // Seed the stack from a saved state, if any, and pick the start offset.
    fn prepare(&mut self) -> u32 {
        match self.context.saved_state.clone() {
            Some(state) => {
                self.stack.extend_from_slice(&state.globals);
                self.global_count = self.stack.len();
                self.stack.extend_from_slice(&state.locals);
                state.ins_offset
            }
            None => START_OFFSET,
        }
    }

    fn run_from(&mut self, start: u32) -> Result<(), VmError> {
        let program = Arc::clone(&self.program);
        let limit = self.config.instruction_limit;
        let mut offset = start;
        let mut executed: u64 = 0;

        while offset < program.length() {
            if let Some(limit) = limit
                && executed >= limit
            {
                return Err(VmError::InstructionLimitExceeded(limit));
            }
            let ins = program.instruction_at(offset)?;
            self.next_offset = ins.next_offset;
            trace!(
                target: "nwscript::vm::instr",
                "{}",
                describe_instruction(ins, self.context.routines.as_deref())
            );
            self.step(ins)?;
            executed += 1;
            offset = self.next_offset;
        }
        Ok(())
    }

    /// Resolve `offset + jump_offset` into the next offset.
    fn jump(&mut self, offset: u32, jump_offset: i32) -> Result<(), VmError> {
        let target = i64::from(offset) + i64::from(jump_offset);
        self.next_offset = u32::try_from(target).map_err(|_| VmError::InvalidOffset(target))?;
        Ok(())
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn stack(&self) -> &[Variable] {
        self.stack.as_slice()
    }

    pub fn stack_size(&self) -> usize {
        self.stack.len()
    }

    /// Slot `index` counted from the bottom of the stack.
    pub fn stack_variable(&self, index: usize) -> Option<&Variable> {
        self.stack.as_slice().get(index)
    }

    pub fn global_count(&self) -> usize {
        self.global_count
    }

    /// Most recent STORE_STATE snapshot.
    pub fn saved_state(&self) -> Option<&Arc<ExecutionState>> {
        self.saved_state.as_ref()
    }

    pub fn fault(&self) -> Option<&VmError> {
        self.outcome.as_ref().and_then(|o| o.fault.as_ref())
    }
}
