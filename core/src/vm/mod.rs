//! NWScript bytecode virtual machine
//!
//! This module holds the instruction set, program container, execution
//! context and saved state, the routine interfaces the host implements, and
//! the stack machine that runs it all.

mod bytecode;
mod config;
mod context;
mod describe;
mod error;
mod program;
mod routine;
mod stack;
#[allow(clippy::module_inception)]
mod vm;

pub use bytecode::{Op, START_OFFSET};
pub use config::{MAX_INSTRUCTIONS_ENV, VmConfig};
pub use context::{ExecutionContext, ExecutionState, OBJECT_INVALID, OBJECT_SELF};
pub use describe::describe_instruction;
pub use error::VmError;
pub use program::{Instruction, Program, ProgramFile};
pub use routine::{NativeRoutine, Routine, RoutineFn, RoutineTable, Routines};
pub use stack::OperandStack;
pub use vm::{HaltKind, RunOutcome, VirtualMachine, VmState};

#[cfg(test)]
mod vm_test;
