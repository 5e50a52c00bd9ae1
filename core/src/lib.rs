pub mod val;

// Bytecode programs, execution contexts and the stack machine
pub mod vm;

pub use val::{EngineHandle, EngineType, Variable, VariableKind, Vector3};
pub use vm::{
    ExecutionContext, ExecutionState, HaltKind, Instruction, NativeRoutine, OBJECT_INVALID, OBJECT_SELF, Op, Program,
    ProgramFile, Routine, RoutineTable, Routines, RunOutcome, VirtualMachine, VmConfig, VmError, VmState,
    describe_instruction,
};
