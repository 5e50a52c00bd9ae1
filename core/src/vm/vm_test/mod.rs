pub(super) use std::sync::{Arc, Mutex};

pub(super) use anyhow::Result;

pub(super) use crate::{
    val::{Variable, VariableKind, Vector3},
    vm::{
        ExecutionContext, ExecutionState, HaltKind, OBJECT_INVALID, Op, Program, Routine, RoutineTable, Routines,
        RunOutcome, VirtualMachine, VmConfig, VmError, VmState,
    },
};

pub(super) fn build_program(ops: Vec<Op>) -> Arc<Program> {
    let mut program = Program::new("some_program");
    for op in ops {
        program.add(op);
    }
    Arc::new(program)
}

pub(super) fn run_ops(ops: Vec<Op>) -> (VirtualMachine, RunOutcome) {
    run_ops_with(ops, ExecutionContext::default())
}

pub(super) fn run_ops_with(ops: Vec<Op>, ctx: ExecutionContext) -> (VirtualMachine, RunOutcome) {
    let mut vm = VirtualMachine::new(build_program(ops), ctx);
    let outcome = vm.execute();
    (vm, outcome)
}

pub(super) fn assert_float(value: Option<&Variable>, expected: f32) {
    match value {
        Some(Variable::Float(actual)) => assert!(
            (actual - expected).abs() < 1e-5,
            "expected {}, got {}",
            expected,
            actual
        ),
        other => panic!("expected float {}, got {:?}", expected, other),
    }
}

pub(super) fn ints(vm: &VirtualMachine) -> Vec<i32> {
    vm.stack().iter().map(|v| v.as_int().unwrap()).collect()
}

/// Routine that records its arguments and returns a fixed value.
pub(super) struct MockRoutine {
    name: String,
    return_type: VariableKind,
    result: Variable,
    argument_types: Vec<VariableKind>,
    invocations: Mutex<Vec<Vec<Variable>>>,
}

impl MockRoutine {
    pub(super) fn new(
        name: &str,
        return_type: VariableKind,
        result: Variable,
        argument_types: Vec<VariableKind>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            return_type,
            result,
            argument_types,
            invocations: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn invocations(&self) -> Vec<Vec<Variable>> {
        self.invocations.lock().unwrap().clone()
    }
}

impl Routine for Arc<MockRoutine> {
    fn name(&self) -> &str {
        &self.name
    }

    fn return_type(&self) -> VariableKind {
        self.return_type
    }

    fn argument_types(&self) -> &[VariableKind] {
        &self.argument_types
    }

    fn invoke(&self, args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        self.invocations.lock().unwrap().push(args.to_vec());
        Ok(self.result.clone())
    }
}

pub(super) fn routines(list: &[Arc<MockRoutine>]) -> Arc<dyn Routines> {
    let mut table = RoutineTable::new();
    for routine in list {
        table.add(Arc::clone(routine));
    }
    Arc::new(table)
}

mod arithmetic;
mod continuation;
mod control_flow;
mod stack;
