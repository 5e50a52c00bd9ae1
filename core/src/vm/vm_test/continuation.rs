use super::*;

// 13 CONSTI 1, 19 CONSTI 2, 25 CONSTI 3, 31 SAVEBP, 33 CONSTI 4, 39 CONSTI 5,
// 45 STORE_STATE, 55 JMP -> 68, 61 ACTION 1, 66 RETN, 68 ACTION 0, 73 MOVSP
fn store_state_program() -> Vec<Op> {
    vec![
        Op::ConstI(1),
        Op::ConstI(2),
        Op::ConstI(3),
        Op::SaveBp,
        Op::ConstI(4),
        Op::ConstI(5),
        Op::StoreState { size: 8, size_locals: 4 },
        Op::Jmp { jump_offset: 13 },
        Op::Action { routine: 1, arg_count: 1 },
        Op::Retn,
        Op::Action { routine: 0, arg_count: 1 },
        Op::MovSp { stack_offset: -24 },
    ]
}

fn schedule_and_resume(resume_result: Variable) -> (Arc<MockRoutine>, Arc<MockRoutine>) {
    let schedule = MockRoutine::new("Schedule", VariableKind::Void, Variable::Void, vec![VariableKind::Action]);
    let resume_kind = resume_result.kind();
    let resume = MockRoutine::new("Resume", resume_kind, resume_result, vec![VariableKind::Int]);
    (schedule, resume)
}

fn captured_action(routine: &MockRoutine) -> Arc<ExecutionContext> {
    let invocations = routine.invocations();
    assert_eq!(invocations.len(), 1);
    Arc::clone(invocations[0][0].as_action().unwrap())
}

#[test]
fn test_vm_store_state() {
    let (schedule, resume) = schedule_and_resume(Variable::Void);
    let ctx = ExecutionContext::default().with_routines(routines(&[Arc::clone(&schedule), Arc::clone(&resume)]));
    let (vm, outcome) = run_ops_with(store_state_program(), ctx);

    assert_eq!(outcome.result, -1);
    assert_eq!(outcome.halt, HaltKind::Normal);
    assert_eq!(vm.stack_size(), 0);
    assert!(resume.invocations().is_empty());

    let action = captured_action(&schedule);
    let state = action.saved_state.as_ref().unwrap();
    assert_eq!(state.globals, vec![Variable::Int(2), Variable::Int(3)]);
    assert_eq!(state.locals, vec![Variable::Int(5)]);
    assert_eq!(state.ins_offset, 61);
    assert!(Arc::ptr_eq(&state.program, vm.program()));
    assert!(Arc::ptr_eq(state, vm.saved_state().unwrap()));
}

#[test]
fn test_vm_resume_continuation() {
    let (schedule, resume) = schedule_and_resume(Variable::Void);
    let ctx = ExecutionContext::default().with_routines(routines(&[Arc::clone(&schedule), Arc::clone(&resume)]));
    run_ops_with(store_state_program(), ctx);

    let action = captured_action(&schedule);
    let mut vm = VirtualMachine::from_continuation(&action).unwrap();
    let outcome = vm.execute();

    assert_eq!(resume.invocations(), vec![vec![Variable::Int(5)]]);
    assert_eq!(outcome.result, 3);
    assert_eq!(outcome.halt, HaltKind::Normal);
    assert_eq!(ints(&vm), vec![2, 3]);
    assert_eq!(vm.global_count(), 2);
}

#[test]
fn test_vm_resume_twice_with_different_routines() {
    let (schedule, _) = schedule_and_resume(Variable::Void);
    let (_, first) = schedule_and_resume(Variable::Int(100));
    let (_, second) = schedule_and_resume(Variable::Int(200));
    let ctx = ExecutionContext::default().with_routines(routines(&[Arc::clone(&schedule), Arc::clone(&first)]));
    run_ops_with(store_state_program(), ctx);
    let action = captured_action(&schedule);

    let ctx_a = (*action).clone().with_routines(routines(&[Arc::clone(&schedule), Arc::clone(&first)]));
    let ctx_b = (*action).clone().with_routines(routines(&[Arc::clone(&schedule), Arc::clone(&second)]));

    let mut vm_a = VirtualMachine::from_continuation(&ctx_a).unwrap();
    assert_eq!(vm_a.run(), 100);
    let mut vm_b = VirtualMachine::from_continuation(&ctx_b).unwrap();
    assert_eq!(vm_b.run(), 200);

    assert_eq!(first.invocations(), vec![vec![Variable::Int(5)]]);
    assert_eq!(second.invocations(), vec![vec![Variable::Int(5)]]);

    let state = action.saved_state.as_ref().unwrap();
    assert_eq!(state.globals, vec![Variable::Int(2), Variable::Int(3)]);
    assert_eq!(state.locals, vec![Variable::Int(5)]);
    assert_eq!(state.ins_offset, 61);
}

#[test]
fn test_vm_snapshot_is_a_copy() {
    let (vm, _) = run_ops(vec![
        Op::SaveBp,
        Op::ConstI(7),
        Op::StoreState { size: 0, size_locals: 4 },
        Op::IncISp { stack_offset: -4 },
    ]);
    assert_eq!(ints(&vm), vec![0, 8]);
    let state = vm.saved_state().unwrap();
    assert!(state.globals.is_empty());
    assert_eq!(state.locals, vec![Variable::Int(7)]);
    // 21 STORE_STATE resumes at 37
    assert_eq!(state.ins_offset, 37);
}

#[test]
fn test_vm_store_state_larger_than_stack_faults() {
    let (_, outcome) = run_ops(vec![Op::ConstI(1), Op::StoreState { size: 0, size_locals: 8 }]);
    assert!(matches!(outcome.fault, Some(VmError::StackIndexOutOfRange { .. })));
}

#[test]
fn test_vm_action_argument_without_snapshot() {
    let (schedule, _) = schedule_and_resume(Variable::Void);
    let ctx = ExecutionContext::default()
        .with_caller(9)
        .with_routines(routines(&[Arc::clone(&schedule)]));
    let (vm, outcome) = run_ops_with(vec![Op::Action { routine: 0, arg_count: 1 }], ctx);

    assert_eq!(outcome.halt, HaltKind::Normal);
    assert_eq!(vm.stack_size(), 0);
    let action = captured_action(&schedule);
    assert!(action.saved_state.is_none());
    assert_eq!(action.caller_id, 9);
    assert!(matches!(
        VirtualMachine::from_continuation(&action),
        Err(VmError::MissingSavedState)
    ));
}

#[test]
fn test_vm_continuation_keeps_context_fields() {
    let state = Arc::new(ExecutionState {
        globals: vec![Variable::Int(4)],
        locals: vec![],
        program: build_program(vec![Op::ConstI(1), Op::AddII]),
        ins_offset: 13,
    });
    let ctx = ExecutionContext::default()
        .with_triggerer(3)
        .with_user_defined_event(1001)
        .with_saved_state(state);
    let mut vm = VirtualMachine::from_continuation(&ctx).unwrap();
    assert_eq!(vm.run(), 5);
    assert_eq!(vm.context().triggerer_id, 3);
    assert_eq!(vm.context().user_defined_event_number, 1001);
}
