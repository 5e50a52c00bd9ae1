use super::*;

fn counting_loop() -> Vec<Op> {
    // i = 0; while (i < 10) i++; return i;
    vec![
        Op::ConstI(0),
        Op::ConstI(10),
        Op::CpTopSp { stack_offset: -8, size: 8 },
        Op::LtII,
        Op::Jz { jump_offset: 18 },
        Op::IncISp { stack_offset: -8 },
        Op::Jmp { jump_offset: -22 },
        Op::MovSp { stack_offset: -4 },
    ]
}

#[test]
fn test_vm_loop() {
    let (vm, outcome) = run_ops(counting_loop());
    assert_eq!(outcome.result, 10);
    assert_eq!(ints(&vm), vec![10]);
}

#[test]
fn test_vm_loop_with_trailing_retn() {
    let mut ops = counting_loop();
    ops.push(Op::Retn);
    let (_, outcome) = run_ops(ops);
    assert_eq!(outcome.result, 10);
    assert_eq!(outcome.halt, HaltKind::Normal);
}

#[test]
fn test_vm_subroutine() {
    let (vm, outcome) = run_ops(vec![
        Op::RsAddI,
        Op::ConstI(21),
        Op::Jsr { jump_offset: 8 },
        Op::Retn,
        Op::CpTopSp { stack_offset: -4, size: 4 },
        Op::CpTopSp { stack_offset: -4, size: 4 },
        Op::AddII,
        Op::CpDownSp { stack_offset: -12, size: 4 },
        Op::MovSp { stack_offset: -8 },
        Op::Retn,
    ]);
    assert_eq!(outcome.result, 42);
    assert_eq!(ints(&vm), vec![42]);
}

#[test]
fn test_vm_jnz_branches_on_nonzero() {
    // 13 CONSTI 1, 19 JNZ +12 -> 31, 25 CONSTI 7, 31 CONSTI 9
    let (vm, _) = run_ops(vec![
        Op::ConstI(1),
        Op::Jnz { jump_offset: 12 },
        Op::ConstI(7),
        Op::ConstI(9),
    ]);
    assert_eq!(ints(&vm), vec![9]);

    let (vm, _) = run_ops(vec![
        Op::ConstI(0),
        Op::Jnz { jump_offset: 12 },
        Op::ConstI(7),
        Op::ConstI(9),
    ]);
    assert_eq!(ints(&vm), vec![7, 9]);
}

#[test]
fn test_vm_jump_past_end_halts_normally() {
    let (vm, outcome) = run_ops(vec![Op::ConstI(5), Op::Jmp { jump_offset: 1000 }, Op::ConstI(6)]);
    assert_eq!(outcome.result, 5);
    assert_eq!(outcome.halt, HaltKind::Normal);
    assert_eq!(vm.stack_size(), 1);
}

#[test]
fn test_vm_jump_into_gap_or_before_start_faults() {
    let (_, outcome) = run_ops(vec![Op::Jmp { jump_offset: -100 }]);
    assert!(matches!(outcome.fault, Some(VmError::InvalidOffset(-87))));

    // offset 5 sits before the first instruction
    let (_, outcome) = run_ops(vec![Op::Jmp { jump_offset: -8 }]);
    assert!(matches!(outcome.fault, Some(VmError::InvalidOffset(5))));
}

#[test]
fn test_vm_jump_into_middle_of_instruction_resumes_it() {
    // 13 CONSTI 4, 19 JMP -4 -> 15 which lies inside CONSTI 4's region
    let mut program = Program::new("mid");
    program.add(Op::ConstI(4)).add(Op::Jmp { jump_offset: -4 });
    let mut vm = VirtualMachine::new(Arc::new(program), ExecutionContext::default())
        .with_config(VmConfig::new().with_instruction_limit(5));
    let outcome = vm.execute();
    assert!(matches!(outcome.fault, Some(VmError::InstructionLimitExceeded(5))));
    assert_eq!(vm.stack_size(), 3);
}

#[test]
fn test_vm_instruction_limit_stops_infinite_loop() {
    let mut vm = VirtualMachine::new(build_program(vec![Op::Jmp { jump_offset: 0 }]), ExecutionContext::default())
        .with_config(VmConfig::new().with_instruction_limit(100));
    let outcome = vm.execute();
    assert_eq!(outcome.result, -1);
    assert_eq!(outcome.halt, HaltKind::Fault);
    assert!(matches!(vm.fault(), Some(VmError::InstructionLimitExceeded(100))));
}

#[test]
fn test_vm_unknown_opcode_faults() {
    let (_, outcome) = run_ops(vec![Op::ConstI(3), Op::Unknown { code: 0x00ff }]);
    assert_eq!(outcome.result, -1);
    assert!(matches!(outcome.fault, Some(VmError::UnknownOpcode { code: 0x00ff })));
}

#[test]
fn test_vm_nops_do_nothing() {
    let (vm, outcome) = run_ops(vec![Op::Nop, Op::ConstI(2), Op::Nop2]);
    assert_eq!(outcome.result, 2);
    assert_eq!(vm.stack_size(), 1);
}

#[test]
fn test_vm_runs_once_and_caches_outcome() {
    let mut vm = VirtualMachine::new(build_program(vec![Op::ConstI(1), Op::ConstI(2), Op::AddII]), ExecutionContext::default());
    assert_eq!(vm.state(), VmState::Ready);
    assert_eq!(vm.run(), 3);
    assert_eq!(vm.run(), 3);
    assert_eq!(vm.stack_size(), 1);
    assert_eq!(vm.state(), VmState::HaltedNormal);
}

#[test]
fn test_vm_result_ignores_non_int_top() {
    let (_, outcome) = run_ops(vec![Op::ConstI(4), Op::ConstS("x".into())]);
    assert_eq!(outcome.result, -1);
    assert_eq!(outcome.halt, HaltKind::Normal);
}
