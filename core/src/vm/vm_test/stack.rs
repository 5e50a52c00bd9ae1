use super::*;

#[test]
fn test_vm_globals() {
    let (_, outcome) = run_ops(vec![
        Op::RsAddI,
        Op::ConstI(42),
        Op::ConstF(1.0),
        Op::ConstS("some_res_ref".into()),
        Op::ConstO(2),
        Op::SaveBp,
        Op::ConstI(1),
        Op::CpTopBp { stack_offset: -16, size: 4 },
        Op::CpDownBp { stack_offset: -20, size: 4 },
        Op::MovSp { stack_offset: -30 },
    ]);
    assert_eq!(outcome.result, 42);
}

#[test]
fn test_vm_reserve_pushes_defaults() {
    let (vm, _) = run_ops(vec![
        Op::RsAddI,
        Op::RsAddF,
        Op::RsAddS,
        Op::RsAddO,
        Op::RsAddEff,
        Op::RsAddEvt,
        Op::RsAddLoc,
        Op::RsAddTal,
    ]);
    assert_eq!(
        vm.stack(),
        &[
            Variable::Int(0),
            Variable::Float(0.0),
            Variable::of_string(""),
            Variable::Object(OBJECT_INVALID),
            Variable::Effect(None),
            Variable::Event(None),
            Variable::Location(None),
            Variable::Talent(None),
        ]
    );
}

#[test]
fn test_vm_self_object_maps_to_caller() {
    let ctx = ExecutionContext::default().with_caller(77);
    let (vm, _) = run_ops_with(vec![Op::ConstO(0), Op::ConstO(5)], ctx);
    assert_eq!(vm.stack(), &[Variable::Object(77), Variable::Object(5)]);
}

#[test]
fn test_vm_copy_down_then_top_round_trips() {
    let (vm, _) = run_ops(vec![
        Op::RsAddI,
        Op::RsAddI,
        Op::ConstI(8),
        Op::ConstI(9),
        Op::CpDownSp { stack_offset: -16, size: 8 },
        Op::MovSp { stack_offset: -8 },
        Op::CpTopSp { stack_offset: -8, size: 8 },
    ]);
    assert_eq!(ints(&vm), vec![8, 9, 8, 9]);
}

#[test]
fn test_vm_copy_out_of_range_faults() {
    let (_, outcome) = run_ops(vec![Op::ConstI(1), Op::CpTopSp { stack_offset: -8, size: 4 }]);
    assert!(matches!(
        outcome.fault,
        Some(VmError::StackIndexOutOfRange { index: -1, len: 1 })
    ));

    let (_, outcome) = run_ops(vec![Op::ConstI(1), Op::CpDownSp { stack_offset: 4, size: 4 }]);
    assert!(matches!(outcome.fault, Some(VmError::StackIndexOutOfRange { .. })));
}

#[test]
fn test_vm_movsp_positive_offset_is_noop() {
    let (vm, _) = run_ops(vec![Op::ConstI(1), Op::MovSp { stack_offset: 8 }]);
    assert_eq!(vm.stack_size(), 1);

    let (_, outcome) = run_ops(vec![Op::ConstI(1), Op::MovSp { stack_offset: -8 }]);
    assert!(matches!(outcome.fault, Some(VmError::StackUnderflow)));
}

#[test]
fn test_vm_increment_and_decrement_in_place() {
    let (vm, _) = run_ops(vec![
        Op::ConstI(10),
        Op::ConstI(20),
        Op::SaveBp,
        Op::ConstI(30),
        Op::IncISp { stack_offset: -4 },
        Op::DecISp { stack_offset: -16 },
        Op::IncIBp { stack_offset: -4 },
        Op::DecIBp { stack_offset: -4 },
        Op::DecIBp { stack_offset: -4 },
    ]);
    assert_eq!(ints(&vm), vec![9, 19, 2, 31]);
}

#[test]
fn test_vm_increment_non_int_faults() {
    let (_, outcome) = run_ops(vec![Op::ConstF(1.0), Op::IncISp { stack_offset: -4 }]);
    assert!(matches!(
        outcome.fault,
        Some(VmError::TypeMismatch {
            expected: VariableKind::Int,
            actual: VariableKind::Float
        })
    ));
}

#[test]
fn test_vm_negate_requires_matching_kind() {
    let (_, outcome) = run_ops(vec![Op::ConstF(1.0), Op::NegI]);
    assert_eq!(outcome.halt, HaltKind::Fault);

    let (_, outcome) = run_ops(vec![Op::NegF]);
    assert!(matches!(outcome.fault, Some(VmError::StackUnderflow)));
}

#[test]
fn test_vm_save_and_restore_frame_boundary() {
    let (vm, _) = run_ops(vec![
        Op::ConstI(1),
        Op::SaveBp,
        Op::ConstI(2),
        Op::SaveBp,
        Op::CpTopBp { stack_offset: -4, size: 4 },
        Op::MovSp { stack_offset: -4 },
        Op::RestoreBp,
    ]);
    // second SAVEBP recorded a boundary of 3; RESTOREBP pops it back off
    assert_eq!(vm.global_count(), 3);
    assert_eq!(ints(&vm), vec![1, 1, 2]);
}

#[test]
fn test_vm_restore_negative_boundary_faults() {
    let (_, outcome) = run_ops(vec![Op::ConstI(-1), Op::RestoreBp]);
    assert!(matches!(outcome.fault, Some(VmError::StackIndexOutOfRange { index: -1, .. })));
}
