use super::*;

#[test]
fn test_vm_degenerate_program_returns_minus_one() {
    let (vm, outcome) = run_ops(vec![]);
    assert_eq!(outcome.result, -1);
    assert_eq!(outcome.halt, HaltKind::Normal);
    assert_eq!(vm.state(), VmState::HaltedNormal);
}

#[test]
fn test_vm_int_plus_float() {
    let (vm, outcome) = run_ops(vec![Op::ConstI(1), Op::ConstF(2.0), Op::AddIF]);
    assert_eq!(outcome.result, -1);
    assert_eq!(vm.stack_size(), 1);
    assert_eq!(vm.stack_variable(0), Some(&Variable::Float(3.0)));
}

#[test]
fn test_vm_boolean_logic() {
    let (vm, outcome) = run_ops(vec![
        Op::ConstI(0),
        Op::ConstI(0),
        Op::LogAndII,
        Op::ConstI(0),
        Op::ConstI(1),
        Op::LogAndII,
        Op::ConstI(1),
        Op::ConstI(1),
        Op::LogAndII,
        Op::ConstI(0),
        Op::ConstI(0),
        Op::LogOrII,
        Op::ConstI(0),
        Op::ConstI(1),
        Op::LogOrII,
        Op::ConstI(1),
        Op::ConstI(1),
        Op::LogOrII,
    ]);
    assert_eq!(outcome.result, 1);
    assert_eq!(ints(&vm), vec![0, 0, 1, 0, 1, 1]);
}

#[test]
fn test_vm_bitwise_ops() {
    let (vm, _) = run_ops(vec![
        Op::ConstI(0b1100),
        Op::ConstI(0b1010),
        Op::IncOrII,
        Op::ConstI(0b1100),
        Op::ConstI(0b1010),
        Op::ExcOrII,
        Op::ConstI(0b1100),
        Op::ConstI(0b1010),
        Op::BoolAndII,
        Op::ConstI(5),
        Op::CompI,
        Op::ConstI(0),
        Op::NotI,
        Op::ConstI(3),
        Op::NotI,
    ]);
    assert_eq!(ints(&vm), vec![0b1110, 0b0110, 0b1000, -6, 1, 0]);
}

#[test]
fn test_vm_math() {
    let (vm, outcome) = run_ops(vec![
        Op::ConstI(-7),
        Op::NegI,
        Op::ConstI(1),
        Op::ShRightII,
        Op::ConstI(1),
        Op::ConstI(1),
        Op::ShLeftII,
        Op::ModII,
        Op::ConstF(2.0),
        Op::AddIF,
        Op::ConstI(3),
        Op::AddFI,
        Op::ConstF(4.0),
        Op::AddFF,
        Op::ConstI(5),
        Op::ConstI(6),
        Op::SubII,
        Op::SubFI,
        Op::ConstF(7.0),
        Op::SubFF,
        Op::ConstI(8),
        Op::ConstI(9),
        Op::MulII,
        Op::ConstF(0.1),
        Op::MulIF,
        Op::MulFF,
        Op::ConstI(4),
        Op::ConstI(2),
        Op::DivII,
        Op::ConstF(1.0),
        Op::DivIF,
        Op::DivFF,
        Op::NegF,
    ]);
    assert_eq!(outcome.result, -1);
    assert_eq!(outcome.halt, HaltKind::Normal);
    assert_eq!(vm.stack_size(), 1);
    assert_float(vm.stack_variable(0), -14.4);
}

#[test]
fn test_vm_comparisons() {
    let (_, outcome) = run_ops(vec![
        Op::ConstI(2),
        Op::ConstI(2),
        Op::ConstI(3),
        Op::ConstI(2),
        Op::CpTopSp { stack_offset: -16, size: 8 },
        Op::GeqII,
        Op::CpTopSp { stack_offset: -12, size: 8 },
        Op::GtII,
        Op::CpTopSp { stack_offset: -20, size: 8 },
        Op::LtII,
        Op::CpTopSp { stack_offset: -28, size: 8 },
        Op::LeqII,
        Op::CpDownSp { stack_offset: -32, size: 16 },
        Op::MovSp { stack_offset: -16 },
        Op::AddII,
        Op::AddII,
        Op::AddII,
        Op::ConstF(2.0),
        Op::ConstF(2.0),
        Op::ConstF(3.0),
        Op::ConstF(2.0),
        Op::CpTopSp { stack_offset: -16, size: 8 },
        Op::GeqFF,
        Op::CpTopSp { stack_offset: -12, size: 8 },
        Op::GtFF,
        Op::CpTopSp { stack_offset: -20, size: 8 },
        Op::LtFF,
        Op::CpTopSp { stack_offset: -28, size: 8 },
        Op::LeqFF,
        Op::CpDownSp { stack_offset: -32, size: 16 },
        Op::MovSp { stack_offset: -16 },
        Op::AddII,
        Op::AddII,
        Op::AddII,
        Op::AddII,
    ]);
    assert_eq!(outcome.result, 8);
}

#[test]
fn test_vm_float_equality_uses_tolerance() {
    let (vm, _) = run_ops(vec![
        Op::ConstF(1.0),
        Op::ConstF(1.000001),
        Op::EqualFF,
        Op::ConstF(1.0),
        Op::ConstF(1.1),
        Op::EqualFF,
        Op::ConstF(1.0),
        Op::ConstF(1.000001),
        Op::NEqualFF,
        Op::ConstF(1.0),
        Op::ConstF(1.1),
        Op::NEqualFF,
    ]);
    assert_eq!(ints(&vm), vec![1, 0, 0, 1]);
}

#[test]
fn test_vm_string_and_object_ops() {
    let (vm, _) = run_ops(vec![
        Op::ConstS("foo".into()),
        Op::ConstS("bar".into()),
        Op::AddSS,
        Op::ConstS("foobar".into()),
        Op::EqualSS,
        Op::ConstO(7),
        Op::ConstO(8),
        Op::NEqualOO,
        Op::ConstO(7),
        Op::ConstO(7),
        Op::EqualOO,
    ]);
    assert_eq!(ints(&vm), vec![1, 1, 1]);
}

#[test]
fn test_vm_shifts_follow_signed_rules() {
    let (vm, _) = run_ops(vec![
        Op::ConstI(-8),
        Op::ConstI(1),
        Op::ShRightII,
        Op::ConstI(-7),
        Op::ConstI(1),
        Op::ShRightII,
        Op::ConstI(-1),
        Op::ConstI(28),
        Op::UShRightII,
        Op::ConstI(1),
        Op::ConstI(4),
        Op::ShLeftII,
    ]);
    assert_eq!(ints(&vm), vec![-4, -3, 15, 16]);
}

#[test]
fn test_vm_shift_right_of_int_min_keeps_sign() {
    let (vm, _) = run_ops(vec![
        Op::ConstI(i32::MIN),
        Op::ConstI(1),
        Op::ShRightII,
        Op::ConstI(i32::MIN),
        Op::ConstI(0),
        Op::ShRightII,
        Op::ConstI(i32::MIN),
        Op::ConstI(31),
        Op::ShRightII,
    ]);
    assert_eq!(ints(&vm), vec![-1073741824, i32::MIN, -1]);
}

#[test]
fn test_vm_int_division_truncates_toward_zero() {
    let (vm, _) = run_ops(vec![
        Op::ConstI(-7),
        Op::ConstI(2),
        Op::DivII,
        Op::ConstI(-7),
        Op::ConstI(2),
        Op::ModII,
        Op::ConstI(i32::MAX),
        Op::ConstI(1),
        Op::AddII,
    ]);
    assert_eq!(ints(&vm), vec![-3, -1, i32::MIN]);
}

#[test]
fn test_vm_int_division_by_zero_faults() {
    for op in [Op::DivII, Op::ModII] {
        let (vm, outcome) = run_ops(vec![Op::ConstI(1), Op::ConstI(0), op]);
        assert_eq!(outcome.result, -1);
        assert_eq!(outcome.halt, HaltKind::Fault);
        assert!(matches!(outcome.fault, Some(VmError::DivisionByZero)));
        assert_eq!(vm.state(), VmState::HaltedFault);
    }
}

#[test]
fn test_vm_float_division_floors_divisor_magnitude() {
    let (vm, _) = run_ops(vec![
        Op::ConstF(1.0),
        Op::ConstF(0.0),
        Op::DivFF,
        Op::ConstF(1.0),
        Op::ConstF(-0.000001),
        Op::DivFF,
        Op::ConstF(1.0),
        Op::ConstF(-2.0),
        Op::DivFF,
        Op::ConstF(3.0),
        Op::ConstI(0),
        Op::DivFI,
    ]);
    assert_float(vm.stack_variable(0), 100_000.0);
    assert_float(vm.stack_variable(1), -100_000.0);
    assert_float(vm.stack_variable(2), -0.5);
    assert_float(vm.stack_variable(3), 300_000.0);
}

#[test]
fn test_vm_vector_math() {
    let (vm, outcome) = run_ops(vec![
        Op::ConstF(1.0),
        Op::ConstF(2.0),
        Op::ConstF(3.0),
        Op::ConstF(4.0),
        Op::ConstF(5.0),
        Op::ConstF(6.0),
        Op::AddVV,
        Op::AddFF,
        Op::AddFF,
        Op::ConstF(7.0),
        Op::ConstF(8.0),
        Op::ConstF(9.0),
        Op::ConstF(3.0),
        Op::ConstF(2.0),
        Op::ConstF(1.0),
        Op::SubVV,
        Op::AddFF,
        Op::AddFF,
        Op::AddFF,
        Op::ConstF(4.0),
        Op::ConstF(5.0),
        Op::ConstF(6.0),
        Op::MulFV,
        Op::ConstF(7.0),
        Op::MulVF,
        Op::AddFF,
        Op::AddFF,
        Op::ConstF(1.0),
        Op::ConstF(2.0),
        Op::ConstF(3.0),
        Op::DivFV,
        Op::ConstF(0.5),
        Op::DivVF,
        Op::AddFF,
        Op::AddFF,
    ]);
    assert_eq!(outcome.result, -1);
    assert_eq!(vm.stack_size(), 1);
    assert_float(vm.stack_variable(0), 15015.0);
}

#[test]
fn test_vm_vector_results_keep_component_order() {
    let (vm, _) = run_ops(vec![
        Op::ConstF(1.0),
        Op::ConstF(2.0),
        Op::ConstF(3.0),
        Op::ConstF(10.0),
        Op::ConstF(20.0),
        Op::ConstF(30.0),
        Op::SubVV,
        Op::ConstF(2.0),
        Op::MulVF,
    ]);
    assert_float(vm.stack_variable(0), -18.0);
    assert_float(vm.stack_variable(1), -36.0);
    assert_float(vm.stack_variable(2), -54.0);
}

#[test]
fn test_vm_operand_type_mismatch_faults() {
    let (_, outcome) = run_ops(vec![Op::ConstI(1), Op::ConstF(2.0), Op::AddII]);
    assert_eq!(outcome.halt, HaltKind::Fault);
    match outcome.fault {
        Some(VmError::TypeMismatch { expected, actual }) => {
            assert_eq!(expected, VariableKind::Int);
            assert_eq!(actual, VariableKind::Float);
        }
        other => panic!("unexpected fault: {:?}", other),
    }
}

#[test]
fn test_vm_binary_op_on_short_stack_underflows() {
    let (_, outcome) = run_ops(vec![Op::ConstI(1), Op::AddII]);
    assert!(matches!(outcome.fault, Some(VmError::StackUnderflow)));
}
