use crate::val::{Variable, VariableKind};
use crate::vm::bytecode::Op;
use crate::vm::context::OBJECT_SELF;
use crate::vm::error::VmError;
use crate::vm::program::Instruction;
use crate::vm::stack::OperandStack;

use super::VirtualMachine;

impl VirtualMachine {
    /// Execute one instruction. Control-flow ops only rewrite `next_offset`.
    pub(super) fn step(&mut self, ins: &Instruction) -> Result<(), VmError> {
        match &ins.op {
            Op::Nop | Op::Nop2 => Ok(()),

            Op::RsAddI => self.reserve(VariableKind::Int),
            Op::RsAddF => self.reserve(VariableKind::Float),
            Op::RsAddS => self.reserve(VariableKind::String),
            Op::RsAddO => self.reserve(VariableKind::Object),
            Op::RsAddEff => self.reserve(VariableKind::Effect),
            Op::RsAddEvt => self.reserve(VariableKind::Event),
            Op::RsAddLoc => self.reserve(VariableKind::Location),
            Op::RsAddTal => self.reserve(VariableKind::Talent),

            Op::CpDownSp { stack_offset, size } => self.copy_down(self.stack.len(), *stack_offset, *size),
            Op::CpTopSp { stack_offset, size } => self.copy_top(self.stack.len(), *stack_offset, *size),
            Op::CpDownBp { stack_offset, size } => self.copy_down(self.global_count, *stack_offset, *size),
            Op::CpTopBp { stack_offset, size } => self.copy_top(self.global_count, *stack_offset, *size),

            Op::ConstI(value) => {
                self.stack.push(Variable::Int(*value));
                Ok(())
            }
            Op::ConstF(value) => {
                self.stack.push(Variable::Float(*value));
                Ok(())
            }
            Op::ConstS(value) => {
                self.stack.push(Variable::String(value.clone()));
                Ok(())
            }
            Op::ConstO(id) => {
                let id = if *id == OBJECT_SELF { self.context.caller_id } else { *id };
                self.stack.push(Variable::Object(id));
                Ok(())
            }

            Op::Action { routine, arg_count } => self.call_routine(ins.offset, *routine, *arg_count),

            Op::LogAndII => self.int_binop(|l, r| Ok(((l != 0) && (r != 0)) as i32)),
            Op::LogOrII => self.int_binop(|l, r| Ok(((l != 0) || (r != 0)) as i32)),
            Op::IncOrII => self.int_binop(|l, r| Ok(l | r)),
            Op::ExcOrII => self.int_binop(|l, r| Ok(l ^ r)),
            Op::BoolAndII => self.int_binop(|l, r| Ok(l & r)),

            Op::EqualII => self.int_binop(|l, r| Ok((l == r) as i32)),
            Op::EqualFF => self.float_compare(|l, r| super::math::floats_equal(l, r)),
            Op::EqualSS => self.string_compare(|l, r| l == r),
            Op::EqualOO => self.object_compare(|l, r| l == r),
            Op::EqualTT { size } => self.struct_compare(*size, false),
            Op::EqualEffEff => self.engine_compare(VariableKind::Effect, false),
            Op::EqualEvtEvt => self.engine_compare(VariableKind::Event, false),
            Op::EqualLocLoc => self.engine_compare(VariableKind::Location, false),
            Op::EqualTalTal => self.engine_compare(VariableKind::Talent, false),

            Op::NEqualII => self.int_binop(|l, r| Ok((l != r) as i32)),
            Op::NEqualFF => self.float_compare(|l, r| !super::math::floats_equal(l, r)),
            Op::NEqualSS => self.string_compare(|l, r| l != r),
            Op::NEqualOO => self.object_compare(|l, r| l != r),
            Op::NEqualTT { size } => self.struct_compare(*size, true),
            Op::NEqualEffEff => self.engine_compare(VariableKind::Effect, true),
            Op::NEqualEvtEvt => self.engine_compare(VariableKind::Event, true),
            Op::NEqualLocLoc => self.engine_compare(VariableKind::Location, true),
            Op::NEqualTalTal => self.engine_compare(VariableKind::Talent, true),

            Op::GeqII => self.int_binop(|l, r| Ok((l >= r) as i32)),
            Op::GeqFF => self.float_compare(|l, r| l >= r),
            Op::GtII => self.int_binop(|l, r| Ok((l > r) as i32)),
            Op::GtFF => self.float_compare(|l, r| l > r),
            Op::LtII => self.int_binop(|l, r| Ok((l < r) as i32)),
            Op::LtFF => self.float_compare(|l, r| l < r),
            Op::LeqII => self.int_binop(|l, r| Ok((l <= r) as i32)),
            Op::LeqFF => self.float_compare(|l, r| l <= r),

            Op::ShLeftII => self.int_binop(|l, r| Ok(l.wrapping_shl(r as u32))),
            Op::ShRightII => self.int_binop(|l, r| Ok(super::math::shift_right(l, r))),
            Op::UShRightII => self.int_binop(|l, r| Ok((l as u32).wrapping_shr(r as u32) as i32)),

            Op::AddII => self.int_binop(|l, r| Ok(l.wrapping_add(r))),
            Op::AddIF => self.int_float_binop(|l, r| l + r),
            Op::AddFI => self.float_int_binop(|l, r| l + r),
            Op::AddFF => self.float_binop(|l, r| l + r),
            Op::AddSS => self.concat_strings(),
            Op::AddVV => self.vector_binop(|l, r| l + r),

            Op::SubII => self.int_binop(|l, r| Ok(l.wrapping_sub(r))),
            Op::SubIF => self.int_float_binop(|l, r| l - r),
            Op::SubFI => self.float_int_binop(|l, r| l - r),
            Op::SubFF => self.float_binop(|l, r| l - r),
            Op::SubVV => self.vector_binop(|l, r| l - r),

            Op::MulII => self.int_binop(|l, r| Ok(l.wrapping_mul(r))),
            Op::MulIF => self.int_float_binop(|l, r| l * r),
            Op::MulFI => self.float_int_binop(|l, r| l * r),
            Op::MulFF => self.float_binop(|l, r| l * r),
            Op::MulVF => self.vector_float_binop(|l, r| l * r),
            Op::MulFV => self.float_vector_binop(|l, r| r * l),

            Op::DivII => self.int_binop(|l, r| if r == 0 { Err(VmError::DivisionByZero) } else { Ok(l.wrapping_div(r)) }),
            Op::DivIF => self.int_float_binop(|l, r| l / super::math::divisor(r)),
            Op::DivFI => self.float_int_binop(|l, r| l / super::math::divisor(r)),
            Op::DivFF => self.float_binop(|l, r| l / super::math::divisor(r)),
            Op::DivVF => self.vector_float_binop(|l, r| l / super::math::divisor(r)),
            Op::DivFV => self.float_vector_binop(super::math::divide_by_vector),
            Op::ModII => self.int_binop(|l, r| if r == 0 { Err(VmError::DivisionByZero) } else { Ok(l.wrapping_rem(r)) }),

            Op::NegI => {
                let value = self.stack.top_mut()?.as_int_mut()?;
                *value = value.wrapping_neg();
                Ok(())
            }
            Op::NegF => {
                let value = self.stack.top_mut()?.as_float_mut()?;
                *value = -*value;
                Ok(())
            }
            Op::CompI => {
                let value = self.stack.pop_int()?;
                self.stack.push(Variable::Int(!value));
                Ok(())
            }
            Op::NotI => {
                let value = self.stack.pop_int()?;
                self.stack.push(Variable::Int((value == 0) as i32));
                Ok(())
            }

            Op::MovSp { stack_offset } => {
                let count = -(*stack_offset / 4);
                if count > 0 {
                    self.stack.drop_top(count as usize)?;
                }
                Ok(())
            }

            Op::Jmp { jump_offset } => self.jump(ins.offset, *jump_offset),
            Op::Jsr { jump_offset } => {
                self.return_offsets.push(ins.next_offset);
                self.jump(ins.offset, *jump_offset)
            }
            Op::Jz { jump_offset } => {
                if self.stack.pop_int()? == 0 {
                    self.jump(ins.offset, *jump_offset)?;
                }
                Ok(())
            }
            Op::Jnz { jump_offset } => {
                if self.stack.pop_int()? != 0 {
                    self.jump(ins.offset, *jump_offset)?;
                }
                Ok(())
            }
            Op::Retn => {
                self.next_offset = match self.return_offsets.pop() {
                    Some(offset) => offset,
                    None => self.program.length(),
                };
                Ok(())
            }

            Op::Destruct {
                size,
                stack_offset,
                size_no_destroy,
            } => self.destruct(*size, *stack_offset, *size_no_destroy),

            Op::DecISp { stack_offset } => self.adjust_int(self.stack.len(), *stack_offset, -1),
            Op::IncISp { stack_offset } => self.adjust_int(self.stack.len(), *stack_offset, 1),
            Op::DecIBp { stack_offset } => self.adjust_int(self.global_count, *stack_offset, -1),
            Op::IncIBp { stack_offset } => self.adjust_int(self.global_count, *stack_offset, 1),

            Op::SaveBp => {
                self.global_count = self.stack.len();
                self.stack.push(Variable::Int(self.global_count as i32));
                Ok(())
            }
            Op::RestoreBp => {
                let value = self.stack.pop_int()?;
                if value < 0 {
                    return Err(VmError::StackIndexOutOfRange {
                        index: i64::from(value),
                        len: self.stack.len(),
                    });
                }
                self.global_count = value as usize;
                Ok(())
            }

            Op::StoreState { size, size_locals } => self.store_state(ins.offset, *size, *size_locals),

            Op::Unknown { code } => Err(VmError::UnknownOpcode { code: *code }),
        }
    }

    fn reserve(&mut self, kind: VariableKind) -> Result<(), VmError> {
        self.stack.push(Variable::default_of(kind));
        Ok(())
    }

    // Overwrite the slots at `base + stack_offset / 4` with the top `size / 4` slots.
    fn copy_down(&mut self, base: usize, stack_offset: i32, size: u16) -> Result<(), VmError> {
        let count = usize::from(size / 4);
        let src = self.stack.len() as i64 - count as i64;
        let dst = OperandStack::resolve(base, stack_offset);
        let values = self.stack.window(src, count)?;
        self.stack.write_window(dst, values)
    }

    // Push copies of `size / 4` slots starting at `base + stack_offset / 4`.
    fn copy_top(&mut self, base: usize, stack_offset: i32, size: u16) -> Result<(), VmError> {
        let count = usize::from(size / 4);
        let src = OperandStack::resolve(base, stack_offset);
        let values = self.stack.window(src, count)?;
        self.stack.extend_from_slice(&values);
        Ok(())
    }

    fn adjust_int(&mut self, base: usize, stack_offset: i32, delta: i32) -> Result<(), VmError> {
        let idx = OperandStack::resolve(base, stack_offset);
        let value = self.stack.get_mut(idx)?.as_int_mut()?;
        *value = value.wrapping_add(delta);
        Ok(())
    }

    // Collapse the top `size / 4` slots to the window starting `stack_offset / 4`
    // slots into the block.
    fn destruct(&mut self, size: u16, stack_offset: i16, size_no_destroy: u16) -> Result<(), VmError> {
        let start = self.stack.len() as i64 - i64::from(size / 4);
        if start < 0 {
            return Err(VmError::StackUnderflow);
        }
        let keep_from = start + i64::from(stack_offset / 4);
        let kept = self.stack.window(keep_from, usize::from(size_no_destroy / 4))?;
        self.stack.truncate(start as usize);
        self.stack.extend_from_slice(&kept);
        Ok(())
    }

    fn struct_compare(&mut self, size: u16, negate: bool) -> Result<(), VmError> {
        let count = usize::from(size / 4);
        let left = self.stack.pop_many(count)?;
        let right = self.stack.pop_many(count)?;
        let equal = left == right;
        self.stack.push(Variable::Int((equal != negate) as i32));
        Ok(())
    }
}
