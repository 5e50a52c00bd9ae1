use std::sync::Arc;

use tracing::debug;

use crate::val::{Variable, VariableKind};
use crate::vm::context::{ExecutionContext, ExecutionState};
use crate::vm::error::VmError;

use super::VirtualMachine;

/// Distance from a STORE_STATE to the instruction its continuation resumes at.
const STORE_STATE_RESUME_SKIP: u32 = 0x10;

impl VirtualMachine {
    pub(super) fn call_routine(&mut self, offset: u32, index: u16, arg_count: u8) -> Result<(), VmError> {
        let routines = self.context.routines.clone().ok_or(VmError::RoutineNotFound(index))?;
        let routine = routines.get(index).ok_or(VmError::RoutineNotFound(index))?;

        let requested = usize::from(arg_count);
        let declared = routine.argument_count();
        if requested > declared {
            return Err(VmError::RoutineArityExceeded {
                routine: routine.name().to_string(),
                declared,
                requested,
            });
        }

        let mut args = Vec::with_capacity(requested);
        for i in 0..requested {
            let kind = routine
                .argument_types()
                .get(i)
                .copied()
                .ok_or_else(|| VmError::RoutineArityExceeded {
                    routine: routine.name().to_string(),
                    declared: routine.argument_types().len(),
                    requested,
                })?;
            let arg = match kind {
                VariableKind::Vector => Variable::Vector(self.stack.pop_vector()?),
                VariableKind::Action => Variable::Action(Arc::new(self.continuation_context())),
                other => self.stack.pop_kind(other)?,
            };
            args.push(arg);
        }

        let ret = routine
            .invoke(&args, &self.context)
            .map_err(|err| VmError::routine(routine.name(), err))?;

        debug!(
            target: "nwscript::vm::action",
            offset = format_args!("{:04x}", offset),
            routine = routine.name(),
            args = %join_args(&args),
            result = %ret,
            "action"
        );

        match routine.return_type() {
            VariableKind::Void => {}
            VariableKind::Vector => {
                let value = ret.as_vector()?;
                self.stack.push(Variable::Float(value.z));
                self.stack.push(Variable::Float(value.y));
                self.stack.push(Variable::Float(value.x));
            }
            expected => {
                if ret.kind() != expected {
                    return Err(VmError::TypeMismatch {
                        expected,
                        actual: ret.kind(),
                    });
                }
                self.stack.push(ret);
            }
        }
        Ok(())
    }

    // Copy of the current context bound to the latest snapshot.
    fn continuation_context(&self) -> ExecutionContext {
        ExecutionContext {
            saved_state: self.saved_state.clone(),
            ..self.context.clone()
        }
    }

    pub(super) fn store_state(&mut self, offset: u32, size: u32, size_locals: u32) -> Result<(), VmError> {
        let global_slots = (size / 4) as usize;
        let globals = self
            .stack
            .window(self.global_count as i64 - global_slots as i64, global_slots)?;

        let local_slots = (size_locals / 4) as usize;
        let locals = self
            .stack
            .window(self.stack.len() as i64 - local_slots as i64, local_slots)?;

        self.saved_state = Some(Arc::new(ExecutionState {
            globals,
            locals,
            program: Arc::clone(&self.program),
            ins_offset: offset + STORE_STATE_RESUME_SKIP,
        }));
        Ok(())
    }
}

fn join_args(args: &[Variable]) -> String {
    args.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ")
}
