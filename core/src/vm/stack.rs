//! Operand stack.
//!
//! Slots are addressed by absolute index from the bottom. Opcodes express
//! positions as byte offsets relative to the top or to the frame boundary; the
//! conversion to an index happens in [`OperandStack::resolve`] and every access
//! is bounds-checked so a bad offset faults instead of panicking.

use crate::val::{Variable, VariableKind, Vector3};

use super::error::VmError;

#[derive(Debug, Clone, Default)]
pub struct OperandStack {
    items: Vec<Variable>,
}

impl OperandStack {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Variable] {
        &self.items
    }

    pub fn push(&mut self, value: Variable) {
        self.items.push(value);
    }

    pub fn extend_from_slice(&mut self, values: &[Variable]) {
        self.items.extend_from_slice(values);
    }

    pub fn pop(&mut self) -> Result<Variable, VmError> {
        self.items.pop().ok_or(VmError::StackUnderflow)
    }

    pub fn top(&self) -> Option<&Variable> {
        self.items.last()
    }

    pub fn top_mut(&mut self) -> Result<&mut Variable, VmError> {
        self.items.last_mut().ok_or(VmError::StackUnderflow)
    }

    pub fn pop_int(&mut self) -> Result<i32, VmError> {
        self.pop()?.as_int()
    }

    pub fn pop_float(&mut self) -> Result<f32, VmError> {
        self.pop()?.as_float()
    }

    pub fn pop_string(&mut self) -> Result<String, VmError> {
        match self.pop()? {
            Variable::String(value) => Ok(value),
            other => Err(VmError::TypeMismatch {
                expected: VariableKind::String,
                actual: other.kind(),
            }),
        }
    }

    pub fn pop_object(&mut self) -> Result<u32, VmError> {
        self.pop()?.as_object()
    }

    /// Pop a slot that must hold `kind`.
    pub fn pop_kind(&mut self, kind: VariableKind) -> Result<Variable, VmError> {
        let value = self.pop()?;
        if value.kind() != kind {
            return Err(VmError::TypeMismatch {
                expected: kind,
                actual: value.kind(),
            });
        }
        Ok(value)
    }

    /// Pop three floats as a vector, z first.
    pub fn pop_vector(&mut self) -> Result<Vector3, VmError> {
        let z = self.pop_float()?;
        let y = self.pop_float()?;
        let x = self.pop_float()?;
        Ok(Vector3::new(x, y, z))
    }

    /// Push a vector as three floats so that [`pop_vector`](Self::pop_vector) reads it back.
    pub fn push_vector(&mut self, value: Vector3) {
        self.items.push(Variable::Float(value.x));
        self.items.push(Variable::Float(value.y));
        self.items.push(Variable::Float(value.z));
    }

    /// Pop `count` slots; the result is ordered top first.
    pub fn pop_many(&mut self, count: usize) -> Result<Vec<Variable>, VmError> {
        if count > self.items.len() {
            return Err(VmError::StackUnderflow);
        }
        let mut popped = self.items.split_off(self.items.len() - count);
        popped.reverse();
        Ok(popped)
    }

    /// Drop `count` slots from the top.
    pub fn drop_top(&mut self, count: usize) -> Result<(), VmError> {
        if count > self.items.len() {
            return Err(VmError::StackUnderflow);
        }
        self.items.truncate(self.items.len() - count);
        Ok(())
    }

    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    /// Absolute index of `base + byte_offset / 4`.
    pub fn resolve(base: usize, byte_offset: i32) -> i64 {
        base as i64 + i64::from(byte_offset / 4)
    }

    fn checked(&self, index: i64) -> Result<usize, VmError> {
        if index < 0 || index as usize >= self.items.len() {
            return Err(VmError::StackIndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(index as usize)
    }

    /// Check that `[start, start + count)` lies inside the stack.
    fn checked_range(&self, start: i64, count: usize) -> Result<usize, VmError> {
        if count == 0 {
            return if start >= 0 && start as usize <= self.items.len() {
                Ok(start as usize)
            } else {
                Err(VmError::StackIndexOutOfRange {
                    index: start,
                    len: self.items.len(),
                })
            };
        }
        let first = self.checked(start)?;
        self.checked(start + count as i64 - 1)?;
        Ok(first)
    }

    pub fn get(&self, index: i64) -> Result<&Variable, VmError> {
        let idx = self.checked(index)?;
        Ok(&self.items[idx])
    }

    pub fn get_mut(&mut self, index: i64) -> Result<&mut Variable, VmError> {
        let idx = self.checked(index)?;
        Ok(&mut self.items[idx])
    }

    /// Clone `count` slots starting at `start`.
    pub fn window(&self, start: i64, count: usize) -> Result<Vec<Variable>, VmError> {
        let first = self.checked_range(start, count)?;
        Ok(self.items[first..first + count].to_vec())
    }

    /// Overwrite the slots starting at `start` with `values`.
    pub fn write_window(&mut self, start: i64, values: Vec<Variable>) -> Result<(), VmError> {
        let first = self.checked_range(start, values.len())?;
        for (slot, value) in self.items[first..].iter_mut().zip(values) {
            *slot = value;
        }
        Ok(())
    }
}
