use crate::val::{Variable, VariableKind, Vector3};
use crate::vm::error::VmError;

use super::VirtualMachine;

pub(super) const FLOAT_TOLERANCE: f32 = 1e-5;

pub(super) fn floats_equal(l: f32, r: f32) -> bool {
    (l - r).abs() < FLOAT_TOLERANCE
}

/// Divisor with its magnitude floored at the tolerance, sign kept; zero counts as positive.
pub(super) fn divisor(value: f32) -> f32 {
    if value.abs() >= FLOAT_TOLERANCE || value.is_nan() {
        value
    } else if value.is_sign_negative() && value != 0.0 {
        -FLOAT_TOLERANCE
    } else {
        FLOAT_TOLERANCE
    }
}

pub(super) fn divide_by_vector(l: f32, r: Vector3) -> Vector3 {
    Vector3::new(l / divisor(r.x), l / divisor(r.y), l / divisor(r.z))
}

/// Arithmetic shift on the magnitude: negative values shift toward zero.
pub(super) fn shift_right(l: i32, r: i32) -> i32 {
    let shift = r as u32;
    if l < 0 {
        (l.unsigned_abs().wrapping_shr(shift) as i32).wrapping_neg()
    } else {
        l.wrapping_shr(shift)
    }
}

// Binary ops pop the right operand first, then the left.
impl VirtualMachine {
    pub(super) fn int_binop<F>(&mut self, op: F) -> Result<(), VmError>
    where
        F: FnOnce(i32, i32) -> Result<i32, VmError>,
    {
        let right = self.stack.pop_int()?;
        let left = self.stack.pop_int()?;
        self.stack.push(Variable::Int(op(left, right)?));
        Ok(())
    }

    pub(super) fn float_binop<F>(&mut self, op: F) -> Result<(), VmError>
    where
        F: FnOnce(f32, f32) -> f32,
    {
        let right = self.stack.pop_float()?;
        let left = self.stack.pop_float()?;
        self.stack.push(Variable::Float(op(left, right)));
        Ok(())
    }

    pub(super) fn int_float_binop<F>(&mut self, op: F) -> Result<(), VmError>
    where
        F: FnOnce(f32, f32) -> f32,
    {
        let right = self.stack.pop_float()?;
        let left = self.stack.pop_int()?;
        self.stack.push(Variable::Float(op(left as f32, right)));
        Ok(())
    }

    pub(super) fn float_int_binop<F>(&mut self, op: F) -> Result<(), VmError>
    where
        F: FnOnce(f32, f32) -> f32,
    {
        let right = self.stack.pop_int()?;
        let left = self.stack.pop_float()?;
        self.stack.push(Variable::Float(op(left, right as f32)));
        Ok(())
    }

    pub(super) fn float_compare<F>(&mut self, op: F) -> Result<(), VmError>
    where
        F: FnOnce(f32, f32) -> bool,
    {
        let right = self.stack.pop_float()?;
        let left = self.stack.pop_float()?;
        self.stack.push(Variable::Int(op(left, right) as i32));
        Ok(())
    }

    pub(super) fn string_compare<F>(&mut self, op: F) -> Result<(), VmError>
    where
        F: FnOnce(&str, &str) -> bool,
    {
        let right = self.stack.pop_string()?;
        let left = self.stack.pop_string()?;
        self.stack.push(Variable::Int(op(&left, &right) as i32));
        Ok(())
    }

    pub(super) fn object_compare<F>(&mut self, op: F) -> Result<(), VmError>
    where
        F: FnOnce(u32, u32) -> bool,
    {
        let right = self.stack.pop_object()?;
        let left = self.stack.pop_object()?;
        self.stack.push(Variable::Int(op(left, right) as i32));
        Ok(())
    }

    pub(super) fn engine_compare(&mut self, kind: VariableKind, negate: bool) -> Result<(), VmError> {
        let right = self.stack.pop_kind(kind)?;
        let left = self.stack.pop_kind(kind)?;
        self.stack.push(Variable::Int(((left == right) != negate) as i32));
        Ok(())
    }

    pub(super) fn concat_strings(&mut self) -> Result<(), VmError> {
        let right = self.stack.pop_string()?;
        let mut left = self.stack.pop_string()?;
        left.push_str(&right);
        self.stack.push(Variable::String(left));
        Ok(())
    }

    pub(super) fn vector_binop<F>(&mut self, op: F) -> Result<(), VmError>
    where
        F: FnOnce(Vector3, Vector3) -> Vector3,
    {
        let right = self.stack.pop_vector()?;
        let left = self.stack.pop_vector()?;
        self.stack.push_vector(op(left, right));
        Ok(())
    }

    pub(super) fn vector_float_binop<F>(&mut self, op: F) -> Result<(), VmError>
    where
        F: FnOnce(Vector3, f32) -> Vector3,
    {
        let right = self.stack.pop_float()?;
        let left = self.stack.pop_vector()?;
        self.stack.push_vector(op(left, right));
        Ok(())
    }

    pub(super) fn float_vector_binop<F>(&mut self, op: F) -> Result<(), VmError>
    where
        F: FnOnce(f32, Vector3) -> Vector3,
    {
        let right = self.stack.pop_vector()?;
        let left = self.stack.pop_float()?;
        self.stack.push_vector(op(left, right));
        Ok(())
    }
}
