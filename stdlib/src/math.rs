use anyhow::Result;
use nwscript_core::VariableKind::{Float, Int, Vector as Vec3};
use nwscript_core::{ExecutionContext, RoutineTable, Variable, Vector3};

use crate::args::{get_float, get_float_or_else, get_int, get_vector};

const SECONDS_PER_ROUND: f32 = 6.0;
const SECONDS_PER_TURN: f32 = 60.0;
const SECONDS_PER_HOUR: f32 = 3600.0;

pub struct MathRoutines;

impl MathRoutines {
    pub fn register(table: &mut RoutineTable) {
        table.insert_native(67, "fabs", Float, vec![Float], Self::fabs);
        table.insert_native(68, "cos", Float, vec![Float], Self::cos);
        table.insert_native(69, "sin", Float, vec![Float], Self::sin);
        table.insert_native(70, "tan", Float, vec![Float], Self::tan);
        table.insert_native(75, "pow", Float, vec![Float, Float], Self::pow);
        table.insert_native(76, "sqrt", Float, vec![Float], Self::sqrt);
        table.insert_native(77, "abs", Int, vec![Int], Self::abs);
        table.insert_native(104, "VectorMagnitude", Float, vec![Vec3], Self::vector_magnitude);
        table.insert_native(121, "RoundsToSeconds", Float, vec![Int], Self::rounds_to_seconds);
        table.insert_native(122, "HoursToSeconds", Float, vec![Int], Self::hours_to_seconds);
        table.insert_native(123, "TurnsToSeconds", Float, vec![Int], Self::turns_to_seconds);
        table.insert_native(137, "VectorNormalize", Vec3, vec![Vec3], Self::vector_normalize);
        table.insert_native(142, "Vector", Vec3, vec![Float, Float, Float], Self::vector);
    }

    fn fabs(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::Float(get_float(args, 0)?.abs()))
    }

    fn cos(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::Float(get_float(args, 0)?.cos()))
    }

    fn sin(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::Float(get_float(args, 0)?.sin()))
    }

    fn tan(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::Float(get_float(args, 0)?.tan()))
    }

    fn pow(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        let value = get_float(args, 0)?;
        let exponent = get_float(args, 1)?;
        Ok(Variable::Float(value.powf(exponent)))
    }

    // negative input yields 0.0 rather than NaN
    fn sqrt(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        let value = get_float(args, 0)?;
        Ok(Variable::Float(if value < 0.0 { 0.0 } else { value.sqrt() }))
    }

    fn abs(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::Int(get_int(args, 0)?.wrapping_abs()))
    }

    fn vector_magnitude(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::Float(get_vector(args, 0)?.magnitude()))
    }

    fn vector_normalize(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::Vector(get_vector(args, 0)?.normalize()))
    }

    fn vector(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        let x = get_float_or_else(args, 0, 0.0)?;
        let y = get_float_or_else(args, 1, 0.0)?;
        let z = get_float_or_else(args, 2, 0.0)?;
        Ok(Variable::Vector(Vector3::new(x, y, z)))
    }

    fn rounds_to_seconds(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::Float(get_int(args, 0)? as f32 * SECONDS_PER_ROUND))
    }

    fn hours_to_seconds(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::Float(get_int(args, 0)? as f32 * SECONDS_PER_HOUR))
    }

    fn turns_to_seconds(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::Float(get_int(args, 0)? as f32 * SECONDS_PER_TURN))
    }
}
