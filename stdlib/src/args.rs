//! Typed access to routine arguments.
//!
//! A script may pass fewer arguments than a routine declares. The plain
//! getters fail on a missing argument; the `*_or_else` variants substitute a
//! default. A present argument of the wrong kind is always an error.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use nwscript_core::{ExecutionContext, OBJECT_SELF, Variable, Vector3};

fn arg(args: &[Variable], index: usize) -> Result<&Variable> {
    args.get(index)
        .ok_or_else(|| anyhow!("argument index out of range: {}/{}", index, args.len()))
}

pub fn get_int(args: &[Variable], index: usize) -> Result<i32> {
    Ok(arg(args, index)?.as_int()?)
}

pub fn get_float(args: &[Variable], index: usize) -> Result<f32> {
    Ok(arg(args, index)?.as_float()?)
}

pub fn get_string(args: &[Variable], index: usize) -> Result<&str> {
    Ok(arg(args, index)?.as_str()?)
}

pub fn get_vector(args: &[Variable], index: usize) -> Result<Vector3> {
    Ok(arg(args, index)?.as_vector()?)
}

/// Object argument with OBJECT_SELF resolved to the caller.
pub fn get_object(args: &[Variable], index: usize, ctx: &ExecutionContext) -> Result<u32> {
    let id = arg(args, index)?.as_object()?;
    Ok(if id == OBJECT_SELF { ctx.caller_id } else { id })
}

pub fn get_action(args: &[Variable], index: usize) -> Result<Arc<ExecutionContext>> {
    Ok(Arc::clone(arg(args, index)?.as_action()?))
}

pub fn get_int_or_else(args: &[Variable], index: usize, default: i32) -> Result<i32> {
    match args.get(index) {
        Some(value) => Ok(value.as_int()?),
        None => Ok(default),
    }
}

pub fn get_float_or_else(args: &[Variable], index: usize, default: f32) -> Result<f32> {
    match args.get(index) {
        Some(value) => Ok(value.as_float()?),
        None => Ok(default),
    }
}

pub fn get_string_or_else<'a>(args: &'a [Variable], index: usize, default: &'a str) -> Result<&'a str> {
    match args.get(index) {
        Some(value) => Ok(value.as_str()?),
        None => Ok(default),
    }
}

pub fn get_vector_or_else(args: &[Variable], index: usize, default: Vector3) -> Result<Vector3> {
    match args.get(index) {
        Some(value) => Ok(value.as_vector()?),
        None => Ok(default),
    }
}

/// Object argument, or the caller when the script left it out.
pub fn get_object_or_caller(args: &[Variable], index: usize, ctx: &ExecutionContext) -> Result<u32> {
    if index >= args.len() {
        return Ok(ctx.caller_id);
    }
    get_object(args, index, ctx)
}
