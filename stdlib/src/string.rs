use std::sync::Arc;

use anyhow::Result;
use nwscript_core::VariableKind::{Float, Int, Object, String as Str, Vector, Void};
use nwscript_core::{ExecutionContext, RoutineTable, Variable};

use crate::args::{get_float, get_int, get_int_or_else, get_object, get_string, get_vector};
use crate::host::{Host, HostRef};

const DEFAULT_FLOAT_WIDTH: i32 = 18;
const DEFAULT_FLOAT_DECIMALS: i32 = 9;

/// Printing, conversion and substring routines.
pub struct StringRoutines;

impl StringRoutines {
    pub fn register(table: &mut RoutineTable, host: &Arc<Host>) {
        let h = HostRef::new(host);
        table.insert_native(1, "PrintString", Void, vec![Str], move |args, _| {
            h.get()?.print(get_string(args, 0)?.to_string());
            Ok(Variable::Void)
        });
        let h = HostRef::new(host);
        table.insert_native(2, "PrintFloat", Void, vec![Float, Int, Int], move |args, _| {
            h.get()?.print(format_float_args(args)?);
            Ok(Variable::Void)
        });
        table.insert_native(3, "FloatToString", Str, vec![Float, Int, Int], |args, _| {
            Ok(Variable::String(format_float_args(args)?))
        });
        let h = HostRef::new(host);
        table.insert_native(4, "PrintInteger", Void, vec![Int], move |args, _| {
            h.get()?.print(get_int(args, 0)?.to_string());
            Ok(Variable::Void)
        });
        let h = HostRef::new(host);
        table.insert_native(5, "PrintObject", Void, vec![Object], move |args, ctx| {
            h.get()?.print(format!("{:x}", get_object(args, 0, ctx)?));
            Ok(Variable::Void)
        });
        let h = HostRef::new(host);
        table.insert_native(141, "PrintVector", Void, vec![Vector, Int], move |args, _| {
            let vector = get_vector(args, 0)?;
            let line = if get_int_or_else(args, 1, 0)? != 0 {
                format!("PRINTVECTOR:{}", vector)
            } else {
                vector.to_string()
            };
            h.get()?.print(line);
            Ok(Variable::Void)
        });

        table.insert_native(59, "GetStringLength", Int, vec![Str], Self::get_string_length);
        table.insert_native(60, "GetStringUpperCase", Str, vec![Str], Self::get_string_upper_case);
        table.insert_native(61, "GetStringLowerCase", Str, vec![Str], Self::get_string_lower_case);
        table.insert_native(62, "GetStringRight", Str, vec![Str, Int], Self::get_string_right);
        table.insert_native(63, "GetStringLeft", Str, vec![Str, Int], Self::get_string_left);
        table.insert_native(64, "InsertString", Str, vec![Str, Str, Int], Self::insert_string);
        table.insert_native(65, "GetSubString", Str, vec![Str, Int, Int], Self::get_sub_string);
        table.insert_native(66, "FindSubString", Int, vec![Str, Str], Self::find_sub_string);
        table.insert_native(92, "IntToString", Str, vec![Int], Self::int_to_string);
        table.insert_native(230, "IntToFloat", Float, vec![Int], Self::int_to_float);
        table.insert_native(231, "FloatToInt", Int, vec![Float], Self::float_to_int);
        table.insert_native(232, "StringToInt", Int, vec![Str], Self::string_to_int);
        table.insert_native(233, "StringToFloat", Float, vec![Str], Self::string_to_float);
    }

    fn get_string_length(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::Int(get_string(args, 0)?.chars().count() as i32))
    }

    fn get_string_upper_case(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::String(get_string(args, 0)?.to_ascii_uppercase()))
    }

    fn get_string_lower_case(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::String(get_string(args, 0)?.to_ascii_lowercase()))
    }

    /// Last `count` characters; empty when the string is shorter or `count` is negative.
    fn get_string_right(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        let s = get_string(args, 0)?;
        let count = get_int(args, 1)?;
        let len = s.chars().count();
        let right = match usize::try_from(count) {
            Ok(count) if count <= len => s.chars().skip(len - count).collect(),
            _ => String::new(),
        };
        Ok(Variable::String(right))
    }

    /// First `count` characters; empty when the string is shorter or `count` is negative.
    fn get_string_left(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        let s = get_string(args, 0)?;
        let count = get_int(args, 1)?;
        let left = match usize::try_from(count) {
            Ok(count) if count <= s.chars().count() => s.chars().take(count).collect(),
            _ => String::new(),
        };
        Ok(Variable::String(left))
    }

    fn insert_string(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        let destination = get_string(args, 0)?;
        let inserted = get_string(args, 1)?;
        let position = get_int(args, 2)?;
        let len = destination.chars().count();
        let at = usize::try_from(position).map_or(0, |p| p.min(len));
        let mut out: String = destination.chars().take(at).collect();
        out.push_str(inserted);
        out.extend(destination.chars().skip(at));
        Ok(Variable::String(out))
    }

    fn get_sub_string(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        let s = get_string(args, 0)?;
        let start = get_int(args, 1)?;
        let count = get_int(args, 2)?;
        let sub = match (usize::try_from(start), usize::try_from(count)) {
            (Ok(start), Ok(count)) => s.chars().skip(start).take(count).collect(),
            _ => String::new(),
        };
        Ok(Variable::String(sub))
    }

    /// Character index of the first match, or -1.
    fn find_sub_string(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        let s = get_string(args, 0)?;
        let needle = get_string(args, 1)?;
        let index = s.find(needle).map_or(-1, |byte| s[..byte].chars().count() as i32);
        Ok(Variable::Int(index))
    }

    fn int_to_string(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::String(get_int(args, 0)?.to_string()))
    }

    fn int_to_float(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::Float(get_int(args, 0)? as f32))
    }

    /// Truncates toward zero; out-of-range values saturate.
    fn float_to_int(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::Int(get_float(args, 0)? as i32))
    }

    fn string_to_int(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::Int(parse_leading_int(get_string(args, 0)?)))
    }

    fn string_to_float(args: &[Variable], _ctx: &ExecutionContext) -> Result<Variable> {
        Ok(Variable::Float(parse_leading_float(get_string(args, 0)?)))
    }
}

fn format_float_args(args: &[Variable]) -> Result<String> {
    let value = get_float(args, 0)?;
    let width = get_int_or_else(args, 1, DEFAULT_FLOAT_WIDTH)?.clamp(0, DEFAULT_FLOAT_WIDTH) as usize;
    let decimals = get_int_or_else(args, 2, DEFAULT_FLOAT_DECIMALS)?.clamp(0, DEFAULT_FLOAT_DECIMALS) as usize;
    Ok(format!("{:>width$.decimals$}", value, width = width, decimals = decimals))
}

/// Integer prefix of `s` after leading whitespace; 0 when there is none.
pub(crate) fn parse_leading_int(s: &str) -> i32 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let limit = i64::from(i32::MAX) + 1;
    let mut value: i64 = 0;
    for digit in digits.bytes().take_while(u8::is_ascii_digit) {
        value = (value * 10 + i64::from(digit - b'0')).min(limit);
    }
    let value = if negative { -value } else { value };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Longest numeric prefix of `s` after leading whitespace; 0.0 when there is none.
pub(crate) fn parse_leading_float(s: &str) -> f32 {
    let s = s.trim_start();
    let candidate_len = s
        .bytes()
        .take_while(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
        .count();
    (1..=candidate_len)
        .rev()
        .find_map(|end| s[..end].parse::<f32>().ok())
        .unwrap_or(0.0)
}
