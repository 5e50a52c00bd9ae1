use super::bytecode::Op;
use super::program::Instruction;
use super::routine::Routines;

/// One-line listing of an instruction: `%08x MNEMONIC operands`.
///
/// ACTION operands show the routine name when a table is given and knows the index.
pub fn describe_instruction(ins: &Instruction, routines: Option<&dyn Routines>) -> String {
    let mut desc = format!("{:08x} {}", ins.offset, ins.op.mnemonic());
    match &ins.op {
        Op::CpDownSp { stack_offset, size }
        | Op::CpTopSp { stack_offset, size }
        | Op::CpDownBp { stack_offset, size }
        | Op::CpTopBp { stack_offset, size } => {
            desc.push_str(&format!(" {}, {}", stack_offset, size));
        }
        Op::ConstI(value) => desc.push_str(&format!(" {}", value)),
        Op::ConstF(value) => desc.push_str(&format!(" {:.6}", value)),
        Op::ConstS(value) => desc.push_str(&format!(" \"{}\"", value)),
        Op::ConstO(id) => desc.push_str(&format!(" {}", id)),
        Op::Action { routine, arg_count } => {
            let name = routines
                .and_then(|table| table.get(*routine))
                .map(|r| r.name().to_string())
                .unwrap_or_else(|| "?".to_string());
            desc.push_str(&format!(" {}({}), {}", name, routine, arg_count));
        }
        Op::EqualTT { size } | Op::NEqualTT { size } => desc.push_str(&format!(" {}", size)),
        Op::MovSp { stack_offset }
        | Op::DecISp { stack_offset }
        | Op::IncISp { stack_offset }
        | Op::DecIBp { stack_offset }
        | Op::IncIBp { stack_offset } => desc.push_str(&format!(" {}", stack_offset)),
        Op::Jmp { jump_offset } | Op::Jsr { jump_offset } | Op::Jz { jump_offset } | Op::Jnz { jump_offset } => {
            let target = i64::from(ins.offset) + i64::from(*jump_offset);
            desc.push_str(&format!(" {:08x}({})", target, jump_offset));
        }
        Op::Destruct {
            size,
            stack_offset,
            size_no_destroy,
        } => desc.push_str(&format!(" {}, {}, {}", size, stack_offset, size_no_destroy)),
        Op::StoreState { size, size_locals } => desc.push_str(&format!(" {}, {}", size, size_locals)),
        Op::Unknown { code } => desc.push_str(&format!(" 0x{:04x}", code)),
        _ => {}
    }
    desc
}
