use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Offset of the first instruction in a compiled program, right after the NCS header.
pub const START_OFFSET: u32 = 13;

// Opcode byte of each instruction family.
mod byte_code {
    pub const NOP: u16 = 0x00;
    pub const CPDOWNSP: u16 = 0x01;
    pub const RSADD: u16 = 0x02;
    pub const CPTOPSP: u16 = 0x03;
    pub const CONST: u16 = 0x04;
    pub const ACTION: u16 = 0x05;
    pub const LOGAND: u16 = 0x06;
    pub const LOGOR: u16 = 0x07;
    pub const INCOR: u16 = 0x08;
    pub const EXCOR: u16 = 0x09;
    pub const BOOLAND: u16 = 0x0a;
    pub const EQUAL: u16 = 0x0b;
    pub const NEQUAL: u16 = 0x0c;
    pub const GEQ: u16 = 0x0d;
    pub const GT: u16 = 0x0e;
    pub const LT: u16 = 0x0f;
    pub const LEQ: u16 = 0x10;
    pub const SHLEFT: u16 = 0x11;
    pub const SHRIGHT: u16 = 0x12;
    pub const USHRIGHT: u16 = 0x13;
    pub const ADD: u16 = 0x14;
    pub const SUB: u16 = 0x15;
    pub const MUL: u16 = 0x16;
    pub const DIV: u16 = 0x17;
    pub const MOD: u16 = 0x18;
    pub const NEG: u16 = 0x19;
    pub const COMP: u16 = 0x1a;
    pub const MOVSP: u16 = 0x1b;
    pub const JMP: u16 = 0x1d;
    pub const JSR: u16 = 0x1e;
    pub const JZ: u16 = 0x1f;
    pub const RETN: u16 = 0x20;
    pub const DESTRUCT: u16 = 0x21;
    pub const NOT: u16 = 0x22;
    pub const DECSP: u16 = 0x23;
    pub const INCSP: u16 = 0x24;
    pub const JNZ: u16 = 0x25;
    pub const CPDOWNBP: u16 = 0x26;
    pub const CPTOPBP: u16 = 0x27;
    pub const DECBP: u16 = 0x28;
    pub const INCBP: u16 = 0x29;
    pub const SAVEBP: u16 = 0x2a;
    pub const RESTOREBP: u16 = 0x2b;
    pub const STORE_STATE: u16 = 0x2c;
    pub const NOP2: u16 = 0x2d;
}

// Operand type qualifier carried in the second byte.
mod qualifier {
    pub const INT: u16 = 0x03;
    pub const FLOAT: u16 = 0x04;
    pub const STRING: u16 = 0x05;
    pub const OBJECT: u16 = 0x06;
    pub const EFFECT: u16 = 0x10;
    pub const EVENT: u16 = 0x11;
    pub const LOCATION: u16 = 0x12;
    pub const TALENT: u16 = 0x13;
    pub const II: u16 = 0x20;
    pub const FF: u16 = 0x21;
    pub const OO: u16 = 0x22;
    pub const SS: u16 = 0x23;
    pub const TT: u16 = 0x24;
    pub const IF: u16 = 0x25;
    pub const FI: u16 = 0x26;
    pub const EFF_EFF: u16 = 0x30;
    pub const EVT_EVT: u16 = 0x31;
    pub const LOC_LOC: u16 = 0x32;
    pub const TAL_TAL: u16 = 0x33;
    pub const VV: u16 = 0x3a;
    pub const VF: u16 = 0x3b;
    pub const FV: u16 = 0x3c;
}

const fn pack(byte_code: u16, qualifier: u16) -> u16 {
    byte_code | (qualifier << 8)
}

/// A decoded NWScript instruction with its operands.
///
/// Offsets are in bytes. Stack offsets and sizes are multiples of 4 (one slot
/// per 4 bytes); jump offsets are relative to the instruction's own offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    Nop,
    CpDownSp { stack_offset: i32, size: u16 },
    RsAddI,
    RsAddF,
    RsAddS,
    RsAddO,
    RsAddEff,
    RsAddEvt,
    RsAddLoc,
    RsAddTal,
    CpTopSp { stack_offset: i32, size: u16 },
    ConstI(i32),
    ConstF(f32),
    ConstS(String),
    ConstO(u32),
    Action { routine: u16, arg_count: u8 },
    LogAndII,
    LogOrII,
    IncOrII,
    ExcOrII,
    BoolAndII,
    EqualII,
    EqualFF,
    EqualSS,
    EqualOO,
    EqualTT { size: u16 },
    EqualEffEff,
    EqualEvtEvt,
    EqualLocLoc,
    EqualTalTal,
    NEqualII,
    NEqualFF,
    NEqualSS,
    NEqualOO,
    NEqualTT { size: u16 },
    NEqualEffEff,
    NEqualEvtEvt,
    NEqualLocLoc,
    NEqualTalTal,
    GeqII,
    GeqFF,
    GtII,
    GtFF,
    LtII,
    LtFF,
    LeqII,
    LeqFF,
    ShLeftII,
    ShRightII,
    UShRightII,
    AddII,
    AddIF,
    AddFI,
    AddFF,
    AddSS,
    AddVV,
    SubII,
    SubIF,
    SubFI,
    SubFF,
    SubVV,
    MulII,
    MulIF,
    MulFI,
    MulFF,
    MulVF,
    MulFV,
    DivII,
    DivIF,
    DivFI,
    DivFF,
    DivVF,
    DivFV,
    ModII,
    NegI,
    NegF,
    CompI,
    MovSp { stack_offset: i32 },
    Jmp { jump_offset: i32 },
    Jsr { jump_offset: i32 },
    Jz { jump_offset: i32 },
    Retn,
    Destruct { size: u16, stack_offset: i16, size_no_destroy: u16 },
    NotI,
    DecISp { stack_offset: i32 },
    IncISp { stack_offset: i32 },
    Jnz { jump_offset: i32 },
    CpDownBp { stack_offset: i32, size: u16 },
    CpTopBp { stack_offset: i32, size: u16 },
    DecIBp { stack_offset: i32 },
    IncIBp { stack_offset: i32 },
    SaveBp,
    RestoreBp,
    StoreState { size: u32, size_locals: u32 },
    Nop2,
    /// A tag the decoder could not map; executing it faults.
    Unknown { code: u16 },
}

impl Op {
    /// NCS type code: opcode byte in the low half, qualifier in the high half.
    pub fn code(&self) -> u16 {
        use byte_code as b;
        use qualifier as q;
        match self {
            Op::Nop => pack(b::NOP, 0x0c),
            Op::CpDownSp { .. } => pack(b::CPDOWNSP, 0x01),
            Op::RsAddI => pack(b::RSADD, q::INT),
            Op::RsAddF => pack(b::RSADD, q::FLOAT),
            Op::RsAddS => pack(b::RSADD, q::STRING),
            Op::RsAddO => pack(b::RSADD, q::OBJECT),
            Op::RsAddEff => pack(b::RSADD, q::EFFECT),
            Op::RsAddEvt => pack(b::RSADD, q::EVENT),
            Op::RsAddLoc => pack(b::RSADD, q::LOCATION),
            Op::RsAddTal => pack(b::RSADD, q::TALENT),
            Op::CpTopSp { .. } => pack(b::CPTOPSP, 0x01),
            Op::ConstI(_) => pack(b::CONST, q::INT),
            Op::ConstF(_) => pack(b::CONST, q::FLOAT),
            Op::ConstS(_) => pack(b::CONST, q::STRING),
            Op::ConstO(_) => pack(b::CONST, q::OBJECT),
            Op::Action { .. } => pack(b::ACTION, 0x00),
            Op::LogAndII => pack(b::LOGAND, q::II),
            Op::LogOrII => pack(b::LOGOR, q::II),
            Op::IncOrII => pack(b::INCOR, q::II),
            Op::ExcOrII => pack(b::EXCOR, q::II),
            Op::BoolAndII => pack(b::BOOLAND, q::II),
            Op::EqualII => pack(b::EQUAL, q::II),
            Op::EqualFF => pack(b::EQUAL, q::FF),
            Op::EqualSS => pack(b::EQUAL, q::SS),
            Op::EqualOO => pack(b::EQUAL, q::OO),
            Op::EqualTT { .. } => pack(b::EQUAL, q::TT),
            Op::EqualEffEff => pack(b::EQUAL, q::EFF_EFF),
            Op::EqualEvtEvt => pack(b::EQUAL, q::EVT_EVT),
            Op::EqualLocLoc => pack(b::EQUAL, q::LOC_LOC),
            Op::EqualTalTal => pack(b::EQUAL, q::TAL_TAL),
            Op::NEqualII => pack(b::NEQUAL, q::II),
            Op::NEqualFF => pack(b::NEQUAL, q::FF),
            Op::NEqualSS => pack(b::NEQUAL, q::SS),
            Op::NEqualOO => pack(b::NEQUAL, q::OO),
            Op::NEqualTT { .. } => pack(b::NEQUAL, q::TT),
            Op::NEqualEffEff => pack(b::NEQUAL, q::EFF_EFF),
            Op::NEqualEvtEvt => pack(b::NEQUAL, q::EVT_EVT),
            Op::NEqualLocLoc => pack(b::NEQUAL, q::LOC_LOC),
            Op::NEqualTalTal => pack(b::NEQUAL, q::TAL_TAL),
            Op::GeqII => pack(b::GEQ, q::II),
            Op::GeqFF => pack(b::GEQ, q::FF),
            Op::GtII => pack(b::GT, q::II),
            Op::GtFF => pack(b::GT, q::FF),
            Op::LtII => pack(b::LT, q::II),
            Op::LtFF => pack(b::LT, q::FF),
            Op::LeqII => pack(b::LEQ, q::II),
            Op::LeqFF => pack(b::LEQ, q::FF),
            Op::ShLeftII => pack(b::SHLEFT, q::II),
            Op::ShRightII => pack(b::SHRIGHT, q::II),
            Op::UShRightII => pack(b::USHRIGHT, q::II),
            Op::AddII => pack(b::ADD, q::II),
            Op::AddIF => pack(b::ADD, q::IF),
            Op::AddFI => pack(b::ADD, q::FI),
            Op::AddFF => pack(b::ADD, q::FF),
            Op::AddSS => pack(b::ADD, q::SS),
            Op::AddVV => pack(b::ADD, q::VV),
            Op::SubII => pack(b::SUB, q::II),
            Op::SubIF => pack(b::SUB, q::IF),
            Op::SubFI => pack(b::SUB, q::FI),
            Op::SubFF => pack(b::SUB, q::FF),
            Op::SubVV => pack(b::SUB, q::VV),
            Op::MulII => pack(b::MUL, q::II),
            Op::MulIF => pack(b::MUL, q::IF),
            Op::MulFI => pack(b::MUL, q::FI),
            Op::MulFF => pack(b::MUL, q::FF),
            Op::MulVF => pack(b::MUL, q::VF),
            Op::MulFV => pack(b::MUL, q::FV),
            Op::DivII => pack(b::DIV, q::II),
            Op::DivIF => pack(b::DIV, q::IF),
            Op::DivFI => pack(b::DIV, q::FI),
            Op::DivFF => pack(b::DIV, q::FF),
            Op::DivVF => pack(b::DIV, q::VF),
            Op::DivFV => pack(b::DIV, q::FV),
            Op::ModII => pack(b::MOD, q::II),
            Op::NegI => pack(b::NEG, q::INT),
            Op::NegF => pack(b::NEG, q::FLOAT),
            Op::CompI => pack(b::COMP, q::INT),
            Op::MovSp { .. } => pack(b::MOVSP, 0x00),
            Op::Jmp { .. } => pack(b::JMP, 0x00),
            Op::Jsr { .. } => pack(b::JSR, 0x00),
            Op::Jz { .. } => pack(b::JZ, 0x00),
            Op::Retn => pack(b::RETN, 0x00),
            Op::Destruct { .. } => pack(b::DESTRUCT, 0x01),
            Op::NotI => pack(b::NOT, q::INT),
            Op::DecISp { .. } => pack(b::DECSP, q::INT),
            Op::IncISp { .. } => pack(b::INCSP, q::INT),
            Op::Jnz { .. } => pack(b::JNZ, 0x00),
            Op::CpDownBp { .. } => pack(b::CPDOWNBP, 0x01),
            Op::CpTopBp { .. } => pack(b::CPTOPBP, 0x01),
            Op::DecIBp { .. } => pack(b::DECBP, q::INT),
            Op::IncIBp { .. } => pack(b::INCBP, q::INT),
            Op::SaveBp => pack(b::SAVEBP, 0x00),
            Op::RestoreBp => pack(b::RESTOREBP, 0x00),
            Op::StoreState { .. } => pack(b::STORE_STATE, 0x10),
            Op::Nop2 => pack(b::NOP2, 0x00),
            Op::Unknown { code } => *code,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::Nop => "NOP",
            Op::CpDownSp { .. } => "CPDOWNSP",
            Op::RsAddI => "RSADDI",
            Op::RsAddF => "RSADDF",
            Op::RsAddS => "RSADDS",
            Op::RsAddO => "RSADDO",
            Op::RsAddEff => "RSADDEFF",
            Op::RsAddEvt => "RSADDEVT",
            Op::RsAddLoc => "RSADDLOC",
            Op::RsAddTal => "RSADDTAL",
            Op::CpTopSp { .. } => "CPTOPSP",
            Op::ConstI(_) => "CONSTI",
            Op::ConstF(_) => "CONSTF",
            Op::ConstS(_) => "CONSTS",
            Op::ConstO(_) => "CONSTO",
            Op::Action { .. } => "ACTION",
            Op::LogAndII => "LOGANDII",
            Op::LogOrII => "LOGORII",
            Op::IncOrII => "INCORII",
            Op::ExcOrII => "EXCORII",
            Op::BoolAndII => "BOOLANDII",
            Op::EqualII => "EQUALII",
            Op::EqualFF => "EQUALFF",
            Op::EqualSS => "EQUALSS",
            Op::EqualOO => "EQUALOO",
            Op::EqualTT { .. } => "EQUALTT",
            Op::EqualEffEff => "EQUALEFFEFF",
            Op::EqualEvtEvt => "EQUALEVTEVT",
            Op::EqualLocLoc => "EQUALLOCLOC",
            Op::EqualTalTal => "EQUALTALTAL",
            Op::NEqualII => "NEQUALII",
            Op::NEqualFF => "NEQUALFF",
            Op::NEqualSS => "NEQUALSS",
            Op::NEqualOO => "NEQUALOO",
            Op::NEqualTT { .. } => "NEQUALTT",
            Op::NEqualEffEff => "NEQUALEFFEFF",
            Op::NEqualEvtEvt => "NEQUALEVTEVT",
            Op::NEqualLocLoc => "NEQUALLOCLOC",
            Op::NEqualTalTal => "NEQUALTALTAL",
            Op::GeqII => "GEQII",
            Op::GeqFF => "GEQFF",
            Op::GtII => "GTII",
            Op::GtFF => "GTFF",
            Op::LtII => "LTII",
            Op::LtFF => "LTFF",
            Op::LeqII => "LEQII",
            Op::LeqFF => "LEQFF",
            Op::ShLeftII => "SHLEFTII",
            Op::ShRightII => "SHRIGHTII",
            Op::UShRightII => "USHRIGHTII",
            Op::AddII => "ADDII",
            Op::AddIF => "ADDIF",
            Op::AddFI => "ADDFI",
            Op::AddFF => "ADDFF",
            Op::AddSS => "ADDSS",
            Op::AddVV => "ADDVV",
            Op::SubII => "SUBII",
            Op::SubIF => "SUBIF",
            Op::SubFI => "SUBFI",
            Op::SubFF => "SUBFF",
            Op::SubVV => "SUBVV",
            Op::MulII => "MULII",
            Op::MulIF => "MULIF",
            Op::MulFI => "MULFI",
            Op::MulFF => "MULFF",
            Op::MulVF => "MULVF",
            Op::MulFV => "MULFV",
            Op::DivII => "DIVII",
            Op::DivIF => "DIVIF",
            Op::DivFI => "DIVFI",
            Op::DivFF => "DIVFF",
            Op::DivVF => "DIVVF",
            Op::DivFV => "DIVFV",
            Op::ModII => "MODII",
            Op::NegI => "NEGI",
            Op::NegF => "NEGF",
            Op::CompI => "COMPI",
            Op::MovSp { .. } => "MOVSP",
            Op::Jmp { .. } => "JMP",
            Op::Jsr { .. } => "JSR",
            Op::Jz { .. } => "JZ",
            Op::Retn => "RETN",
            Op::Destruct { .. } => "DESTRUCT",
            Op::NotI => "NOTI",
            Op::DecISp { .. } => "DECISP",
            Op::IncISp { .. } => "INCISP",
            Op::Jnz { .. } => "JNZ",
            Op::CpDownBp { .. } => "CPDOWNBP",
            Op::CpTopBp { .. } => "CPTOPBP",
            Op::DecIBp { .. } => "DECIBP",
            Op::IncIBp { .. } => "INCIBP",
            Op::SaveBp => "SAVEBP",
            Op::RestoreBp => "RESTOREBP",
            Op::StoreState { .. } => "STORE_STATE",
            Op::Nop2 => "NOP2",
            Op::Unknown { .. } => "UNKNOWN",
        }
    }

    /// Encoded size in bytes: two bytes of type code plus the operands.
    pub fn encoded_size(&self) -> u32 {
        let operands = match self {
            Op::CpDownSp { .. } | Op::CpTopSp { .. } | Op::CpDownBp { .. } | Op::CpTopBp { .. } | Op::Destruct { .. } => 6,
            Op::ConstI(_)
            | Op::ConstF(_)
            | Op::ConstO(_)
            | Op::MovSp { .. }
            | Op::Jmp { .. }
            | Op::Jsr { .. }
            | Op::Jz { .. }
            | Op::Jnz { .. }
            | Op::DecISp { .. }
            | Op::IncISp { .. }
            | Op::DecIBp { .. }
            | Op::IncIBp { .. } => 4,
            Op::ConstS(s) => 2 + s.len() as u32,
            Op::Action { .. } => 3,
            Op::StoreState { .. } => 8,
            Op::EqualTT { .. } | Op::NEqualTT { .. } => 2,
            _ => 0,
        };
        2 + operands
    }

    /// The op with this mnemonic and zeroed operands.
    pub fn from_mnemonic(name: &str) -> Option<Op> {
        BY_MNEMONIC.get(name).cloned()
    }

    /// The op with this NCS type code and zeroed operands; unmapped codes become [`Op::Unknown`].
    pub fn from_code(code: u16) -> Op {
        BY_CODE.get(&code).cloned().unwrap_or(Op::Unknown { code })
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

fn templates() -> Vec<Op> {
    vec![
        Op::Nop,
        Op::CpDownSp { stack_offset: 0, size: 0 },
        Op::RsAddI,
        Op::RsAddF,
        Op::RsAddS,
        Op::RsAddO,
        Op::RsAddEff,
        Op::RsAddEvt,
        Op::RsAddLoc,
        Op::RsAddTal,
        Op::CpTopSp { stack_offset: 0, size: 0 },
        Op::ConstI(0),
        Op::ConstF(0.0),
        Op::ConstS(String::new()),
        Op::ConstO(0),
        Op::Action { routine: 0, arg_count: 0 },
        Op::LogAndII,
        Op::LogOrII,
        Op::IncOrII,
        Op::ExcOrII,
        Op::BoolAndII,
        Op::EqualII,
        Op::EqualFF,
        Op::EqualSS,
        Op::EqualOO,
        Op::EqualTT { size: 0 },
        Op::EqualEffEff,
        Op::EqualEvtEvt,
        Op::EqualLocLoc,
        Op::EqualTalTal,
        Op::NEqualII,
        Op::NEqualFF,
        Op::NEqualSS,
        Op::NEqualOO,
        Op::NEqualTT { size: 0 },
        Op::NEqualEffEff,
        Op::NEqualEvtEvt,
        Op::NEqualLocLoc,
        Op::NEqualTalTal,
        Op::GeqII,
        Op::GeqFF,
        Op::GtII,
        Op::GtFF,
        Op::LtII,
        Op::LtFF,
        Op::LeqII,
        Op::LeqFF,
        Op::ShLeftII,
        Op::ShRightII,
        Op::UShRightII,
        Op::AddII,
        Op::AddIF,
        Op::AddFI,
        Op::AddFF,
        Op::AddSS,
        Op::AddVV,
        Op::SubII,
        Op::SubIF,
        Op::SubFI,
        Op::SubFF,
        Op::SubVV,
        Op::MulII,
        Op::MulIF,
        Op::MulFI,
        Op::MulFF,
        Op::MulVF,
        Op::MulFV,
        Op::DivII,
        Op::DivIF,
        Op::DivFI,
        Op::DivFF,
        Op::DivVF,
        Op::DivFV,
        Op::ModII,
        Op::NegI,
        Op::NegF,
        Op::CompI,
        Op::MovSp { stack_offset: 0 },
        Op::Jmp { jump_offset: 0 },
        Op::Jsr { jump_offset: 0 },
        Op::Jz { jump_offset: 0 },
        Op::Retn,
        Op::Destruct {
            size: 0,
            stack_offset: 0,
            size_no_destroy: 0,
        },
        Op::NotI,
        Op::DecISp { stack_offset: 0 },
        Op::IncISp { stack_offset: 0 },
        Op::Jnz { jump_offset: 0 },
        Op::CpDownBp { stack_offset: 0, size: 0 },
        Op::CpTopBp { stack_offset: 0, size: 0 },
        Op::DecIBp { stack_offset: 0 },
        Op::IncIBp { stack_offset: 0 },
        Op::SaveBp,
        Op::RestoreBp,
        Op::StoreState { size: 0, size_locals: 0 },
        Op::Nop2,
    ]
}

static BY_MNEMONIC: Lazy<FxHashMap<&'static str, Op>> = Lazy::new(|| {
    let ops = templates();
    let mut map = FxHashMap::with_capacity_and_hasher(ops.len(), Default::default());
    for op in ops {
        map.insert(op.mnemonic(), op);
    }
    map
});

static BY_CODE: Lazy<FxHashMap<u16, Op>> = Lazy::new(|| {
    let ops = templates();
    let mut map = FxHashMap::with_capacity_and_hasher(ops.len(), Default::default());
    for op in ops {
        map.insert(op.code(), op);
    }
    map
});
