use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::val::VariableKind;

/// Reasons a program can fault while it runs.
#[derive(Debug, Clone)]
pub enum VmError {
    /// A slot or routine result held a different kind than the instruction required.
    TypeMismatch {
        expected: VariableKind,
        actual: VariableKind,
    },
    UnknownOpcode {
        code: u16,
    },
    /// No instruction region covers this offset.
    InvalidOffset(i64),
    RoutineNotFound(u16),
    /// ACTION asked for more arguments than the routine declares.
    RoutineArityExceeded {
        routine: String,
        declared: usize,
        requested: usize,
    },
    StackUnderflow,
    StackIndexOutOfRange {
        index: i64,
        len: usize,
    },
    DivisionByZero,
    InstructionLimitExceeded(u64),
    /// Continuation requested from a context without a saved state.
    MissingSavedState,
    /// A routine reported a failure of its own.
    Routine {
        name: String,
        source: Arc<anyhow::Error>,
    },
}

impl VmError {
    pub fn routine(name: &str, source: anyhow::Error) -> Self {
        VmError::Routine {
            name: name.to_string(),
            source: Arc::new(source),
        }
    }
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, actual)
            }
            VmError::UnknownOpcode { code } => write!(f, "Unknown opcode 0x{:04x}", code),
            VmError::InvalidOffset(offset) => write!(f, "Invalid instruction offset: {}", offset),
            VmError::RoutineNotFound(index) => write!(f, "Routine not found: {}", index),
            VmError::RoutineArityExceeded {
                routine,
                declared,
                requested,
            } => write!(
                f,
                "Too many arguments for routine {}: declared {}, requested {}",
                routine, declared, requested
            ),
            VmError::StackUnderflow => write!(f, "Stack underflow"),
            VmError::StackIndexOutOfRange { index, len } => {
                write!(f, "Stack index {} out of range (stack size {})", index, len)
            }
            VmError::DivisionByZero => write!(f, "Division by zero"),
            VmError::InstructionLimitExceeded(limit) => {
                write!(f, "Instruction limit of {} exceeded", limit)
            }
            VmError::MissingSavedState => write!(f, "Execution context has no saved state"),
            VmError::Routine { name, source } => write!(f, "Routine {} failed: {}", name, source),
        }
    }
}

impl Error for VmError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            VmError::Routine { source, .. } => {
                let inner: &(dyn Error + 'static) = (**source).as_ref();
                Some(inner)
            }
            _ => None,
        }
    }
}
