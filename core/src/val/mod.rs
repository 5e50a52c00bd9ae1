//! Script variables.
//!
//! A [`Variable`] is the unit stored in every operand stack slot. The payload is
//! carried by the enum variant itself, so reading an Int out of a Float slot is a
//! [`VmError::TypeMismatch`] raised by the checked accessors rather than a
//! reinterpretation of raw memory.

use std::fmt;
use std::sync::Arc;

use crate::vm::{ExecutionContext, OBJECT_INVALID, VmError};

mod engine;
mod vector;

pub use engine::{EngineHandle, EngineType};
pub use vector::Vector3;


/// Type tag of a [`Variable`], also used for routine signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Void,
    Int,
    Float,
    String,
    Object,
    Vector,
    Effect,
    Event,
    Location,
    Talent,
    Action,
}

impl VariableKind {
    pub fn name(self) -> &'static str {
        match self {
            VariableKind::Void => "void",
            VariableKind::Int => "int",
            VariableKind::Float => "float",
            VariableKind::String => "string",
            VariableKind::Object => "object",
            VariableKind::Vector => "vector",
            VariableKind::Effect => "effect",
            VariableKind::Event => "event",
            VariableKind::Location => "location",
            VariableKind::Talent => "talent",
            VariableKind::Action => "action",
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Default)]
pub enum Variable {
    #[default]
    Void,
    Int(i32),
    Float(f32),
    String(String),
    Object(u32),
    Vector(Vector3),
    Effect(Option<EngineHandle>),
    Event(Option<EngineHandle>),
    Location(Option<EngineHandle>),
    Talent(Option<EngineHandle>),
    /// Deferred call: a context bound to a captured continuation.
    Action(Arc<ExecutionContext>),
}

impl Variable {
    pub fn of_int(value: i32) -> Self {
        Variable::Int(value)
    }

    pub fn of_float(value: f32) -> Self {
        Variable::Float(value)
    }

    pub fn of_string<S: Into<String>>(value: S) -> Self {
        Variable::String(value.into())
    }

    pub fn of_object(id: u32) -> Self {
        Variable::Object(id)
    }

    pub fn of_vector(value: Vector3) -> Self {
        Variable::Vector(value)
    }

    pub fn of_effect(handle: Option<EngineHandle>) -> Self {
        Variable::Effect(handle)
    }

    pub fn of_event(handle: Option<EngineHandle>) -> Self {
        Variable::Event(handle)
    }

    pub fn of_location(handle: Option<EngineHandle>) -> Self {
        Variable::Location(handle)
    }

    pub fn of_talent(handle: Option<EngineHandle>) -> Self {
        Variable::Talent(handle)
    }

    pub fn of_action(context: Arc<ExecutionContext>) -> Self {
        Variable::Action(context)
    }

    /// Freshly reserved slot of the given kind, as pushed by the RSADD family.
    ///
    /// Actions cannot be reserved; asking for one yields `Void`.
    pub fn default_of(kind: VariableKind) -> Self {
        match kind {
            VariableKind::Int => Variable::Int(0),
            VariableKind::Float => Variable::Float(0.0),
            VariableKind::String => Variable::String(String::new()),
            VariableKind::Object => Variable::Object(OBJECT_INVALID),
            VariableKind::Vector => Variable::Vector(Vector3::default()),
            VariableKind::Effect => Variable::Effect(None),
            VariableKind::Event => Variable::Event(None),
            VariableKind::Location => Variable::Location(None),
            VariableKind::Talent => Variable::Talent(None),
            VariableKind::Void | VariableKind::Action => Variable::Void,
        }
    }

    pub fn kind(&self) -> VariableKind {
        match self {
            Variable::Void => VariableKind::Void,
            Variable::Int(_) => VariableKind::Int,
            Variable::Float(_) => VariableKind::Float,
            Variable::String(_) => VariableKind::String,
            Variable::Object(_) => VariableKind::Object,
            Variable::Vector(_) => VariableKind::Vector,
            Variable::Effect(_) => VariableKind::Effect,
            Variable::Event(_) => VariableKind::Event,
            Variable::Location(_) => VariableKind::Location,
            Variable::Talent(_) => VariableKind::Talent,
            Variable::Action(_) => VariableKind::Action,
        }
    }

    fn mismatch(&self, expected: VariableKind) -> VmError {
        VmError::TypeMismatch {
            expected,
            actual: self.kind(),
        }
    }

    pub fn as_int(&self) -> Result<i32, VmError> {
        match self {
            Variable::Int(value) => Ok(*value),
            other => Err(other.mismatch(VariableKind::Int)),
        }
    }

    pub fn as_int_mut(&mut self) -> Result<&mut i32, VmError> {
        match self {
            Variable::Int(value) => Ok(value),
            other => Err(other.mismatch(VariableKind::Int)),
        }
    }

    pub fn as_float(&self) -> Result<f32, VmError> {
        match self {
            Variable::Float(value) => Ok(*value),
            other => Err(other.mismatch(VariableKind::Float)),
        }
    }

    pub fn as_float_mut(&mut self) -> Result<&mut f32, VmError> {
        match self {
            Variable::Float(value) => Ok(value),
            other => Err(other.mismatch(VariableKind::Float)),
        }
    }

    pub fn as_str(&self) -> Result<&str, VmError> {
        match self {
            Variable::String(value) => Ok(value),
            other => Err(other.mismatch(VariableKind::String)),
        }
    }

    pub fn as_object(&self) -> Result<u32, VmError> {
        match self {
            Variable::Object(id) => Ok(*id),
            other => Err(other.mismatch(VariableKind::Object)),
        }
    }

    pub fn as_vector(&self) -> Result<Vector3, VmError> {
        match self {
            Variable::Vector(value) => Ok(*value),
            other => Err(other.mismatch(VariableKind::Vector)),
        }
    }

    /// Handle stored in an engine-type slot of the expected kind; `None` is a null handle.
    pub fn as_engine_type(&self, expected: VariableKind) -> Result<Option<&EngineHandle>, VmError> {
        let handle = match (expected, self) {
            (VariableKind::Effect, Variable::Effect(handle))
            | (VariableKind::Event, Variable::Event(handle))
            | (VariableKind::Location, Variable::Location(handle))
            | (VariableKind::Talent, Variable::Talent(handle)) => handle,
            _ => return Err(self.mismatch(expected)),
        };
        Ok(handle.as_ref())
    }

    pub fn as_action(&self) -> Result<&Arc<ExecutionContext>, VmError> {
        match self {
            Variable::Action(context) => Ok(context),
            other => Err(other.mismatch(VariableKind::Action)),
        }
    }
}

fn same_handle(a: &Option<EngineHandle>, b: &Option<EngineHandle>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Variable::Void, Variable::Void) => true,
            (Variable::Int(a), Variable::Int(b)) => a == b,
            (Variable::Float(a), Variable::Float(b)) => a == b,
            (Variable::String(a), Variable::String(b)) => a == b,
            (Variable::Object(a), Variable::Object(b)) => a == b,
            (Variable::Vector(a), Variable::Vector(b)) => a == b,
            (Variable::Effect(a), Variable::Effect(b))
            | (Variable::Event(a), Variable::Event(b))
            | (Variable::Location(a), Variable::Location(b))
            | (Variable::Talent(a), Variable::Talent(b)) => same_handle(a, b),
            (Variable::Action(a), Variable::Action(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Void => f.write_str("void"),
            Variable::Int(value) => write!(f, "{}", value),
            Variable::Float(value) => write!(f, "{:.6}", value),
            Variable::String(value) => write!(f, "\"{}\"", value),
            Variable::Object(id) => write!(f, "{}", id),
            Variable::Vector(value) => write!(f, "{}", value),
            Variable::Effect(_) | Variable::Event(_) | Variable::Location(_) | Variable::Talent(_) => {
                f.write_str(self.kind().name())
            }
            Variable::Action(_) => f.write_str("action"),
        }
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Void => f.write_str("Void"),
            Variable::Int(value) => f.debug_tuple("Int").field(value).finish(),
            Variable::Float(value) => f.debug_tuple("Float").field(value).finish(),
            Variable::String(value) => f.debug_tuple("String").field(value).finish(),
            Variable::Object(id) => f.debug_tuple("Object").field(id).finish(),
            Variable::Vector(value) => f.debug_tuple("Vector").field(value).finish(),
            Variable::Effect(handle) => f.debug_tuple("Effect").field(handle).finish(),
            Variable::Event(handle) => f.debug_tuple("Event").field(handle).finish(),
            Variable::Location(handle) => f.debug_tuple("Location").field(handle).finish(),
            Variable::Talent(handle) => f.debug_tuple("Talent").field(handle).finish(),
            Variable::Action(context) => f.debug_tuple("Action").field(context).finish(),
        }
    }
}

impl From<i32> for Variable {
    fn from(value: i32) -> Self {
        Variable::Int(value)
    }
}

impl From<f32> for Variable {
    fn from(value: f32) -> Self {
        Variable::Float(value)
    }
}

impl From<&str> for Variable {
    fn from(value: &str) -> Self {
        Variable::String(value.to_string())
    }
}

impl From<String> for Variable {
    fn from(value: String) -> Self {
        Variable::String(value)
    }
}

impl From<Vector3> for Variable {
    fn from(value: Vector3) -> Self {
        Variable::Vector(value)
    }
}
