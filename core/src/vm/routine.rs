use anyhow::Result;
use rustc_hash::FxHashMap;

use crate::val::{Variable, VariableKind};

use super::context::ExecutionContext;

/// A host function callable from ACTION.
pub trait Routine: Send + Sync {
    fn name(&self) -> &str;

    fn return_type(&self) -> VariableKind;

    fn argument_types(&self) -> &[VariableKind];

    fn argument_count(&self) -> usize {
        self.argument_types().len()
    }

    /// `args` holds exactly the arguments the script passed, possibly fewer than declared.
    fn invoke(&self, args: &[Variable], ctx: &ExecutionContext) -> Result<Variable>;
}

/// Indexed routine table the machine resolves ACTION against.
pub trait Routines: Send + Sync {
    fn get(&self, index: u16) -> Option<&dyn Routine>;
}

pub type RoutineFn = Box<dyn Fn(&[Variable], &ExecutionContext) -> Result<Variable> + Send + Sync>;

/// Routine backed by a closure.
pub struct NativeRoutine {
    name: String,
    return_type: VariableKind,
    argument_types: Vec<VariableKind>,
    func: RoutineFn,
}

impl NativeRoutine {
    pub fn new<F>(name: &str, return_type: VariableKind, argument_types: Vec<VariableKind>, func: F) -> Self
    where
        F: Fn(&[Variable], &ExecutionContext) -> Result<Variable> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            return_type,
            argument_types,
            func: Box::new(func),
        }
    }
}

impl Routine for NativeRoutine {
    fn name(&self) -> &str {
        &self.name
    }

    fn return_type(&self) -> VariableKind {
        self.return_type
    }

    fn argument_types(&self) -> &[VariableKind] {
        &self.argument_types
    }

    fn invoke(&self, args: &[Variable], ctx: &ExecutionContext) -> Result<Variable> {
        (self.func)(args, ctx)
    }
}

/// Routines addressed by ACTION index. Slots may be left empty so a table can
/// mirror the engine's numbering.
#[derive(Default)]
pub struct RoutineTable {
    routines: Vec<Option<Box<dyn Routine>>>,
    index_by_name: FxHashMap<String, u16>,
}

impl RoutineTable {
    pub fn new() -> Self {
        Self {
            routines: Vec::new(),
            index_by_name: FxHashMap::default(),
        }
    }

    /// Register a routine in the next free slot at the end and return its index.
    pub fn add<R: Routine + 'static>(&mut self, routine: R) -> u16 {
        let index = self.routines.len() as u16;
        self.insert(index, routine);
        index
    }

    /// Register a routine at `index`, replacing any routine already there.
    pub fn insert<R: Routine + 'static>(&mut self, index: u16, routine: R) {
        let slot = usize::from(index);
        if slot >= self.routines.len() {
            self.routines.resize_with(slot + 1, || None);
        }
        let name = routine.name().to_string();
        if let Some(old) = self.routines[slot].replace(Box::new(routine)) {
            self.forget_name(old.name(), index);
        }
        self.index_by_name.insert(name, index);
    }

    // Drop `name`'s lookup entry if it points at `index`, falling back to
    // another slot that still carries the name.
    fn forget_name(&mut self, name: &str, index: u16) {
        if self.index_by_name.get(name) != Some(&index) {
            return;
        }
        let other = self
            .iter()
            .find(|(i, r)| *i != index && r.name() == name)
            .map(|(i, _)| i);
        match other {
            Some(other) => {
                self.index_by_name.insert(name.to_string(), other);
            }
            None => {
                self.index_by_name.remove(name);
            }
        }
    }

    pub fn add_native<F>(&mut self, name: &str, return_type: VariableKind, argument_types: Vec<VariableKind>, func: F) -> u16
    where
        F: Fn(&[Variable], &ExecutionContext) -> Result<Variable> + Send + Sync + 'static,
    {
        self.add(NativeRoutine::new(name, return_type, argument_types, func))
    }

    pub fn insert_native<F>(
        &mut self,
        index: u16,
        name: &str,
        return_type: VariableKind,
        argument_types: Vec<VariableKind>,
        func: F,
    ) where
        F: Fn(&[Variable], &ExecutionContext) -> Result<Variable> + Send + Sync + 'static,
    {
        self.insert(index, NativeRoutine::new(name, return_type, argument_types, func));
    }

    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.index_by_name.get(name).copied()
    }

    /// Number of registered routines.
    pub fn len(&self) -> usize {
        self.routines.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.iter().all(|slot| slot.is_none())
    }

    /// Registered routines in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &dyn Routine)> {
        self.routines
            .iter()
            .enumerate()
            .filter_map(|(i, routine)| routine.as_deref().map(|r| (i as u16, r)))
    }
}

impl Routines for RoutineTable {
    fn get(&self, index: u16) -> Option<&dyn Routine> {
        self.routines.get(usize::from(index)).and_then(|r| r.as_deref())
    }
}
