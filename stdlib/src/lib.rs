pub mod action;
pub mod args;
pub mod host;
pub mod math;
pub mod object;
pub mod string;


use std::sync::Arc;

use nwscript_core::RoutineTable;
use tracing::debug;

pub use host::{DeferredCommand, DeferredRun, Host};

/// Routine table with every stdlib routine at its engine index, bound to `host`.
pub fn routines(host: &Arc<Host>) -> RoutineTable {
    let mut table = RoutineTable::new();
    string::StringRoutines::register(&mut table, host);
    math::MathRoutines::register(&mut table);
    object::ObjectRoutines::register(&mut table, host);
    action::ActionRoutines::register(&mut table, host);
    debug!(target: "nwscript::stdlib", routines = table.len(), "stdlib registered");
    table
}
