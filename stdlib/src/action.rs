use std::sync::Arc;

use anyhow::bail;
use nwscript_core::VariableKind::{Action, Float, Object, Void};
use nwscript_core::{RoutineTable, Variable};

use crate::args::{get_action, get_float, get_object};
use crate::host::{Host, HostRef};

/// AssignCommand and DelayCommand. Both queue the action's continuation on the
/// host; nothing runs until [`Host::run_deferred`].
pub struct ActionRoutines;

impl ActionRoutines {
    pub fn register(table: &mut RoutineTable, host: &Arc<Host>) {
        let h = HostRef::new(host);
        table.insert_native(6, "AssignCommand", Void, vec![Object, Action], move |args, ctx| {
            let subject = get_object(args, 0, ctx)?;
            let action = get_action(args, 1)?;
            if action.saved_state.is_none() {
                bail!("AssignCommand: action has no saved state");
            }
            h.get()?.schedule(subject, 0.0, action);
            Ok(Variable::Void)
        });

        let h = HostRef::new(host);
        table.insert_native(7, "DelayCommand", Void, vec![Float, Action], move |args, ctx| {
            let seconds = get_float(args, 0)?;
            let action = get_action(args, 1)?;
            if action.saved_state.is_none() {
                bail!("DelayCommand: action has no saved state");
            }
            h.get()?.schedule(ctx.caller_id, seconds.max(0.0), action);
            Ok(Variable::Void)
        });
    }
}
