use std::sync::Arc;

use nwscript_core::VariableKind::{Int, Object, String as Str};
use nwscript_core::{OBJECT_INVALID, RoutineTable, Variable};

use crate::args::{get_int_or_else, get_object, get_string};
use crate::host::{Host, HostRef};

/// Routines reading the execution context or the host's object set.
pub struct ObjectRoutines;

impl ObjectRoutines {
    pub fn register(table: &mut RoutineTable, host: &Arc<Host>) {
        table.insert_native(25, "GetEnteringObject", Object, vec![], |_, ctx| {
            Ok(Variable::Object(ctx.triggerer_id))
        });
        table.insert_native(26, "GetExitingObject", Object, vec![], |_, ctx| {
            Ok(Variable::Object(ctx.triggerer_id))
        });
        table.insert_native(247, "GetUserDefinedEventNumber", Int, vec![], |_, ctx| {
            Ok(Variable::Int(ctx.user_defined_event_number))
        });
        table.insert_native(565, "GetRunScriptVar", Int, vec![], |_, ctx| Ok(Variable::Int(ctx.script_var)));

        let h = HostRef::new(host);
        table.insert_native(42, "GetIsObjectValid", Int, vec![Object], move |args, ctx| {
            let host = h.get()?;
            let valid = get_object(args, 0, ctx).is_ok_and(|id| host.is_valid(id));
            Ok(Variable::Int(valid as i32))
        });

        // unknown objects have an empty tag
        let h = HostRef::new(host);
        table.insert_native(168, "GetTag", Str, vec![Object], move |args, ctx| {
            let id = get_object(args, 0, ctx)?;
            Ok(Variable::String(h.get()?.tag_of(id).unwrap_or_default()))
        });

        let h = HostRef::new(host);
        table.insert_native(200, "GetObjectByTag", Object, vec![Str, Int], move |args, _| {
            let tag = get_string(args, 0)?;
            let nth = get_int_or_else(args, 1, 0)?;
            let found = match usize::try_from(nth) {
                Ok(nth) if !tag.is_empty() => h.get()?.find_by_tag(tag, nth),
                _ => None,
            };
            Ok(Variable::Object(found.unwrap_or(OBJECT_INVALID)))
        });
    }
}
