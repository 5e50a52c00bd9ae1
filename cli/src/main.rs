use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Once};

use anyhow::Context;
use clap::{Parser, Subcommand};
use nwscript_core::{
    ExecutionContext, HaltKind, OBJECT_INVALID, Program, RoutineTable, Routines, RunOutcome, VirtualMachine, VmConfig,
    describe_instruction,
};
use nwscript_stdlib::Host;

mod loader;

static TRACE_INIT: Once = Once::new();
const TRACE_ENV: &str = "NWSCRIPT_TRACE";
const DEFAULT_TRACE_FILTER: &str = "nwscript::vm=debug,nwscript::vm::action=debug,nwscript::stdlib=info";

#[derive(Debug, Parser)]
#[command(name = "nwscript", author, version, about = "Run and inspect NWScript bytecode programs", long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Execute a program file (.json, .yaml or .yml) against the stdlib routines.
    Run {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        /// Object id OBJECT_SELF resolves to
        #[arg(long, default_value_t = OBJECT_INVALID)]
        caller: u32,
        #[arg(long, default_value_t = OBJECT_INVALID)]
        triggerer: u32,
        /// User-defined event number
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        event: i32,
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        script_var: i32,
        /// Fault after this many instructions (overrides NWSCRIPT_MAX_INSTRUCTIONS)
        #[arg(long)]
        max_instructions: Option<u64>,
        /// Register a host object, as ID:TAG. Repeatable.
        #[arg(long = "object", value_name = "ID:TAG", value_parser = parse_object_spec)]
        objects: Vec<(u32, String)>,
        /// Leave deferred commands queued instead of running them after the script
        #[arg(long)]
        no_drain: bool,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one line per instruction.
    Disasm {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
    },
    /// List the stdlib routine table.
    Routines {
        #[arg(long)]
        json: bool,
    },
}

fn sanitize_path(raw: &str) -> anyhow::Result<PathBuf> {
    let p = Path::new(raw);

    for comp in p.components() {
        if matches!(comp, Component::ParentDir) {
            return Err(anyhow::anyhow!(
                "Parent directory components ('..') are not allowed in file paths."
            ));
        }
    }

    Ok(p.to_path_buf())
}

fn parse_sanitized_path(raw: &str) -> Result<PathBuf, String> {
    sanitize_path(raw).map_err(|e| e.to_string())
}

fn parse_object_spec(raw: &str) -> Result<(u32, String), String> {
    let (id, tag) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected ID:TAG, got '{}'", raw))?;
    let id = id
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid object id '{}': {}", id, e))?;
    Ok((id, tag.to_string()))
}

fn env_toggle_enabled(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    !(trimmed.eq_ignore_ascii_case("0") || trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("off"))
}

fn filter_expr_from(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("1")
        || trimmed.eq_ignore_ascii_case("true")
        || trimmed.eq_ignore_ascii_case("on")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn maybe_init_tracing() {
    let raw = match std::env::var(TRACE_ENV) {
        Ok(value) => value,
        Err(_) => return,
    };

    if !env_toggle_enabled(&raw) {
        return;
    }

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;

        let filter_expr = filter_expr_from(&raw).or_else(|| std::env::var("RUST_LOG").ok());

        let builder = fmt().with_writer(std::io::stderr);

        let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };

        let _ = builder.try_init();
    });
}

struct RunOptions {
    context: ExecutionContext,
    config: VmConfig,
    objects: Vec<(u32, String)>,
    drain: bool,
}

struct RunReport {
    outcome: RunOutcome,
    console: Vec<String>,
    deferred: Vec<RunOutcome>,
    pending: usize,
}

fn run_program(program: Program, options: RunOptions) -> RunReport {
    let host = Arc::new(Host::new().with_config(options.config));
    for (id, tag) in &options.objects {
        host.spawn(*id, tag);
    }
    let routines: Arc<dyn Routines> = Arc::new(nwscript_stdlib::routines(&host));
    let context = options.context.with_routines(routines);

    let mut vm = VirtualMachine::new(Arc::new(program), context).with_config(options.config);
    let outcome = vm.execute();

    let deferred = if options.drain {
        host.run_deferred().into_iter().map(|run| run.outcome).collect()
    } else {
        Vec::new()
    };

    RunReport {
        outcome,
        console: host.console(),
        deferred,
        pending: host.pending().len(),
    }
}

fn outcome_json(outcome: &RunOutcome) -> serde_json::Value {
    serde_json::json!({
        "result": outcome.result,
        "halt": match outcome.halt {
            HaltKind::Normal => "normal",
            HaltKind::Fault => "fault",
        },
        "fault": outcome.fault.as_ref().map(|err| err.to_string()),
    })
}

fn print_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        let value = serde_json::json!({
            "outcome": outcome_json(&report.outcome),
            "console": report.console,
            "deferred": report.deferred.iter().map(outcome_json).collect::<Vec<_>>(),
            "pending": report.pending,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for line in &report.console {
        println!("{}", line);
    }
    for run in &report.deferred {
        if let Some(err) = &run.fault {
            eprintln!("deferred command faulted: {}", err);
        }
    }
    if let Some(err) = &report.outcome.fault {
        eprintln!("Error: {}", err);
    }
    println!("{}", report.outcome.result);
    Ok(())
}

fn disassemble(program: &Program, routines: &RoutineTable) -> Vec<String> {
    program
        .instructions()
        .iter()
        .map(|ins| describe_instruction(ins, Some(routines as &dyn Routines)))
        .collect()
}

fn routine_listing(table: &RoutineTable) -> Vec<String> {
    table
        .iter()
        .map(|(index, routine)| {
            let args = routine
                .argument_types()
                .iter()
                .map(|kind| kind.name())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{:>4} {} {}({})", index, routine.return_type().name(), routine.name(), args)
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    maybe_init_tracing();

    let CliArgs { command } = CliArgs::parse();

    match command {
        Commands::Run {
            file,
            caller,
            triggerer,
            event,
            script_var,
            max_instructions,
            objects,
            no_drain,
            json,
        } => {
            let program = loader::load_program(&file)?;
            let mut config = VmConfig::from_env();
            if let Some(limit) = max_instructions {
                config = config.with_instruction_limit(limit);
            }
            let context = ExecutionContext::new()
                .with_caller(caller)
                .with_triggerer(triggerer)
                .with_user_defined_event(event)
                .with_script_var(script_var);
            let report = run_program(
                program,
                RunOptions {
                    context,
                    config,
                    objects,
                    drain: !no_drain,
                },
            );
            print_report(&report, json)?;
            if report.outcome.halt == HaltKind::Fault {
                std::process::exit(2);
            }
        }
        Commands::Disasm { file } => {
            let program = loader::load_program(&file)?;
            let table = nwscript_stdlib::routines(&Arc::new(Host::new()));
            println!("; {} ({} instructions, {} bytes)", program.name(), program.len(), program.length());
            for line in disassemble(&program, &table) {
                println!("{}", line);
            }
        }
        Commands::Routines { json } => {
            let table = nwscript_stdlib::routines(&Arc::new(Host::new()));
            if json {
                let entries: Vec<serde_json::Value> = table
                    .iter()
                    .map(|(index, routine)| {
                        serde_json::json!({
                            "index": index,
                            "name": routine.name(),
                            "return": routine.return_type().name(),
                            "args": routine.argument_types().iter().map(|k| k.name()).collect::<Vec<_>>(),
                        })
                    })
                    .collect();
                let rendered = serde_json::to_string_pretty(&entries).context("Failed to render routine table")?;
                println!("{}", rendered);
            } else {
                for line in routine_listing(&table) {
                    println!("{}", line);
                }
            }
        }
    }

    Ok(())
}
