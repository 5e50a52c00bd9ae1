use std::path::Path;

use anyhow::{Context, bail};
use nwscript_core::Program;
use tracing::debug;

/// Load a program file, picking the format from the extension.
pub(crate) fn load_program(path: &Path) -> anyhow::Result<Program> {
    let src = std::fs::read_to_string(path).with_context(|| format!("Failed to read file '{}'", path.display()))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    let program = match extension.as_deref() {
        Some("json") => Program::from_json(&src),
        Some("yaml") | Some("yml") => Program::from_yaml(&src),
        _ => bail!(
            "Unsupported program format for '{}': expected .json, .yaml or .yml",
            path.display()
        ),
    }
    .with_context(|| format!("Failed to load program '{}'", path.display()))?;
    debug!(
        target: "nwscript::cli",
        program = program.name(),
        instructions = program.len(),
        length = program.length(),
        "loaded"
    );
    Ok(program)
}
