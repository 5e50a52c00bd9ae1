/// Environment variable holding the default instruction budget.
pub const MAX_INSTRUCTIONS_ENV: &str = "NWSCRIPT_MAX_INSTRUCTIONS";

/// Per-run limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VmConfig {
    /// Faults the run once this many instructions have executed. `None` runs unbounded.
    pub instruction_limit: Option<u64>,
}

impl VmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instruction_limit(mut self, limit: u64) -> Self {
        self.instruction_limit = Some(limit);
        self
    }

    /// Read `NWSCRIPT_MAX_INSTRUCTIONS`; unset, empty, zero or malformed values mean no limit.
    pub fn from_env() -> Self {
        let instruction_limit = std::env::var(MAX_INSTRUCTIONS_ENV)
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|limit| *limit > 0);
        Self { instruction_limit }
    }
}
