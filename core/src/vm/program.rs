use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::bytecode::{Op, START_OFFSET};
use super::error::VmError;

/// An op placed at a byte offset of its program.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub offset: u32,
    pub next_offset: u32,
    pub op: Op,
}

impl Instruction {
    pub fn new(offset: u32, op: Op) -> Self {
        let next_offset = offset + op.encoded_size();
        Self { offset, next_offset, op }
    }
}

/// A compiled script: instructions ordered by offset plus the total byte length.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    name: String,
    instructions: Vec<Instruction>,
    length: u32,
}

impl Program {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            instructions: Vec::new(),
            length: START_OFFSET,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte length; execution halts once the offset reaches it.
    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Append an op right after the current end of the program.
    pub fn add(&mut self, op: Op) -> &mut Self {
        let ins = Instruction::new(self.length, op);
        self.length = ins.next_offset;
        self.instructions.push(ins);
        self
    }

    /// Append an already-placed instruction, as produced by a decoder.
    pub fn push(&mut self, ins: Instruction) -> Result<(), VmError> {
        let floor = self.instructions.last().map_or(0, |last| last.next_offset);
        if ins.offset < floor || ins.next_offset <= ins.offset {
            return Err(VmError::InvalidOffset(i64::from(ins.offset)));
        }
        self.length = self.length.max(ins.next_offset);
        self.instructions.push(ins);
        Ok(())
    }

    /// Instruction whose byte region `[offset, next_offset)` contains `offset`.
    pub fn instruction_at(&self, offset: u32) -> Result<&Instruction, VmError> {
        let idx = self.instructions.partition_point(|ins| ins.offset <= offset);
        match idx.checked_sub(1).map(|i| &self.instructions[i]) {
            Some(ins) if offset < ins.next_offset => Ok(ins),
            _ => Err(VmError::InvalidOffset(i64::from(offset))),
        }
    }

    pub fn to_file(&self) -> ProgramFile {
        ProgramFile {
            name: self.name.clone(),
            instructions: self.instructions.iter().map(|ins| ins.op.clone()).collect(),
        }
    }

    pub fn from_json(src: &str) -> Result<Self> {
        let file: ProgramFile = serde_json::from_str(src).context("Failed to parse program JSON")?;
        Ok(file.into())
    }

    pub fn from_yaml(src: &str) -> Result<Self> {
        let file: ProgramFile = serde_yaml::from_str(src).context("Failed to parse program YAML")?;
        Ok(file.into())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_file()).context("Failed to serialize program")
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.to_file()).context("Failed to serialize program")
    }
}

/// On-disk form of a program: ops in order, offsets derived on load.
///
/// Ops with operands are single-key maps (`ConstS: hi`) in both JSON and YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramFile {
    pub name: String,
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub instructions: Vec<Op>,
}

impl From<ProgramFile> for Program {
    fn from(file: ProgramFile) -> Self {
        let mut program = Program::new(file.name);
        for op in file.instructions {
            program.add(op);
        }
        program
    }
}
