//! Build commands and ordered command scripts.

use crate::block::BlockType;
use stratavox_geo::VoxelPoint;
use std::fmt;

/// One placement instruction, rendered to the target world's command grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildCommand {
    /// Fill the axis-aligned box `[min, max]` with a single block type.
    Fill {
        min: VoxelPoint,
        max: VoxelPoint,
        block: BlockType,
    },
    /// Place a single block.
    SetBlock { pos: VoxelPoint, block: BlockType },
    /// A literal command passed through unchanged.
    Raw(String),
}

impl BuildCommand {
    pub fn to_text(&self) -> String {
        match self {
            Self::Fill { min, max, block } => format!("fill {min} {max} {block}"),
            Self::SetBlock { pos, block } => format!("setblock {pos} {block}"),
            Self::Raw(text) => text.clone(),
        }
    }
}

impl fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// A command plus its execution policy within a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCommand {
    pub command: BuildCommand,
    /// Batch execution aborts when a critical command fails; non-critical
    /// failures are recorded and execution continues.
    pub critical: bool,
}

impl From<BuildCommand> for ScriptCommand {
    fn from(command: BuildCommand) -> Self {
        Self {
            command,
            critical: false,
        }
    }
}

/// An ordered command sequence. Order is significant: later commands may
/// legally overwrite cells placed by earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandScript {
    commands: Vec<ScriptCommand>,
}

impl CommandScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: BuildCommand) {
        self.commands.push(command.into());
    }

    pub fn push_critical(&mut self, command: BuildCommand) {
        self.commands.push(ScriptCommand {
            command,
            critical: true,
        });
    }

    pub fn commands(&self) -> &[ScriptCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Newline-delimited human-inspectable script text.
    pub fn to_text(&self) -> String {
        self.commands
            .iter()
            .map(|c| c.command.to_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> IntoIterator for &'a CommandScript {
    type Item = &'a ScriptCommand;
    type IntoIter = std::slice::Iter<'a, ScriptCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
