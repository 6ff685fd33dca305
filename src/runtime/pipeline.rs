//! Resolved pipeline definitions
//!
//! The language front end hands the engine a list of blocks with evaluated
//! properties and the pipes connecting them by block name.

use crate::core::block::BlockDefinition;
use crate::core::result::SourceLocation;

/// Directed connection between two blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipe {
    pub from: String,
    pub to: String,
    pub location: SourceLocation,
}

impl Pipe {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            location: SourceLocation::default(),
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }
}

/// A named pipeline
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub name: String,
    pub blocks: Vec<BlockDefinition>,
    pub pipes: Vec<Pipe>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Pipeline whose blocks are piped one after another in the given order
    pub fn chain(name: impl Into<String>, blocks: Vec<BlockDefinition>) -> Self {
        let pipes = blocks
            .windows(2)
            .map(|pair| Pipe::new(pair[0].name.clone(), pair[1].name.clone()))
            .collect();
        Self {
            name: name.into(),
            blocks,
            pipes,
        }
    }

    pub fn with_block(mut self, block: BlockDefinition) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn with_pipe(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.pipes.push(Pipe::new(from, to));
        self
    }

    pub fn block(&self, name: &str) -> Option<&BlockDefinition> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// Names of the blocks piped into `name`
    pub fn predecessors(&self, name: &str) -> Vec<&str> {
        self.pipes
            .iter()
            .filter(|p| p.to == name)
            .map(|p| p.from.as_str())
            .collect()
    }

    /// Names of the blocks `name` pipes into
    pub fn successors(&self, name: &str) -> Vec<&str> {
        self.pipes
            .iter()
            .filter(|p| p.from == name)
            .map(|p| p.to.as_str())
            .collect()
    }
}
